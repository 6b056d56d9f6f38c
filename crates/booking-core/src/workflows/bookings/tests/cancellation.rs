use chrono::Duration;

use super::common::*;
use crate::workflows::bookings::{
    AuditAction, BookingError, BroadcastReport, Canceller, JobStatus, JobStore, Missing, Role,
};

#[test]
fn customer_withdrawal_with_full_notice_is_early() {
    let harness = harness();
    let id = harness.assigned(48, ANNA);
    let (_, pushes_before) = harness.outbox_counts();

    let outcome = harness.service.cancel(id, CUSTOMER).expect("withdrawn");

    assert_eq!(outcome.cancelled_by, Canceller::Customer);
    assert_eq!(outcome.job.status, JobStatus::WithdrawBefore24);
    assert_eq!(outcome.job.withdrawn_at, Some(now()));
    assert!(outcome.rebroadcast.is_none());

    let pushes = harness.push.sent();
    assert_eq!(pushes.len(), pushes_before + 1);
    let push = pushes.last().expect("cancel push");
    assert_eq!(push.targets, vec!["anna@example.se".to_string()]);
    assert_eq!(push.payload["notification_type"], "job_cancelled");

    let entry = harness.audit.for_job(id).pop().expect("audit entry");
    assert_eq!(entry.action, AuditAction::CustomerCancelled);
}

#[test]
fn customer_withdrawal_at_exactly_the_window_is_still_early() {
    let harness = harness();
    let id = harness.book_hours_ahead(24);
    let job = harness.service.cancel(id, CUSTOMER).expect("withdrawn").job;
    assert_eq!(job.status, JobStatus::WithdrawBefore24);
}

#[test]
fn late_customer_withdrawal_is_marked_after_24() {
    let harness = harness();
    let id = harness.book_hours_ahead(10);
    let (_, pushes_before) = harness.outbox_counts();

    let job = harness.service.cancel(id, CUSTOMER).expect("withdrawn").job;

    assert_eq!(job.status, JobStatus::WithdrawAfter24);
    assert_eq!(harness.push.sent().len(), pushes_before, "no translator to tell");
}

#[test]
fn withdrawn_jobs_cannot_be_withdrawn_again() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    harness.service.cancel(id, CUSTOMER).expect("withdrawn");

    let error = harness
        .service
        .cancel(id, CUSTOMER)
        .expect_err("already withdrawn");
    assert!(matches!(
        error,
        BookingError::InvalidState {
            status: JobStatus::WithdrawBefore24,
            ..
        }
    ));
}

#[test]
fn translator_cannot_cancel_with_exactly_the_window_left() {
    let harness = harness();
    let id = harness.assigned(48, ANNA);
    harness.clock.advance(Duration::hours(24));

    let error = harness
        .service
        .cancel(id, ANNA)
        .expect_err("inside the window");

    match error {
        BookingError::TooLateToCancel { message } => {
            assert!(message.contains("+46 73 75 86 865"), "{message}");
        }
        other => panic!("expected TooLateToCancel, got {other:?}"),
    }
    assert_eq!(harness.job(id).status, JobStatus::Assigned);
    let assignments = harness.store.assignments(id).expect("assignments");
    assert_eq!(assignments.len(), 1);
    assert!(assignments[0].is_active());
}

#[test]
fn translator_cancellation_reopens_and_rebroadcasts_without_them() {
    let harness = harness();
    let id = harness.assigned(48, ANNA);
    harness
        .clock
        .advance(Duration::hours(24) - Duration::minutes(1));
    let cancelled_at = now() + Duration::hours(24) - Duration::minutes(1);

    let outcome = harness.service.cancel(id, ANNA).expect("cancelled in time");

    assert_eq!(outcome.cancelled_by, Canceller::Translator);
    assert_eq!(outcome.job.status, JobStatus::Pending);
    assert_eq!(outcome.job.created_at, cancelled_at);
    assert_eq!(outcome.job.expires_at, outcome.job.due);
    assert!(harness.store.assignments(id).expect("assignments").is_empty());
    assert_eq!(
        outcome.rebroadcast,
        Some(BroadcastReport {
            immediate: 1,
            delayed: 0
        })
    );

    let pushes = harness.push.sent();
    let customer_push = &pushes[pushes.len() - 2];
    assert_eq!(customer_push.targets, vec!["clara@example.se".to_string()]);
    assert_eq!(customer_push.payload["notification_type"], "job_cancelled");
    let offer = pushes.last().expect("rebroadcast");
    assert_eq!(offer.targets, vec!["boris@example.se".to_string()]);

    let entry = harness.audit.for_job(id).pop().expect("audit entry");
    assert_eq!(entry.action, AuditAction::TranslatorCancelled);
    assert_eq!(entry.actor, Some(ANNA));
}

#[test]
fn translator_needs_their_own_active_assignment() {
    let harness = harness();
    let id = harness.assigned(48, ANNA);

    let error = harness
        .service
        .cancel(id, BORIS)
        .expect_err("Boris holds nothing");
    assert!(matches!(
        error,
        BookingError::NotFound(Missing::ActiveAssignment(job_id)) if job_id == id
    ));
}

#[test]
fn admins_use_the_admin_update_to_cancel() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    let error = harness.service.cancel(id, ADMIN).expect_err("admin role");
    assert!(matches!(error, BookingError::Forbidden { role: Role::Admin }));
}

use chrono::Duration;

use super::common::*;
use crate::workflows::bookings::{
    AuditAction, BookingError, FieldChange, JobStatus, JobStore, MailTemplate, Role,
    SessionDuration,
};

#[test]
fn ending_a_session_records_duration_and_mails_both_sides() {
    let harness = harness();
    let id = harness.started();
    harness.clock.advance(Duration::minutes(75));
    let (mails_before, _) = harness.outbox_counts();

    let outcome = harness.service.end_job(id, CUSTOMER).expect("session ended");

    let session = SessionDuration {
        hours: 1,
        minutes: 15,
        seconds: 0,
    };
    assert!(outcome.changed);
    assert_eq!(outcome.session, Some(session));
    assert_eq!(outcome.job.status, JobStatus::Completed);
    assert_eq!(outcome.job.session_time, Some(session));
    assert_eq!(
        outcome.job.ended_at,
        Some(now() + Duration::hours(2) + Duration::minutes(75))
    );

    let assignment = harness
        .store
        .assignments(id)
        .expect("assignments")
        .pop()
        .expect("assignment");
    assert_eq!(assignment.completed_by, Some(CUSTOMER));
    assert!(assignment.completed_at.is_some());

    let mails: Vec<_> = harness.mailer.sent().into_iter().skip(mails_before).collect();
    assert_eq!(mails.len(), 2);
    assert!(mails
        .iter()
        .all(|mail| mail.template == MailTemplate::SessionEnded));
    assert_eq!(mails[0].address, "clara@example.se");
    assert_eq!(mails[0].data["for_text"], "invoice");
    assert_eq!(mails[0].data["session_time"], "1h 15min");
    assert_eq!(mails[1].address, "anna@example.se");
    assert_eq!(mails[1].data["for_text"], "salary");

    let entry = harness.audit.for_job(id).pop().expect("audit entry");
    assert_eq!(entry.action, AuditAction::Ended);
    assert!(entry
        .changes
        .contains(&FieldChange::note("counterpart notified: user 10")));
}

#[test]
fn ending_a_job_that_has_not_started_changes_nothing() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    let before = harness.job(id);

    let outcome = harness.service.end_job(id, CUSTOMER).expect("no-op");

    assert!(!outcome.changed);
    assert!(outcome.session.is_none());
    assert_eq!(harness.job(id), before);
}

#[test]
fn customer_not_call_closes_the_translator_assignment() {
    let harness = harness();
    let id = harness.started();
    harness.clock.advance(Duration::minutes(20));

    let job = harness
        .service
        .customer_not_call(id, ANNA)
        .expect("marked not carried out");

    assert_eq!(job.status, JobStatus::NotCarriedOutCustomer);
    assert_eq!(harness.job(id).status, JobStatus::NotCarriedOutCustomer);
    let assignment = harness
        .store
        .assignments(id)
        .expect("assignments")
        .pop()
        .expect("assignment");
    assert_eq!(assignment.completed_by, Some(ANNA));

    let entry = harness.audit.for_job(id).pop().expect("audit entry");
    assert_eq!(entry.action, AuditAction::CustomerNotCall);
}

#[test]
fn customer_not_call_requires_a_started_session() {
    let harness = harness();
    let id = harness.assigned(48, ANNA);
    let error = harness
        .service
        .customer_not_call(id, ANNA)
        .expect_err("not started yet");
    assert!(matches!(
        error,
        BookingError::InvalidState {
            status: JobStatus::Assigned,
            ..
        }
    ));
}

#[test]
fn reopening_a_timed_out_job_creates_a_copy() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    harness.admin_update(id, status_update(JobStatus::TimedOut, "nobody available"));

    let outcome = harness.service.reopen(id, ADMIN).expect("reopened");

    assert_ne!(outcome.job.id, id);
    assert_eq!(outcome.reopened_from, id);
    assert_eq!(outcome.job.status, JobStatus::Pending);
    assert_eq!(
        outcome.job.admin_comments,
        format!("This booking is a reopening of booking #{id}")
    );
    assert_eq!(harness.job(id).status, JobStatus::TimedOut);
    assert_eq!(harness.job(outcome.job.id), outcome.job);
    assert_eq!(outcome.broadcast.map(|report| report.total()), Some(2));

    let entry = harness
        .audit
        .for_job(outcome.job.id)
        .pop()
        .expect("audit on the copy");
    assert_eq!(entry.action, AuditAction::Reopened);
}

#[test]
fn reopening_a_completed_job_keeps_its_id() {
    let harness = harness();
    let id = harness.started();
    harness.clock.advance(Duration::minutes(30));
    harness.service.end_job(id, ANNA).expect("ended");

    let outcome = harness.service.reopen(id, ADMIN).expect("reopened");

    assert_eq!(outcome.job.id, id);
    assert_eq!(harness.job(id).status, JobStatus::Pending);
    let assignments = harness.store.assignments(id).expect("assignments");
    assert_eq!(assignments.len(), 1);
    assert!(assignments[0].cancelled_at.is_some());
}

#[test]
fn only_admins_reopen() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    harness.admin_update(id, status_update(JobStatus::TimedOut, "nobody available"));

    let error = harness
        .service
        .reopen(id, CUSTOMER)
        .expect_err("customers cannot reopen");
    assert!(matches!(
        error,
        BookingError::Forbidden {
            role: Role::Customer
        }
    ));
}

use super::common::*;
use crate::workflows::bookings::{
    AcceptError, Assignment, AuditAction, BookingError, Changeset, JobId, JobStatus, JobStore,
    MailTemplate, Missing, Role, UserId,
};

#[test]
fn accept_assigns_job_and_notifies_customer() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    let (mails_before, pushes_before) = harness.outbox_counts();

    let outcome = harness.service.accept(id, ANNA).expect("accepted");

    assert_eq!(outcome.job.status, JobStatus::Assigned);
    assert_eq!(outcome.assignment.translator_id, ANNA);
    assert!(outcome.assignment.is_active());
    assert!(outcome
        .message
        .starts_with("You have accepted the booking for Swedish interpreter 60min"));
    assert_eq!(harness.job(id).status, JobStatus::Assigned);

    let mails = harness.mailer.sent();
    assert_eq!(mails.len(), mails_before + 1);
    let accepted = mails.last().expect("accept mail");
    assert_eq!(accepted.template, MailTemplate::JobAccepted);
    assert_eq!(accepted.address, "clara@example.se");

    let pushes = harness.push.sent();
    assert_eq!(pushes.len(), pushes_before + 1);
    let push = pushes.last().expect("accept push");
    assert_eq!(push.targets, vec!["clara@example.se".to_string()]);
    assert_eq!(push.payload["notification_type"], "job_accepted");

    let last = harness.audit.for_job(id).pop().expect("audit entry");
    assert_eq!(last.action, AuditAction::Accepted);
    assert_eq!(last.actor, Some(ANNA));
}

#[test]
fn second_accept_loses_with_already_taken() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    harness.service.accept(id, ANNA).expect("first accept");

    let error = harness
        .service
        .accept(id, BORIS)
        .expect_err("job is already assigned");
    assert!(matches!(error, BookingError::AlreadyTaken { job_id } if job_id == id));

    let active: Vec<_> = harness
        .store
        .assignments(id)
        .expect("assignments")
        .into_iter()
        .filter(|assignment| assignment.is_active())
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].translator_id, ANNA);
}

#[test]
fn translator_cannot_hold_two_jobs_at_the_same_time() {
    let harness = harness();
    let first = harness.book_hours_ahead(48);
    let second = harness.book_hours_ahead(48);
    harness.service.accept(first, ANNA).expect("first accept");

    let error = harness
        .service
        .accept(second, ANNA)
        .expect_err("double booking");
    assert!(error.to_string().contains("You did not get this booking"));
    match error {
        BookingError::AlreadyBooked { due } => assert_eq!(due, harness.job(second).due),
        other => panic!("expected AlreadyBooked, got {other:?}"),
    }
    assert_eq!(harness.job(second).status, JobStatus::Pending);
}

#[test]
fn only_translators_accept() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);

    let error = harness
        .service
        .accept(id, CUSTOMER)
        .expect_err("customers cannot accept");
    assert!(matches!(
        error,
        BookingError::Forbidden {
            role: Role::Customer
        }
    ));

    let error = harness
        .service
        .accept(JobId(404), ANNA)
        .expect_err("unknown job");
    assert!(matches!(
        error,
        BookingError::NotFound(Missing::Job(JobId(404)))
    ));
}

#[test]
fn broadcast_skips_translators_already_booked_at_that_time() {
    let harness = harness();
    let first = harness.book_hours_ahead(48);
    harness.service.accept(first, ANNA).expect("accepted");

    harness.book_hours_ahead(48);
    let offer = harness.push.sent().pop().expect("offer push");
    assert_eq!(offer.payload["notification_type"], "suitable_job");
    assert_eq!(offer.targets, vec!["boris@example.se".to_string()]);
}

#[test]
fn potential_jobs_lists_open_jobs_the_translator_can_take() {
    let harness = harness();
    let taken = harness.book_hours_ahead(48);
    let clashing = harness.book_hours_ahead(48);
    let later = harness.book_hours_ahead(72);
    let mut arabic = scheduled_request(96);
    arabic.from_language_id = Some(ARABIC);
    let arabic = harness.book(arabic);
    harness.service.accept(taken, ANNA).expect("accepted");

    let ids = |translator: UserId| -> Vec<JobId> {
        harness
            .service
            .potential_jobs(translator)
            .expect("potential jobs")
            .into_iter()
            .map(|job| job.id)
            .collect()
    };

    assert_eq!(ids(ANNA), vec![later, arabic]);
    assert_eq!(ids(BORIS), vec![clashing, later]);
    assert!(ids(VERA).is_empty());
}

#[test]
fn store_refuses_pending_job_that_already_has_a_translator() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    let held = Assignment::new(
        harness.store.next_assignment_id().expect("id"),
        id,
        ANNA,
        now(),
    );
    harness
        .store
        .commit(Changeset::default().insert_assignment(held))
        .expect("assignment stored");
    assert_eq!(harness.job(id).status, JobStatus::Pending);

    let claim = Assignment::new(
        harness.store.next_assignment_id().expect("id"),
        id,
        BORIS,
        now(),
    );
    let error = harness.store.accept(claim).expect_err("job is served");
    assert!(matches!(error, AcceptError::AlreadyTaken { job_id } if job_id == id));

    let active: Vec<_> = harness
        .store
        .assignments(id)
        .expect("assignments")
        .into_iter()
        .filter(Assignment::is_active)
        .map(|assignment| assignment.translator_id)
        .collect();
    assert_eq!(active, vec![ANNA]);
}

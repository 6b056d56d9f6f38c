use super::common::*;
use crate::workflows::bookings::{
    AuditAction, BookingError, BroadcastReport, FieldChange, JobInformation, JobStatus, Role,
    SessionDuration,
};

#[test]
fn admin_records_flags_and_travel_details() {
    let harness = harness();
    let id = harness.assigned(48, ANNA);
    let (mails, pushes) = harness.outbox_counts();

    let job = harness
        .service
        .update_job_information(
            id,
            JobInformation {
                flagged: Some(true),
                manually_handled: Some(true),
                session_time: Some("1:30".to_string()),
                distance: Some(" 12 km ".to_string()),
                travel_time: Some("25 min".to_string()),
                admin_comment: Some("checked with the clinic".to_string()),
                ..JobInformation::default()
            },
            ADMIN,
        )
        .expect("information stored");

    assert!(job.flagged);
    assert!(job.manually_handled);
    assert!(!job.by_admin);
    assert_eq!(job.distance.as_deref(), Some("12 km"));
    assert_eq!(job.travel_time.as_deref(), Some("25 min"));
    assert_eq!(job.session_time, SessionDuration::parse("1:30"));
    assert_eq!(job.admin_comments, "checked with the clinic");
    assert_eq!(job.status, JobStatus::Assigned);
    assert_eq!(harness.job(id), job);
    assert_eq!(harness.outbox_counts(), (mails, pushes));

    let entry = harness.audit.for_job(id).pop().expect("information audit");
    assert_eq!(entry.action, AuditAction::InformationUpdated);
    assert_eq!(entry.actor, Some(ADMIN));
    assert!(entry
        .changes
        .contains(&FieldChange::note("distance set to 12 km")));
}

#[test]
fn blank_text_clears_distance() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    let set = JobInformation {
        distance: Some("8 km".to_string()),
        ..JobInformation::default()
    };
    harness
        .service
        .update_job_information(id, set, ADMIN)
        .expect("distance set");

    let cleared = JobInformation {
        distance: Some("  ".to_string()),
        ..JobInformation::default()
    };
    let job = harness
        .service
        .update_job_information(id, cleared, ADMIN)
        .expect("distance cleared");

    assert_eq!(job.distance, None);
}

#[test]
fn unchanged_information_writes_nothing() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    let audit_before = harness.audit.entries().len();

    let job = harness
        .service
        .update_job_information(
            id,
            JobInformation {
                flagged: Some(false),
                ..JobInformation::default()
            },
            ADMIN,
        )
        .expect("no-op accepted");

    assert!(!job.flagged);
    assert_eq!(harness.audit.entries().len(), audit_before);
}

#[test]
fn malformed_session_time_names_the_field() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);

    let error = harness
        .service
        .update_job_information(
            id,
            JobInformation {
                flagged: Some(true),
                session_time: Some("ninety minutes".to_string()),
                ..JobInformation::default()
            },
            ADMIN,
        )
        .expect_err("session time rejected");

    assert_eq!(error.field_name(), Some("session_time"));
    assert!(!harness.job(id).flagged);
}

#[test]
fn only_admins_update_information() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);

    let error = harness
        .service
        .update_job_information(id, JobInformation::default(), CUSTOMER)
        .expect_err("customer refused");

    assert!(matches!(
        error,
        BookingError::Forbidden {
            role: Role::Customer
        }
    ));
}

#[test]
fn resend_offers_pending_job_to_the_whole_pool() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    let pushes_before = harness.push.sent().len();

    let report = harness
        .service
        .resend_notifications(id)
        .expect("offers resent");

    assert_eq!(report.immediate + report.delayed, 2);
    assert!(harness.push.sent().len() > pushes_before);
}

#[test]
fn resend_skips_jobs_that_are_no_longer_open() {
    let harness = harness();
    let id = harness.assigned(48, ANNA);
    let pushes_before = harness.push.sent().len();

    let report = harness
        .service
        .resend_notifications(id)
        .expect("resend answered");

    assert_eq!(report, BroadcastReport::default());
    assert_eq!(harness.push.sent().len(), pushes_before);
}

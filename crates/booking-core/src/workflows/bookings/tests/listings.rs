use super::common::*;
use crate::workflows::bookings::{
    AdminUpdate, BookingError, BookingRequest, JobStatus, Role, UserType, HISTORY_PAGE_SIZE,
};

fn immediate_request() -> BookingRequest {
    BookingRequest {
        from_language_id: Some(SWEDISH),
        immediate: true,
        duration: Some("30".to_string()),
        ..BookingRequest::default()
    }
}

#[test]
fn customer_sees_upcoming_jobs_split_by_urgency() {
    let harness = harness();
    let later = harness.book_hours_ahead(72);
    let sooner = harness.book_hours_ahead(30);
    let urgent = harness.book(immediate_request());
    let done = harness.book_hours_ahead(50);
    harness.force_status(done, JobStatus::Completed);

    let listing = harness.service.user_jobs(CUSTOMER).expect("listing");

    assert_eq!(listing.user_type, UserType::Customer);
    let emergency: Vec<_> = listing.emergency_jobs.iter().map(|job| job.id).collect();
    let normal: Vec<_> = listing.normal_jobs.iter().map(|job| job.id).collect();
    assert_eq!(emergency, vec![urgent]);
    assert_eq!(normal, vec![sooner, later]);
}

#[test]
fn translator_lists_only_jobs_still_held() {
    let harness = harness();
    let kept = harness.assigned(48, ANNA);
    let handed_over = harness.assigned(72, ANNA);
    harness.admin_update(
        handed_over,
        AdminUpdate {
            translator: Some(BORIS),
            ..AdminUpdate::default()
        },
    );

    let anna = harness.service.user_jobs(ANNA).expect("anna's listing");
    let boris = harness.service.user_jobs(BORIS).expect("boris's listing");

    assert_eq!(anna.user_type, UserType::Translator);
    let anna_jobs: Vec<_> = anna.normal_jobs.iter().map(|job| job.id).collect();
    assert_eq!(anna_jobs, vec![kept]);
    let boris_jobs: Vec<_> = boris.normal_jobs.iter().map(|job| job.id).collect();
    assert_eq!(boris_jobs, vec![handed_over]);
}

#[test]
fn history_pages_newest_first() {
    let harness = harness();
    let total = HISTORY_PAGE_SIZE + 2;
    let mut finished = Vec::new();
    for offset in 0..total {
        let id = harness.book_hours_ahead(30 + offset as i64);
        harness.force_status(id, JobStatus::Completed);
        finished.push(id);
    }
    harness.book_hours_ahead(100);
    finished.reverse();

    let first = harness
        .service
        .user_jobs_history(CUSTOMER, 0)
        .expect("first page");
    assert_eq!(first.page, 1);
    assert_eq!(first.pages, 2);
    assert_eq!(first.total, total);
    assert_eq!(first.jobs.len(), HISTORY_PAGE_SIZE);
    assert_eq!(first.jobs[0].id, finished[0]);

    let second = harness
        .service
        .user_jobs_history(CUSTOMER, 2)
        .expect("second page");
    let ids: Vec<_> = second.jobs.iter().map(|job| job.id).collect();
    assert_eq!(ids, finished[HISTORY_PAGE_SIZE..].to_vec());
    assert!(second.jobs[0].due < first.jobs[HISTORY_PAGE_SIZE - 1].due);
}

#[test]
fn history_past_the_last_page_is_empty() {
    let harness = harness();
    let id = harness.book_hours_ahead(30);
    harness.force_status(id, JobStatus::WithdrawBefore24);

    let history = harness
        .service
        .user_jobs_history(CUSTOMER, 3)
        .expect("history");

    assert_eq!(history.total, 1);
    assert_eq!(history.pages, 1);
    assert!(history.jobs.is_empty());
}

#[test]
fn admins_have_no_job_listing() {
    let harness = harness();

    let error = harness
        .service
        .user_jobs(ADMIN)
        .expect_err("admin refused");

    assert!(matches!(error, BookingError::Forbidden { role: Role::Admin }));
}

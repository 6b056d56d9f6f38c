use crate::infra::{
    build_service, parse_datetime, Channels, Outboxes, DEMO_ADMIN, DEMO_CUSTOMER,
    DEMO_TRANSLATORS, SWEDISH,
};
use booking_core::error::AppError;
use booking_core::workflows::bookings::{
    AdminUpdate, BookingConfig, BookingDetails, BookingError, BookingRequest, Changeset,
    FixedClock, JobId, JobStatus, JobStore, MemoryJobStore,
};
use chrono::{Duration, Local, NaiveDateTime, Timelike};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Demo start time (YYYY-MM-DD HH:MM). Defaults to the current hour.
    #[arg(long, value_parser = parse_datetime)]
    pub(crate) start: Option<NaiveDateTime>,
    /// Hours between the booking request and the session.
    #[arg(long, default_value_t = 30)]
    pub(crate) hours_ahead: i64,
    /// Length of the interpretation in minutes.
    #[arg(long, default_value_t = 45)]
    pub(crate) session_minutes: i64,
    /// Skip the SMS round to matched translators.
    #[arg(long)]
    pub(crate) skip_sms: bool,
}

/// What the scripted run produced, for printing and tests.
#[derive(Debug)]
pub(crate) struct DemoSummary {
    pub(crate) job_id: JobId,
    pub(crate) final_status: JobStatus,
    pub(crate) session: String,
    pub(crate) mails: usize,
    pub(crate) pushes: usize,
    pub(crate) sms: usize,
    pub(crate) losing_accept: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    println!("Interpreter booking demo");
    let summary = script(args)?;

    println!("\nOutcome for booking #{}", summary.job_id);
    println!("- final status: {}", summary.final_status);
    println!("- session time: {}", summary.session);
    if let Some(message) = &summary.losing_accept {
        println!("- second translator was told: {message}");
    }
    println!(
        "- {} mails | {} push notifications | {} sms",
        summary.mails, summary.pushes, summary.sms
    );
    Ok(())
}

fn default_start() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_minute(0)
        .and_then(|time| time.with_second(0))
        .and_then(|time| time.with_nanosecond(0))
        .unwrap_or(now)
}

pub(crate) fn script(args: DemoArgs) -> Result<DemoSummary, AppError> {
    let DemoArgs {
        start,
        hours_ahead,
        session_minutes,
        skip_sms,
    } = args;

    let start = start.unwrap_or_else(default_start);
    let clock = Arc::new(FixedClock::new(start));
    let store = MemoryJobStore::default();
    let outboxes = Outboxes::default();
    let service = build_service(
        BookingConfig::default(),
        store.clone(),
        clock.clone(),
        Channels::from(&outboxes),
    );

    let due = start + Duration::hours(hours_ahead);
    let receipt = service.create(
        DEMO_CUSTOMER,
        BookingRequest {
            from_language_id: Some(SWEDISH),
            due_date: Some(due.format("%m/%d/%Y").to_string()),
            due_time: Some(due.format("%H:%M").to_string()),
            customer_phone_type: true,
            duration: Some(session_minutes.to_string()),
            job_for: vec!["certified".to_string()],
            ..BookingRequest::default()
        },
    )?;
    println!(
        "- booking #{} requested for {} ({} customer)",
        receipt.id, due, receipt.customer_type
    );

    let job = service.confirm_booking(
        receipt.id,
        BookingDetails {
            reference: Some("DEMO-1".to_string()),
            ..BookingDetails::default()
        },
    )?;
    let offered = outboxes
        .push
        .sent()
        .last()
        .map(|push| push.targets.len())
        .unwrap_or_default();
    println!("- confirmed, offered to {offered} translator(s)");

    if !skip_sms {
        let sent = service.notify_sms(job.id)?;
        println!("- sms sent to {sent} translator(s)");
    }

    let [winner, runner_up, _] = DEMO_TRANSLATORS;
    let accepted = service.accept(job.id, winner)?;
    println!("- translator {winner}: {}", accepted.message);
    let losing_accept = match service.accept(job.id, runner_up) {
        Ok(_) => None,
        Err(err) => Some(err.to_string()),
    };

    let update = service.update_by_admin(
        job.id,
        AdminUpdate {
            admin_comments: Some("Confirmed with the clinic by phone".to_string()),
            ..AdminUpdate::default()
        },
        DEMO_ADMIN,
    )?;
    println!("- admin note saved: {}", update.job.admin_comments);

    clock.advance(Duration::hours(hours_ahead));
    let mut started = service.job(job.id)?;
    started.status = JobStatus::Started;
    store
        .commit(Changeset::default().update_job(started))
        .map_err(BookingError::from)?;
    println!("- session started at {}", due);

    clock.advance(Duration::minutes(session_minutes));
    let ended = service.end_job(job.id, DEMO_CUSTOMER)?;
    let session = ended
        .session
        .map(|session| session.describe())
        .unwrap_or_else(|| "not recorded".to_string());

    Ok(DemoSummary {
        job_id: job.id,
        final_status: ended.job.status,
        session,
        mails: outboxes.mail.sent().len(),
        pushes: outboxes.push.sent().len(),
        sms: outboxes.sms.sent().len(),
        losing_accept,
    })
}

use serde_json::json;

use super::common::*;
use crate::workflows::bookings::notifications::render;
use crate::workflows::bookings::{
    BookingRequest, JobStatus, MemoryDirectory, MessageKey, PushSound, StaticLocale,
};

fn offers(harness: &Harness) -> Vec<crate::workflows::bookings::PushNotification> {
    harness
        .push
        .sent()
        .into_iter()
        .filter(|push| push.payload["notification_type"] == "suitable_job")
        .collect()
}

#[test]
fn night_owls_get_offers_the_next_morning() {
    let mut boris = boris();
    boris.account.notifications.defer_at_night = true;
    let harness = harness_with(
        MemoryDirectory::default()
            .with_requester(customer())
            .with_translator(anna())
            .with_translator(boris),
    );
    harness.clock.set(at(2026, 3, 2, 23, 0));

    harness.book_hours_ahead(48);

    let offers = offers(&harness);
    assert_eq!(offers.len(), 2);
    assert_eq!(offers[0].targets, vec!["anna@example.se".to_string()]);
    assert_eq!(offers[0].send_after, None);
    assert_eq!(offers[1].targets, vec!["boris@example.se".to_string()]);
    assert_eq!(offers[1].send_after, Some(at(2026, 3, 3, 7, 0)));
}

#[test]
fn immediate_offers_skip_translators_without_emergency_alerts() {
    let mut anna = anna();
    anna.account.notifications.emergency_alerts = false;
    let harness = harness_with(
        MemoryDirectory::default()
            .with_requester(customer())
            .with_translator(anna)
            .with_translator(boris()),
    );

    harness.book(BookingRequest {
        from_language_id: Some(SWEDISH),
        immediate: true,
        duration: Some("30".to_string()),
        ..BookingRequest::default()
    });

    let offers = offers(&harness);
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].targets, vec!["boris@example.se".to_string()]);
    assert_eq!(offers[0].sound, PushSound::EmergencyBooking);
    assert!(offers[0].message.starts_with("New emergency booking for Swedish"));
}

#[test]
fn offer_payload_describes_the_job() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);

    let offer = offers(&harness).pop().expect("offer push");
    assert_eq!(offer.sound, PushSound::NormalBooking);
    assert_eq!(offer.payload["job_id"], json!(id));
    assert_eq!(offer.payload["language"], "Swedish");
    assert_eq!(offer.payload["customer_type"], "municipality");
    assert_eq!(offer.payload["immediate"], "no");
    assert_eq!(offer.payload["customer_phone_type"], "yes");
    assert_eq!(offer.payload["status"], "pending");
    assert_eq!(
        offer.tag_filter(),
        json!([
            { "key": "email", "relation": "=", "value": "anna@example.se" },
            { "operator": "OR" },
            { "key": "email", "relation": "=", "value": "boris@example.se" },
        ])
    );
}

#[test]
fn users_who_disabled_push_only_get_mail() {
    let mut clara = customer();
    clara.account.notifications.push_enabled = false;
    let harness = harness_with(
        MemoryDirectory::default()
            .with_requester(clara)
            .with_translator(anna()),
    );
    let id = harness.book_hours_ahead(48);
    let (mails_before, pushes_before) = harness.outbox_counts();

    harness.service.accept(id, ANNA).expect("accepted");

    assert_eq!(harness.mailer.sent().len(), mails_before + 1);
    assert_eq!(harness.push.sent().len(), pushes_before);
}

#[test]
fn sms_goes_to_every_matching_translator() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);

    assert_eq!(harness.service.notify_sms(id).expect("sms sent"), 2);

    let sent = harness.sms.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].from, "+46701234567");
    assert_eq!(sent[0].to, "+467000010");
    assert!(sent[0].message.starts_with("New phone interpretation on 04.03.2026 at 10:00"));
    assert!(sent[0].message.ends_with(&format!("Booking #{id}")));
}

#[test]
fn on_site_sms_names_the_town() {
    let harness = harness();
    let mut request = scheduled_request(48);
    request.customer_phone_type = false;
    request.customer_physical_type = true;
    let id = harness.book(request);

    assert_eq!(harness.service.notify_sms(id).expect("sms sent"), 1);
    let sent = harness.sms.sent();
    assert!(sent[0].message.starts_with("New on-site interpretation in Stockholm"));
}

#[test]
fn channel_and_audit_outages_do_not_fail_transitions() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);
    harness.mailer.set_failing(true);
    harness.push.set_failing(true);
    harness.sms.set_failing(true);
    harness.audit.set_failing(true);

    let outcome = harness.service.accept(id, ANNA).expect("accepted anyway");
    assert_eq!(outcome.job.status, JobStatus::Assigned);
    assert_eq!(harness.job(id).status, JobStatus::Assigned);
    assert_eq!(harness.service.notify_sms(id).expect("best effort"), 0);
}

#[test]
fn expiry_notice_goes_to_the_customer() {
    let harness = harness();
    let id = harness.book_hours_ahead(48);

    assert!(harness.service.notify_expired(id).expect("notified"));

    let push = harness.push.sent().pop().expect("expiry push");
    assert_eq!(push.targets, vec!["clara@example.se".to_string()]);
    assert_eq!(push.payload, json!({ "notification_type": "job_expired", "job_id": id }));
}

#[test]
fn locale_templates_override_the_built_in_wording() {
    let locale = StaticLocale::default()
        .with_language(SWEDISH, "svenska")
        .with_template("push.suitable_job", "Ny bokning: {language}, {duration} min");
    let params = vec![
        ("language", "svenska".to_string()),
        ("duration", "60".to_string()),
    ];

    assert_eq!(
        render(&locale, MessageKey::SuitableJob, &params),
        "Ny bokning: svenska, 60 min"
    );
    assert_eq!(
        render(&locale, MessageKey::SmsPhoneJob, &[("job_id", "7".to_string())]),
        "New phone interpretation on {date} at {time}, {duration}. Booking #7"
    );
}

use super::super::repository::Locale;

/// Every user-facing text the booking workflow emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    SuitableJob,
    SuitableImmediateJob,
    JobAcceptedPush,
    AcceptConfirmation,
    AlreadyTaken,
    AlreadyBooked,
    CustomerCancelledPush,
    TranslatorCancelledPush,
    TooLateToCancel,
    JobExpiredPush,
    SessionReminderPhysical,
    SessionReminderPhone,
    SmsPhoneJob,
    SmsPhysicalJob,
    JobCreatedSubject,
    JobAcceptedSubject,
    SessionEndedSubject,
    TranslatorChangedSubject,
    BookingChangedSubject,
    ReopenedSubject,
    CancellationSubject,
}

impl MessageKey {
    pub const fn code(self) -> &'static str {
        match self {
            MessageKey::SuitableJob => "push.suitable_job",
            MessageKey::SuitableImmediateJob => "push.suitable_immediate_job",
            MessageKey::JobAcceptedPush => "push.job_accepted",
            MessageKey::AcceptConfirmation => "booking.accept_confirmation",
            MessageKey::AlreadyTaken => "booking.already_taken",
            MessageKey::AlreadyBooked => "booking.already_booked",
            MessageKey::CustomerCancelledPush => "push.customer_cancelled",
            MessageKey::TranslatorCancelledPush => "push.translator_cancelled",
            MessageKey::TooLateToCancel => "booking.too_late_to_cancel",
            MessageKey::JobExpiredPush => "push.job_expired",
            MessageKey::SessionReminderPhysical => "push.session_reminder_physical",
            MessageKey::SessionReminderPhone => "push.session_reminder_phone",
            MessageKey::SmsPhoneJob => "sms.phone_job",
            MessageKey::SmsPhysicalJob => "sms.physical_job",
            MessageKey::JobCreatedSubject => "mail.job_created",
            MessageKey::JobAcceptedSubject => "mail.job_accepted",
            MessageKey::SessionEndedSubject => "mail.session_ended",
            MessageKey::TranslatorChangedSubject => "mail.translator_changed",
            MessageKey::BookingChangedSubject => "mail.booking_changed",
            MessageKey::ReopenedSubject => "mail.reopened",
            MessageKey::CancellationSubject => "mail.cancellation",
        }
    }

    pub const fn default_template(self) -> &'static str {
        match self {
            MessageKey::SuitableJob => "New booking for {language} interpreter {duration}min {due}",
            MessageKey::SuitableImmediateJob => {
                "New emergency booking for {language} interpreter {duration}min"
            }
            MessageKey::JobAcceptedPush => {
                "Your booking for {language} interpreter, {duration}min, {due} has been accepted. \
                 Open the app to see the interpreter's details."
            }
            MessageKey::AcceptConfirmation => {
                "You have accepted the booking for {language} interpreter {duration}min {due}"
            }
            MessageKey::AlreadyTaken => {
                "This {language} booking {duration}min {due} has already been accepted by another \
                 interpreter. You did not get this booking"
            }
            MessageKey::AlreadyBooked => {
                "You already have a booking at {due}. You did not get this booking"
            }
            MessageKey::CustomerCancelledPush => {
                "The customer has cancelled the booking for {language} interpreter, {duration}min, \
                 {due}. Check your previous bookings for details."
            }
            MessageKey::TranslatorCancelledPush => {
                "Your {language} interpreter, {duration}min {due}, has cancelled the booking. \
                 We are now looking for a replacement."
            }
            MessageKey::TooLateToCancel => {
                "Bookings within 24 hours cannot be cancelled online. Call {support_phone} to \
                 cancel by phone."
            }
            MessageKey::JobExpiredPush => {
                "No interpreter accepted your booking ({language}, {duration}min, {due}). \
                 Please try booking again."
            }
            MessageKey::SessionReminderPhysical => {
                "Reminder: you have a {language} interpretation (on site in {town}) at {time} on \
                 {date} lasting {duration} min. Remember to leave feedback afterwards!"
            }
            MessageKey::SessionReminderPhone => {
                "Reminder: you have a {language} interpretation (phone) at {time} on {date} \
                 lasting {duration} min. Remember to leave feedback afterwards!"
            }
            MessageKey::SmsPhoneJob => {
                "New phone interpretation on {date} at {time}, {duration}. Booking #{job_id}"
            }
            MessageKey::SmsPhysicalJob => {
                "New on-site interpretation in {town} on {date} at {time}, {duration}. \
                 Booking #{job_id}"
            }
            MessageKey::JobCreatedSubject => {
                "We have received your interpreter booking. Booking #{job_id}"
            }
            MessageKey::JobAcceptedSubject => {
                "Confirmation - an interpreter has accepted your booking (booking #{job_id})"
            }
            MessageKey::SessionEndedSubject => {
                "Information about the completed interpretation for booking #{job_id}"
            }
            MessageKey::TranslatorChangedSubject => {
                "Notice of interpreter assignment for booking #{job_id}"
            }
            MessageKey::BookingChangedSubject => "Notice of change to booking #{job_id}",
            MessageKey::ReopenedSubject => {
                "We have reopened your booking of a {language} interpreter (booking #{job_id})"
            }
            MessageKey::CancellationSubject => "Cancellation of booking #{job_id}",
        }
    }
}

/// Resolve a message through the locale, falling back to the built-in wording.
pub fn render(locale: &dyn Locale, key: MessageKey, params: &[(&str, String)]) -> String {
    let template = locale
        .template(key.code())
        .unwrap_or_else(|| key.default_template().to_string());
    interpolate(&template, params)
}

pub(crate) fn interpolate(template: &str, params: &[(&str, String)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
}

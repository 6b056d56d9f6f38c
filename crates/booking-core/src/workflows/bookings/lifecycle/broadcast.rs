use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::super::domain::{
    Job, JobId, JobStatus, NotificationTarget, RequesterProfile, UserAccount, UserId,
};
use super::super::matching::{assignment_check, eligibility, find_candidates};
use super::super::notifications::BroadcastReport;
use super::super::repository::{Directory, JobStore};
use super::error::BookingError;
use super::BookingService;

impl<S, D> BookingService<S, D>
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    /// Push a pending job to every translator who may take it.
    pub fn notify_translators(
        &self,
        job: &Job,
        exclude: Option<UserId>,
    ) -> Result<BroadcastReport, BookingError> {
        if job.status != JobStatus::Pending {
            debug!(job_id = %job.id, status = job.status.label(), "only pending jobs are offered");
            return Ok(BroadcastReport::default());
        }

        let requester = self.requester(job.requester_id)?;
        let audience = self.audience(job, &requester, exclude)?;
        debug!(job_id = %job.id, audience = audience.len(), "offer audience computed");

        Ok(self
            .notifier
            .broadcast(job, &requester.customer_type, &audience, self.now()))
    }

    /// Offer the job to the whole pool again, nobody excluded.
    pub fn resend_notifications(&self, job_id: JobId) -> Result<BroadcastReport, BookingError> {
        let job = self.load_job(job_id)?;
        let report = self.notify_translators(&job, None)?;
        info!(
            %job_id,
            immediate = report.immediate,
            delayed = report.delayed,
            "job offers resent"
        );
        Ok(report)
    }

    /// Text the job to matching translators. Returns the number of messages sent.
    pub fn notify_sms(&self, job_id: JobId) -> Result<usize, BookingError> {
        let job = self.load_job(job_id)?;
        let requester = self.requester(job.requester_id)?;
        let pool = self.directory.translators()?;
        let translators: Vec<_> = find_candidates(&job, &requester, &pool)
            .into_iter()
            .filter(|translator| translator.account.active)
            .collect();
        let town = job.town.as_deref().or(requester.city.as_deref());

        Ok(self.notifier.sms_offers(&job, town, &translators))
    }

    /// Tell the customer nobody accepted their booking in time.
    pub fn notify_expired(&self, job_id: JobId) -> Result<bool, BookingError> {
        let job = self.load_job(job_id)?;
        let customer = self.user(job.requester_id)?;
        Ok(self.notifier.expired(&job, &customer, self.now()))
    }

    /// Pending jobs the translator is eligible for and free to take.
    pub fn potential_jobs(&self, translator_id: UserId) -> Result<Vec<Job>, BookingError> {
        let translator = self.translator(translator_id)?;
        let booked = self.store.active_bookings(translator_id)?;
        let mut requesters: HashMap<UserId, RequesterProfile> = HashMap::new();
        let mut jobs = Vec::new();

        for job in self.store.jobs_with_status(JobStatus::Pending)? {
            if !requesters.contains_key(&job.requester_id) {
                let requester = self.requester(job.requester_id)?;
                requesters.insert(job.requester_id, requester);
            }
            let Some(requester) = requesters.get(&job.requester_id) else {
                continue;
            };
            if eligibility(&job, requester, &translator).is_ok()
                && assignment_check(&job, translator_id, &booked).permits_offer()
            {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    fn audience(
        &self,
        job: &Job,
        requester: &RequesterProfile,
        exclude: Option<UserId>,
    ) -> Result<Vec<NotificationTarget>, BookingError> {
        let pool = self.directory.translators()?;
        let now = self.now();
        let mut targets = Vec::new();

        for translator in find_candidates(job, requester, &pool) {
            let account = &translator.account;
            if !account.active || exclude == Some(account.id) || !account.notifications.push_enabled
            {
                continue;
            }
            if job.immediate && !account.notifications.emergency_alerts {
                continue;
            }
            let booked = self.store.active_bookings(account.id)?;
            if !assignment_check(job, account.id, &booked).permits_offer() {
                continue;
            }
            let delay = self.notifier.should_delay(account, now);
            targets.push(NotificationTarget { translator, delay });
        }
        Ok(targets)
    }

    /// Broadcast after a committed change. Failures are logged only.
    pub(super) fn rebroadcast(
        &self,
        job: &Job,
        exclude: Option<UserId>,
    ) -> Option<BroadcastReport> {
        match self.notify_translators(job, exclude) {
            Ok(report) => Some(report),
            Err(error) => {
                warn!(job_id = %job.id, %error, "rebroadcast failed");
                None
            }
        }
    }

    /// Account lookup for notifications after a commit, where a miss must not fail the call.
    pub(super) fn post_commit_user(&self, id: UserId) -> Option<UserAccount> {
        match self.directory.user(id) {
            Ok(Some(account)) => Some(account),
            Ok(None) => {
                warn!(user_id = %id, "notification recipient not found");
                None
            }
            Err(error) => {
                warn!(user_id = %id, %error, "notification recipient lookup failed");
                None
            }
        }
    }
}

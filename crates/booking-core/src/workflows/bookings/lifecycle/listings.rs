//! Per-user job lists: what is coming up, and what is done.

use std::collections::BTreeMap;

use serde::Serialize;

use super::super::domain::{Job, JobStatus, Role, UserId};
use super::super::repository::{Directory, JobStore};
use super::error::BookingError;
use super::BookingService;

pub const HISTORY_PAGE_SIZE: usize = 15;

const UPCOMING: [JobStatus; 3] = [JobStatus::Pending, JobStatus::Assigned, JobStatus::Started];
const FINISHED: [JobStatus; 4] = [
    JobStatus::Completed,
    JobStatus::WithdrawBefore24,
    JobStatus::WithdrawAfter24,
    JobStatus::TimedOut,
];

/// Which side of the booking the listed user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Customer,
    Translator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserJobs {
    pub user_type: UserType,
    pub emergency_jobs: Vec<Job>,
    pub normal_jobs: Vec<Job>,
}

/// One page of finished jobs, newest due first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobHistory {
    pub user_type: UserType,
    pub jobs: Vec<Job>,
    pub page: usize,
    pub pages: usize,
    pub total: usize,
}

impl<S, D> BookingService<S, D>
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    /// Upcoming jobs, immediate ones apart from scheduled ones, each group by due.
    pub fn user_jobs(&self, user_id: UserId) -> Result<UserJobs, BookingError> {
        let (user_type, mut jobs) = self.jobs_of(user_id)?;
        jobs.retain(|job| UPCOMING.contains(&job.status));
        jobs.sort_by_key(|job| job.due);
        let (emergency_jobs, normal_jobs): (Vec<Job>, Vec<Job>) =
            jobs.into_iter().partition(|job| job.immediate);

        Ok(UserJobs {
            user_type,
            emergency_jobs,
            normal_jobs,
        })
    }

    /// Finished jobs, [`HISTORY_PAGE_SIZE`] per page. Pages count from 1.
    pub fn user_jobs_history(
        &self,
        user_id: UserId,
        page: usize,
    ) -> Result<JobHistory, BookingError> {
        let (user_type, mut jobs) = self.jobs_of(user_id)?;
        jobs.retain(|job| FINISHED.contains(&job.status));
        jobs.sort_by(|left, right| right.due.cmp(&left.due));

        let total = jobs.len();
        let page = page.max(1);
        let jobs = jobs
            .into_iter()
            .skip((page - 1) * HISTORY_PAGE_SIZE)
            .take(HISTORY_PAGE_SIZE)
            .collect();

        Ok(JobHistory {
            user_type,
            jobs,
            page,
            pages: total.div_ceil(HISTORY_PAGE_SIZE),
            total,
        })
    }

    /// Customers see what they booked. Translators see jobs they hold or held, not the ones
    /// they cancelled or were replaced on.
    fn jobs_of(&self, user_id: UserId) -> Result<(UserType, Vec<Job>), BookingError> {
        let account = self.user(user_id)?;
        match account.role {
            Role::Customer => Ok((UserType::Customer, self.store.jobs_for_requester(user_id)?)),
            Role::Translator => {
                let mut jobs = BTreeMap::new();
                for assignment in self.store.translator_assignments(user_id)? {
                    if assignment.cancelled_at.is_some() || jobs.contains_key(&assignment.job_id) {
                        continue;
                    }
                    if let Some(job) = self.store.job(assignment.job_id)? {
                        jobs.insert(job.id, job);
                    }
                }
                Ok((UserType::Translator, jobs.into_values().collect()))
            }
            role => Err(BookingError::Forbidden { role }),
        }
    }
}

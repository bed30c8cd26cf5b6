// Poll loop for asynchronous upstream jobs

use super::{
    error::PollError,
    models::{JobStatus, PollResponse},
    profile::PollBudget,
};
use std::future::Future;
use tracing::{debug, warn};

/// Source of job-status payloads for a polling url.
pub trait StatusFetcher {
    fn fetch_status(
        &self,
        job_url: &str,
    ) -> impl Future<Output = Result<PollResponse, PollError>> + Send;
}

/// Polls `job_url` until the job is ready and returns the generated image url.
///
/// `Pending` sleeps for `budget.delay` before the next check. Any status other
/// than `Pending` or `Ready` ends the loop at once, as does a failed fetch.
pub async fn poll_until_ready<F>(
    fetcher: &F,
    job_url: &str,
    budget: PollBudget,
) -> Result<String, PollError>
where
    F: StatusFetcher + Sync,
{
    let mut attempts = 0;

    while attempts < budget.max_attempts {
        let poll = fetcher.fetch_status(job_url).await?;
        attempts += 1;

        match &poll.status {
            JobStatus::Ready => {
                debug!("Job ready after {} status check(s)", attempts);
                return poll
                    .image_url()
                    .map(str::to_string)
                    .ok_or(PollError::MissingResult);
            }
            JobStatus::Pending => {
                debug!(
                    "Job pending ({}/{}), next check in {:?}",
                    attempts, budget.max_attempts, budget.delay
                );
                if attempts < budget.max_attempts {
                    tokio::time::sleep(budget.delay).await;
                }
            }
            JobStatus::Other(status) => {
                warn!("Job ended with status '{}' after {} check(s)", status, attempts);
                return Err(PollError::UnexpectedStatus(status.clone()));
            }
        }
    }

    warn!("Job still pending after {} status check(s)", attempts);
    Err(PollError::Timeout { attempts })
}

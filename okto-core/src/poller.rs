//! Bounded polling for asynchronous jobs.
//!
//! Many operations are accepted synchronously and executed later by the
//! backend. The service offers no push channel, so the client turns
//! "submitted" into "settled" by re-reading a status endpoint until the job
//! reaches a terminal status or the poll budget runs out.
//!
//! # State Machine
//!
//! ```text
//! Polling { attempt } --terminal record--> Resolved(record)
//!        |  ^
//!        |  +--non-terminal, attempt < max_attempts, sleep(interval)
//!        +--non-terminal, attempt == max_attempts--> Exhausted (JobTimeout)
//!        +--fatal error--> error returned as-is
//! ```
//!
//! A job that settles as `failed` is a valid outcome and is returned like a
//! successful one; callers inspect [`JobRecord::job_status`].
//!
//! # Example
//!
//! ```rust,ignore
//! use okto_core::poller::{JobPoller, PollConfig};
//!
//! let poller = JobPoller::new(PollConfig::default());
//! let order = poller
//!     .poll(&order_id, |id| async move { client.find_order(&id).await })
//!     .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::error::OktoError;

/// Default pause between two poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;

/// Status of a backend job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Success,
    Failed,
    /// Any status string the client does not know. Treated as non-terminal.
    Other(String),
}

impl JobStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "success" => Self::Success,
            "failed" => Self::Failed,
            "pending" => Self::Pending,
            other => Self::Other(other.to_string()),
        }
    }

    /// `success` and `failed` end a job; everything else may still change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl From<&str> for JobStatus {
    fn from(status: &str) -> Self {
        Self::parse(status)
    }
}

/// A record describing the state of one backend job.
pub trait JobRecord {
    /// Order identifier the record belongs to.
    fn order_id(&self) -> &str;

    fn job_status(&self) -> JobStatus;
}

/// How the poller treats an error raised by the fetch function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Every error counts as a non-terminal attempt.
    #[default]
    RetryAll,

    /// Undecodable responses and 401/403 stop the poll immediately; other
    /// errors are retried.
    AbortOnMalformed,
}

impl RetryPolicy {
    /// Decide whether an error raised during polling ends the poll.
    pub fn classify<T>(&self, error: OktoError) -> PollStep<T> {
        let fatal = match self {
            Self::RetryAll => false,
            Self::AbortOnMalformed => match &error {
                OktoError::Decode { .. } => true,
                OktoError::HttpError { status, .. } => *status == 401 || *status == 403,
                _ => false,
            },
        };

        if fatal {
            PollStep::Fatal(error)
        } else {
            tracing::warn!("Ignoring error while polling: {}", error);
            PollStep::NonTerminal(error.to_string())
        }
    }
}

/// Outcome of a single poll attempt.
#[derive(Debug)]
pub enum PollStep<T> {
    /// The job settled; stop and return the record.
    Resolved(T),

    /// Not settled yet (or a tolerated error); try again.
    NonTerminal(String),

    /// Stop immediately and surface the error.
    Fatal(OktoError),
}

impl<T: JobRecord> PollStep<T> {
    /// Classify the result of a fetch-and-match call.
    pub fn from_fetch(result: Result<Option<T>, OktoError>, policy: RetryPolicy) -> Self {
        match result {
            Ok(Some(record)) => {
                let status = record.job_status();
                if status.is_terminal() {
                    Self::Resolved(record)
                } else {
                    Self::NonTerminal(format!("job status is {:?}", status))
                }
            }
            Ok(None) => Self::NonTerminal("no matching job record yet".to_string()),
            Err(e) => policy.classify(e),
        }
    }
}

/// Where a single poll invocation currently stands.
#[derive(Debug)]
pub enum PollState<T> {
    Polling { attempt: u32 },
    Resolved(T),
    Exhausted { attempts: u32 },
}

/// Budget and error policy for one poll invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between attempts. There is no pause after the final attempt.
    pub interval: Duration,

    /// Attempts before giving up with [`OktoError::JobTimeout`]. At least one
    /// attempt is always made.
    pub max_attempts: u32,

    pub retry_policy: RetryPolicy,
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Upper bound on the time spent sleeping between attempts.
    pub fn budget(&self) -> Duration {
        self.interval
            .saturating_mul(self.max_attempts.max(1).saturating_sub(1))
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_ATTEMPTS)
    }
}

/// Drives poll loops. Holds only configuration, so one poller can serve any
/// number of concurrent polls.
#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    config: PollConfig,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll with a fetch-and-match function until its record is terminal.
    ///
    /// `fetch` receives the job id and returns the matching record, `None`
    /// when no record matches yet, or an error which is classified by the
    /// configured [`RetryPolicy`].
    pub async fn poll<T, F, Fut>(&self, job_id: &str, mut fetch: F) -> Result<T, OktoError>
    where
        T: JobRecord,
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Option<T>, OktoError>>,
    {
        let policy = self.config.retry_policy;
        self.poll_steps(job_id, move |id| {
            let fut = fetch(id);
            async move { PollStep::from_fetch(fut.await, policy) }
        })
        .await
    }

    /// Poll with a function that classifies each attempt itself.
    pub async fn poll_steps<T, F, Fut>(&self, job_id: &str, mut step: F) -> Result<T, OktoError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = PollStep<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut state = PollState::Polling { attempt: 0 };

        loop {
            state = match state {
                PollState::Polling { attempt } => match step(job_id.to_string()).await {
                    PollStep::Resolved(record) => PollState::Resolved(record),
                    PollStep::Fatal(e) => {
                        tracing::error!("Polling job {} aborted: {}", job_id, e);
                        return Err(e);
                    }
                    PollStep::NonTerminal(reason) => {
                        let attempt = attempt + 1;
                        tracing::debug!(
                            "Job {} not settled (attempt {}/{}): {}",
                            job_id,
                            attempt,
                            max_attempts,
                            reason
                        );

                        if attempt >= max_attempts {
                            PollState::Exhausted { attempts: attempt }
                        } else {
                            sleep(self.config.interval).await;
                            PollState::Polling { attempt }
                        }
                    }
                },
                PollState::Resolved(record) => {
                    tracing::debug!("Job {} settled", job_id);
                    return Ok(record);
                }
                PollState::Exhausted { attempts } => {
                    tracing::warn!("Job {} did not settle after {} attempts", job_id, attempts);
                    return Err(OktoError::JobTimeout {
                        job_id: job_id.to_string(),
                        attempts,
                    });
                }
            };
        }
    }
}

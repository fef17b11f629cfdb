//! The poll-detect-notify loop.
//!
//! Each cycle runs fetch, validate, extract, detect and notify in order and
//! then advances the cursor. Any error short-circuits the cycle and goes
//! through [`Poller::tick`], which logs it and announces each distinct error
//! text to the chat once per process lifetime. The loop sleeps for the same
//! fixed interval after every cycle.
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::api::HomeworkApi;
use crate::detector::ChangeDetector;
use crate::error::CycleError;
use crate::homework::{self, Identity, ReviewStatus};
use crate::notifier::Notifier;

/// Pause between two cycles, after success and failure alike.
pub const RETRY_PERIOD: Duration = Duration::from_secs(600);

/// Error texts already announced to the chat. Never pruned.
#[derive(Debug, Default)]
pub struct ErrorMemory {
    seen: HashSet<String>,
}

impl ErrorMemory {
    /// Returns true if `message` was not seen before.
    pub fn remember(&mut self, message: &str) -> bool {
        if self.seen.contains(message) {
            return false;
        }
        self.seen.insert(message.to_string())
    }

    pub fn contains(&self, message: &str) -> bool {
        self.seen.contains(message)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The API returned an empty `homeworks` list.
    NoSubmission,
    Unchanged(ReviewStatus),
    Notified(Identity),
}

pub fn error_announcement(err: &CycleError) -> String {
    format!("Сбой в работе программы: {}", err)
}

pub struct Poller<A, N> {
    api: A,
    notifier: N,
    cursor: i64,
    detector: ChangeDetector,
    errors: ErrorMemory,
    interval: Duration,
}

impl<A: HomeworkApi, N: Notifier> Poller<A, N> {
    /// `cursor` is the `from_date` of the first request, normally "now".
    pub fn new(api: A, notifier: N, cursor: i64, detector: ChangeDetector) -> Self {
        Self {
            api,
            notifier,
            cursor,
            detector,
            errors: ErrorMemory::default(),
            interval: RETRY_PERIOD,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn errors(&self) -> &ErrorMemory {
        &self.errors
    }

    /// One cycle without error handling. The cursor only moves when every
    /// step succeeded.
    #[instrument(skip_all, fields(from_date = self.cursor))]
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let payload = self.api.fetch(self.cursor).await?;
        let checked = homework::check_response(payload)?;

        let outcome = match checked.submission {
            None => {
                debug!("no new submissions");
                CycleOutcome::NoSubmission
            }
            Some(record) => {
                let (identity, message) = homework::parse_status(&record)?;
                if self.detector.observe(&identity) {
                    self.notifier.notify(&message).await?;
                    CycleOutcome::Notified(identity)
                } else {
                    CycleOutcome::Unchanged(identity.status)
                }
            }
        };

        match checked.current_date {
            Some(next) => {
                debug!(previous = self.cursor, next, "advancing cursor");
                self.cursor = next;
            }
            None => debug!(cursor = self.cursor, "no current_date in response; cursor kept"),
        }
        Ok(outcome)
    }

    /// One cycle with the error path applied. Errors are logged and
    /// announced here, so `None` only tells the caller the cycle failed.
    pub async fn tick(&mut self) -> Option<CycleOutcome> {
        match self.run_cycle().await {
            Ok(outcome) => {
                info!(?outcome, cursor = self.cursor, "cycle finished");
                Some(outcome)
            }
            Err(err) => {
                self.report(&err).await;
                None
            }
        }
    }

    async fn report(&mut self, err: &CycleError) {
        let text = err.to_string();
        error!(kind = err.kind(), error = %text, "an error in the cycle");
        if !self.errors.remember(&text) {
            debug!(error = %text, "error already announced");
            return;
        }
        if let Err(delivery) = self.notifier.notify(&error_announcement(err)).await {
            warn!(error = %delivery, "failed to announce error to chat");
        }
    }

    /// Runs until the process is terminated.
    pub async fn run(mut self) {
        info!(interval = ?self.interval, cursor = self.cursor, "polling started");
        loop {
            self.tick().await;
            debug!(interval = ?self.interval, "sleeping");
            tokio::time::sleep(self.interval).await;
        }
    }
}

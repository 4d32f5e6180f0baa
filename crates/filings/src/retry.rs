//! Bounded fetch and verify loop per entity.
//!
//! ```text
//! Pending -> Fetching -> Verifying -> Complete
//!                ^            |
//!                |            v
//!                +------ Retrying        (attempts_made < max_attempts)
//!                             |
//!                             v
//!                         Exhausted      (attempts_made == max_attempts)
//! ```
//!
//! An entity whose symbol-keyed tree already verifies, typically left by an
//! earlier run, goes straight to `Complete` with no fetch.

use std::time::Duration;

use filings_core::{DocumentType, Entity};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::fetcher::{DocumentFetcher, FetchReport};
use crate::verifier::{CompletenessVerifier, Verification};

/// Phase of an entity in the retry state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetryPhase {
    /// Not started.
    Pending,
    /// Requesting the requirement menu from the archive.
    Fetching,
    /// Inspecting the staged tree.
    Verifying,
    /// Waiting out the backoff before the next fetch.
    Retrying,
    /// Every requirement is satisfied.
    Complete,
    /// Still incomplete after the last allowed attempt.
    Exhausted,
}

/// Retry bookkeeping for one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryState {
    /// Fetch attempts made so far, the first fetch included.
    pub attempts_made: u32,
    /// Upper bound on fetch attempts.
    pub max_attempts: u32,
    /// Document type of the last verification failure, if known.
    pub last_failure: Option<DocumentType>,
    /// Current phase.
    pub phase: RetryPhase,
}

impl RetryState {
    /// Create a pending state. At least one attempt is always allowed.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts_made: 0,
            max_attempts: max_attempts.max(1),
            last_failure: None,
            phase: RetryPhase::Pending,
        }
    }

    /// Returns true if another fetch attempt is allowed.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        self.attempts_made < self.max_attempts
    }

    /// Returns true once the entity reached a final phase.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, RetryPhase::Complete | RetryPhase::Exhausted)
    }

    fn begin_fetch(&mut self) {
        self.attempts_made += 1;
        self.phase = RetryPhase::Fetching;
    }

    fn record(&mut self, verification: &Verification) {
        if verification.is_complete() {
            self.phase = RetryPhase::Complete;
            return;
        }
        self.last_failure = verification.violation().map(|v| v.doc_type);
        self.phase = if self.can_retry() {
            RetryPhase::Retrying
        } else {
            RetryPhase::Exhausted
        };
    }
}

/// Final outcome of the retry loop for one entity.
#[derive(Debug)]
pub struct EntityOutcome {
    /// The entity processed.
    pub entity: Entity,
    /// Final retry state, either complete or exhausted.
    pub state: RetryState,
    /// One fetch report per attempt, in order.
    pub fetch_reports: Vec<FetchReport>,
    /// Result of the last verification pass.
    pub verification: Verification,
}

impl EntityOutcome {
    /// Returns true if the entity reached completeness.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.phase == RetryPhase::Complete
    }
}

/// Drives the fetch and verify cycle for one entity at a time.
#[derive(Debug, Clone)]
pub struct RetryController {
    fetcher: DocumentFetcher,
    verifier: CompletenessVerifier,
    max_attempts: u32,
    backoff: Duration,
}

impl RetryController {
    /// Create a controller with the default attempt bound and backoff.
    #[must_use]
    pub fn new(fetcher: DocumentFetcher, verifier: CompletenessVerifier) -> Self {
        Self {
            fetcher,
            verifier,
            max_attempts: crate::config::MAX_ATTEMPTS,
            backoff: crate::config::RETRY_BACKOFF,
        }
    }

    /// Set the maximum number of fetch attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the wait before each re-fetch.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fetch and verify `entity` until it is complete or out of attempts.
    pub async fn run(&self, entity: &Entity) -> EntityOutcome {
        let requirements = self.verifier.requirements();
        let entity_dir = self.fetcher.entity_dir(entity);
        let mut state = RetryState::new(self.max_attempts);
        let mut fetch_reports = Vec::new();

        // A symbol-keyed tree from an earlier run needs no fetching
        let normalized_dir = self.fetcher.staging_root().join(entity.symbol.as_str());
        let existing = self.verifier.verify(&normalized_dir);
        if existing.is_complete() {
            info!(entity = %entity, "Filings already complete, skipping fetch");
            state.phase = RetryPhase::Complete;
            return EntityOutcome {
                entity: entity.clone(),
                state,
                fetch_reports,
                verification: existing,
            };
        }

        loop {
            state.begin_fetch();
            debug!(entity = %entity, attempt = state.attempts_made, "Fetching");
            fetch_reports.push(self.fetcher.fetch(entity, requirements).await);

            state.phase = RetryPhase::Verifying;
            let verification = self.verifier.verify(&entity_dir);
            state.record(&verification);

            match state.phase {
                RetryPhase::Complete => {
                    info!(
                        entity = %entity,
                        attempts = state.attempts_made,
                        "Filings complete"
                    );
                }
                RetryPhase::Retrying => {
                    warn!(
                        entity = %entity,
                        attempt = state.attempts_made,
                        max_attempts = state.max_attempts,
                        reason = %verification,
                        "Filings incomplete, retrying"
                    );
                    if !self.backoff.is_zero() {
                        sleep(self.backoff).await;
                    }
                    continue;
                }
                _ => {
                    error!(
                        entity = %entity,
                        attempts = state.attempts_made,
                        reason = %verification,
                        "Filings still incomplete, giving up"
                    );
                }
            }

            return EntityOutcome {
                entity: entity.clone(),
                state,
                fetch_reports,
                verification,
            };
        }
    }
}

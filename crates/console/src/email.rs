//! Last-request-wins email availability checks for the admission form.
//!
//! Every keystroke may start a lookup; only the outcome of the most recent one
//! is allowed to update the status.

use serde::{Deserialize, Serialize};

/// Monotonically increasing lookup identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupId(u64);

impl core::fmt::Display for LookupId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "lookup-{}", self.0)
    }
}

/// A deferred lookup, to be handed to [`crate::Console::check_email`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub id: LookupId,
    pub email: String,
}

/// Result of running a [`LookupRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    pub id: LookupId,
    pub email: String,
    pub taken: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmailStatus {
    /// Nothing checked yet (or the check was cancelled).
    #[default]
    Idle,
    Checking(LookupId),
    Available,
    Taken,
}

/// Tracks the newest lookup and discards stale outcomes.
#[derive(Debug, Clone, Default)]
pub struct EmailAvailability {
    last_issued: u64,
    in_flight: Option<LookupId>,
    status: EmailStatus,
}

impl EmailAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a lookup for `email`, superseding any lookup still in flight.
    pub fn begin(&mut self, email: &str) -> LookupRequest {
        self.last_issued += 1;
        let id = LookupId(self.last_issued);
        self.in_flight = Some(id);
        self.status = EmailStatus::Checking(id);
        LookupRequest {
            id,
            email: email.trim().to_string(),
        }
    }

    /// Apply an outcome if it answers the newest lookup.
    ///
    /// Returns `false` (and changes nothing) for superseded or cancelled lookups.
    pub fn resolve(&mut self, outcome: &LookupOutcome) -> bool {
        if self.in_flight != Some(outcome.id) {
            tracing::debug!(lookup = %outcome.id, "discarding stale email lookup");
            return false;
        }

        self.in_flight = None;
        self.status = if outcome.taken {
            EmailStatus::Taken
        } else {
            EmailStatus::Available
        };
        true
    }

    /// Drop the lookup in flight; its outcome will be ignored.
    pub fn cancel(&mut self) {
        self.in_flight = None;
        self.status = EmailStatus::Idle;
    }

    pub fn status(&self) -> EmailStatus {
        self.status
    }

    pub fn is_taken(&self) -> bool {
        self.status == EmailStatus::Taken
    }
}

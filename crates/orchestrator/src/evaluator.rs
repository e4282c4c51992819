//! Endorsement acceptance decision.

use tracing::warn;

use ledger_types::ProposalResponse;

use crate::config::DEFAULT_ERROR_THRESHOLD;

/// Outcome of inspecting a set of endorsement responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndorsementVerdict {
    /// Representative status is below the threshold
    Accepted(ProposalResponse),
    /// Representative status is at or above the threshold; nothing may be submitted
    Rejected(ProposalResponse),
    /// No responses at all. Treated as success with nothing to surface.
    Empty,
}

impl EndorsementVerdict {
    pub fn is_success(&self) -> bool {
        !matches!(self, EndorsementVerdict::Rejected(_))
    }

    pub fn response(&self) -> Option<&ProposalResponse> {
        match self {
            EndorsementVerdict::Accepted(response) | EndorsementVerdict::Rejected(response) => Some(response),
            EndorsementVerdict::Empty => None,
        }
    }

    pub fn into_response(self) -> Option<ProposalResponse> {
        match self {
            EndorsementVerdict::Accepted(response) | EndorsementVerdict::Rejected(response) => Some(response),
            EndorsementVerdict::Empty => None,
        }
    }
}

/// Decides whether endorsement succeeded well enough to proceed.
///
/// Only the first response is inspected. Responses arrive in completion
/// order, so this is whichever endorser answered first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseEvaluator {
    error_threshold: i32,
}

impl ResponseEvaluator {
    pub fn new(error_threshold: i32) -> Self {
        Self { error_threshold }
    }

    pub fn error_threshold(&self) -> i32 {
        self.error_threshold
    }

    pub fn evaluate(&self, responses: &[ProposalResponse]) -> EndorsementVerdict {
        let Some(first) = responses.first() else {
            warn!("No endorsement responses received, treating as success");
            return EndorsementVerdict::Empty;
        };

        if first.status() >= self.error_threshold {
            warn!(
                "Endorsement rejected by {} with status {}: {}",
                first.origin,
                first.status(),
                first.response.message
            );
            EndorsementVerdict::Rejected(first.clone())
        } else {
            EndorsementVerdict::Accepted(first.clone())
        }
    }
}

impl Default for ResponseEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_THRESHOLD)
    }
}

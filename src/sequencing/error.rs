//! Sequencing error taxonomy.

use thiserror::Error;

/// Errors raised by the sequencing engine.
///
/// Input variants report caller-supplied data that violates a precondition
/// and are never retried internally. [`InconsistentSolution`] is different
/// in kind: it means the model or the solver integration is broken, not the
/// request, and must be surfaced rather than recovered from.
///
/// [`InconsistentSolution`]: SequencingError::InconsistentSolution
#[derive(Debug, Error)]
pub enum SequencingError {
    /// The agent list was empty.
    #[error("agent list is empty")]
    EmptyAgents,

    /// The same agent id appeared more than once in one request.
    #[error("duplicate agent id: {id}")]
    DuplicateAgent { id: String },

    /// A supplied weight was negative, NaN, or infinite.
    #[error("invalid weight {value} for agent {id}: weights must be finite and non-negative")]
    InvalidWeight { id: String, value: f64 },

    /// The request exceeds the configured agent bound.
    ///
    /// The transitivity constraint set grows cubically with the agent
    /// count, so oversized requests are rejected up front instead of
    /// letting the solver stall.
    #[error("request has {count} agents, exceeding the configured maximum of {max}")]
    TooManyAgents { count: usize, max: usize },

    /// A precedence override referenced an agent not in the request.
    #[error("precedence override references unknown agent: {id}")]
    UnknownAgent { id: String },

    /// The precedence overrides cannot all hold at once.
    #[error("precedence overrides form a cycle involving: {}", agents.join(", "))]
    OverrideCycle { agents: Vec<String> },

    /// The solver returned an assignment that does not encode a total
    /// order, or reported a well-formed model unsolvable. Internal fault.
    #[error("inconsistent solver solution: {0}")]
    InconsistentSolution(String),
}

impl SequencingError {
    /// Whether this error reports bad caller input (as opposed to an
    /// internal model/solver fault).
    pub fn is_input_error(&self) -> bool {
        !matches!(self, SequencingError::InconsistentSolution(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(SequencingError::EmptyAgents.is_input_error());
        assert!(SequencingError::DuplicateAgent { id: "T1".into() }.is_input_error());
        assert!(!SequencingError::InconsistentSolution("dup position".into()).is_input_error());
    }

    #[test]
    fn test_display() {
        let err = SequencingError::InvalidWeight {
            id: "T2".into(),
            value: -1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("T2"));
        assert!(msg.contains("-1"));

        let err = SequencingError::OverrideCycle {
            agents: vec!["T1".into(), "T2".into()],
        };
        assert!(err.to_string().contains("T1, T2"));
    }
}

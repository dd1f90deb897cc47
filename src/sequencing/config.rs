//! Sequencer configuration.

/// Configuration for the [`Sequencer`](super::Sequencer).
///
/// # Defaults
///
/// ```
/// use railseq::sequencing::SequencerConfig;
///
/// let config = SequencerConfig::default();
/// assert_eq!(config.max_agents, 200);
/// assert_eq!(config.time_limit_ms, 10_000);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use railseq::sequencing::SequencerConfig;
///
/// let config = SequencerConfig::default()
///     .with_max_agents(50)
///     .with_time_limit_ms(2_000);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequencerConfig {
    /// Maximum number of agents accepted per request.
    ///
    /// The precedence model has O(n²) variables and O(n³) transitivity
    /// constraints, so this bound keeps a single request from stalling
    /// the solver. Requests above it are rejected; batch or split them
    /// externally instead.
    pub max_agents: usize,

    /// Wall-clock time limit for the solver, in milliseconds.
    ///
    /// Expiry is not an error: the engine falls back to the
    /// deterministic weight-descending sort.
    pub time_limit_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            max_agents: 200,
            time_limit_ms: 10_000,
        }
    }
}

impl SequencerConfig {
    /// Sets the maximum agent count per request.
    pub fn with_max_agents(mut self, n: usize) -> Self {
        self.max_agents = n;
        self
    }

    /// Sets the solver time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_agents == 0 {
            return Err("max_agents must be at least 1".into());
        }
        if self.time_limit_ms == 0 {
            return Err("time_limit_ms must be positive".into());
        }
        Ok(())
    }
}

//! Precedence sequencing of trains over a shared capacity-one resource.
//!
//! Given a set of agents (trains) and per-agent delay-cost weights,
//! computes the total order in which they may proceed, minimizing the
//! weighted sum of order positions. Pairwise precedence decisions are
//! encoded as a 0-1 integer program with explicit totality, antisymmetry,
//! and transitivity constraints, so the decoded order is guaranteed
//! cycle-free.
//!
//! # Key Components
//!
//! - **Builder**: [`PrecedenceModel`] — agents + weights into the ILP
//! - **Engine**: [`Sequencer`] — validate, build, solve, decode
//! - **Decoder**: [`decode`], [`decode_positions`] — assignment into order
//! - **Fallback**: [`Sequencer::fallback_order`] — deterministic
//!   weight-descending sort used when the solver degrades
//!
//! # Scaling
//!
//! The formulation carries O(n²) variables and O(n³) transitivity
//! constraints, which is practical only up to a few hundred agents per
//! request; [`SequencerConfig::max_agents`] enforces the bound.

mod builder;
mod config;
mod decoder;
mod engine;
mod error;

pub use builder::{PrecedenceModel, PrecedenceOverride, DEFAULT_WEIGHT};
pub use config::SequencerConfig;
pub use decoder::{decode, decode_positions};
pub use engine::{Sequence, SequenceStatus, Sequencer};
pub use error::SequencingError;

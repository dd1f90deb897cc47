//! Precedence sequencing engine for shared railway resources.
//!
//! When several trains contend for one capacity-one resource (a junction,
//! a single-track segment, a platform), some total order of passage must
//! be chosen. This crate computes that order by minimizing a weighted sum
//! of order positions, deriving a consistent total order from pairwise
//! precedence decisions:
//!
//! - **milp**: a solver-agnostic 0-1 integer programming layer — binary
//!   variables, linear constraints, linear objective, and the
//!   [`MilpSolver`](milp::MilpSolver) seam for plugging in external
//!   solvers, plus an in-crate exact branch-and-bound for small models.
//! - **sequencing**: the domain layer — the precedence model builder,
//!   the [`Sequencer`](sequencing::Sequencer) engine, the order decoder,
//!   and the deterministic weight-descending fallback sort.
//!
//! # Why an ILP for a problem a sort can solve
//!
//! For the plain weighted-position objective the optimal order is exactly
//! the weight-descending sort, and the engine uses that sort as its
//! fallback. The ILP formulation is kept because it extends to side
//! constraints a sort cannot express: fixed precedence overrides are
//! built in (see [`sequencing::PrecedenceOverride`]), and headway or
//! mutual-exclusion constraints slot into the same model.
//!
//! # Example
//!
//! ```
//! use railseq::sequencing::Sequencer;
//! use std::collections::HashMap;
//!
//! let agents: Vec<String> = ["T1", "T2", "T3", "T4"].map(String::from).into();
//! let weights = HashMap::from([
//!     ("T1".to_string(), 2.0),
//!     ("T2".to_string(), 1.0),
//!     ("T3".to_string(), 3.0),
//!     ("T4".to_string(), 1.0),
//! ]);
//!
//! let sequence = Sequencer::new().sequence(&agents, &weights).unwrap();
//! assert_eq!(sequence.order, ["T3", "T1", "T2", "T4"]);
//! ```

pub mod milp;
pub mod sequencing;

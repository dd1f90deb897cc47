//! 0-1 integer linear programming layer.
//!
//! A solver-agnostic model of binary decision variables, linear constraints,
//! and a linear objective, plus the solver seam used by the sequencing
//! engine.
//!
//! # Key Components
//!
//! - **Variables**: [`VarId`], [`BinVar`] — dense binary variable handles
//! - **Model**: [`MilpModel`], [`LinExpr`], [`Constraint`], [`Objective`]
//! - **Solver**: [`MilpSolver`] trait — interface for solver implementations
//! - **In-crate solver**: [`BranchBoundSolver`] — exact DFS branch-and-bound
//!   for small models
//!
//! # Design
//!
//! This module defines the modeling layer and a reference solver only.
//! The [`MilpSolver`] trait allows plugging in external solvers
//! (CBC, HiGHS, OR-Tools); everything above treats the solver as a black
//! box that returns an assignment and a [`SolveStatus`].

mod model;
mod solver;
mod variables;

pub use model::{CmpOp, Constraint, LinExpr, MilpModel, Objective, FEASIBILITY_EPS};
pub use solver::{BranchBoundSolver, MilpSolution, MilpSolver, SolveStatus, SolverConfig};
pub use variables::{BinVar, VarId};

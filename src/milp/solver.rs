//! MILP solver interface and an in-crate exact solver.

use super::model::{CmpOp, LinExpr, MilpModel, Objective, FEASIBILITY_EPS};
use super::variables::VarId;
use std::time::{Duration, Instant};

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible (but not necessarily optimal) solution found.
    Feasible,
    /// No feasible assignment exists.
    Infeasible,
    /// Model is invalid or malformed.
    ModelInvalid,
    /// Solver exceeded its time limit.
    Timeout,
    /// No solution found for unknown reasons.
    Unknown,
}

/// Solution from a MILP solver.
#[derive(Debug, Clone)]
pub struct MilpSolution {
    /// Solver status.
    pub status: SolveStatus,
    /// 0/1 assignment indexed by [`VarId`]. Empty when no solution was found.
    pub assignment: Vec<u8>,
    /// Objective value of the assignment (if any).
    pub objective_value: Option<f64>,
    /// Solve time in milliseconds.
    pub solve_time_ms: u64,
}

impl MilpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolveStatus) -> Self {
        Self {
            status,
            assignment: Vec::new(),
            objective_value: None,
            solve_time_ms: 0,
        }
    }

    /// Assigned value of a variable.
    ///
    /// # Panics
    ///
    /// Panics if the solution carries no assignment for `var`.
    pub fn value(&self, var: VarId) -> u8 {
        self.assignment[var.index()]
    }

    /// Whether a feasible assignment was found.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// Solver configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds.
    pub time_limit_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 10_000,
        }
    }
}

impl SolverConfig {
    /// Sets the time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }
}

/// Trait for MILP solver implementations.
///
/// This is the external-collaborator seam: implementations may wrap a
/// commercial or open-source solver (CBC, HiGHS, OR-Tools) or provide an
/// in-crate search like [`BranchBoundSolver`]. Implementations must not
/// panic on well-formed models; degraded outcomes are reported through
/// [`SolveStatus`].
pub trait MilpSolver: Send + Sync {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &MilpModel, config: &SolverConfig) -> MilpSolution;
}

/// Exact depth-first branch-and-bound solver for small binary programs.
///
/// Branches on variables in creation order, pruning subtrees whose
/// constraint bounds are already violated or whose objective bound cannot
/// improve on the incumbent. Exhaustive, so proven optimal on completion.
///
/// # Limitations
///
/// Worst-case exponential in the variable count. Intended for models with
/// up to a few hundred binary variables (constraint propagation keeps
/// tightly-constrained models such as total-order formulations tractable
/// well beyond the naive bound); production deployments should plug a real
/// MILP solver into [`MilpSolver`] instead.
pub struct BranchBoundSolver;

impl BranchBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BranchBoundSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MilpSolver for BranchBoundSolver {
    fn solve(&self, model: &MilpModel, config: &SolverConfig) -> MilpSolution {
        if model.validate().is_err() {
            return MilpSolution::empty(SolveStatus::ModelInvalid);
        }

        let start = Instant::now();
        let n = model.var_count();

        // Normalize the objective to minimization over dense coefficients.
        let mut obj_coeffs = vec![0.0; n];
        let mut obj_const = 0.0;
        let mut flip = 1.0;
        if let Some(obj) = &model.objective {
            let (expr, sign): (&LinExpr, f64) = match obj {
                Objective::Minimize(e) => (e, 1.0),
                Objective::Maximize(e) => (e, -1.0),
            };
            flip = sign;
            obj_const = sign * expr.constant;
            for &(v, c) in &expr.terms {
                obj_coeffs[v.index()] += sign * c;
            }
        }

        let mut search = Search {
            model,
            obj_coeffs,
            obj_const,
            assignment: vec![0; n],
            best: None,
            deadline: start + Duration::from_millis(config.time_limit_ms),
            timed_out: false,
        };
        search.dfs(0);

        let solve_time_ms = start.elapsed().as_millis() as u64;
        let status = if search.timed_out {
            SolveStatus::Timeout
        } else if search.best.is_some() {
            SolveStatus::Optimal
        } else {
            SolveStatus::Infeasible
        };

        match search.best {
            Some((cost, assignment)) => MilpSolution {
                status,
                assignment,
                objective_value: model.objective.as_ref().map(|_| flip * cost),
                solve_time_ms,
            },
            None => MilpSolution {
                status,
                assignment: Vec::new(),
                objective_value: None,
                solve_time_ms,
            },
        }
    }
}

/// Depth-first search state for [`BranchBoundSolver`].
struct Search<'a> {
    model: &'a MilpModel,
    /// Minimization objective coefficients, dense by variable index.
    obj_coeffs: Vec<f64>,
    obj_const: f64,
    /// Current partial assignment; indices below the search depth are fixed.
    assignment: Vec<u8>,
    /// Incumbent: (minimized cost, assignment).
    best: Option<(f64, Vec<u8>)>,
    deadline: Instant,
    timed_out: bool,
}

impl Search<'_> {
    fn dfs(&mut self, depth: usize) {
        if self.timed_out {
            return;
        }
        if Instant::now() >= self.deadline {
            self.timed_out = true;
            return;
        }
        if !self.prefix_feasible(depth) {
            return;
        }
        // Objective comparisons are exact on purpose: an epsilon here
        // could discard a true optimum whose margin over the incumbent
        // is below the tolerance, and equal-cost leaves must lose to the
        // earlier-visited incumbent for reproducible tie handling.
        if let Some((best_cost, _)) = &self.best {
            if self.cost_lower_bound(depth) >= *best_cost {
                return;
            }
        }

        if depth == self.model.var_count() {
            // All constraint bounds are exact at a leaf, so the prefix
            // check above already proved feasibility.
            let cost = self.cost_lower_bound(depth);
            let better = match &self.best {
                Some((best_cost, _)) => cost < *best_cost,
                None => true,
            };
            if better {
                self.best = Some((cost, self.assignment.clone()));
            }
            return;
        }

        // Branch on 1 before 0. The first incumbent is kept over later
        // equal-cost ones, so among tied optima the solver reproducibly
        // returns the lexicographically largest assignment in variable
        // creation order.
        for value in [1u8, 0] {
            self.assignment[depth] = value;
            self.dfs(depth + 1);
        }
        self.assignment[depth] = 0;
    }

    /// Whether every constraint can still be satisfied given the fixed
    /// prefix `assignment[..depth]`.
    fn prefix_feasible(&self, depth: usize) -> bool {
        for c in &self.model.constraints {
            let mut lo = c.expr.constant;
            let mut hi = c.expr.constant;
            for &(v, coeff) in &c.expr.terms {
                if v.index() < depth {
                    let contribution = coeff * f64::from(self.assignment[v.index()]);
                    lo += contribution;
                    hi += contribution;
                } else {
                    lo += coeff.min(0.0);
                    hi += coeff.max(0.0);
                }
            }
            let ok = match c.op {
                CmpOp::Le => lo <= c.rhs + FEASIBILITY_EPS,
                CmpOp::Ge => hi >= c.rhs - FEASIBILITY_EPS,
                CmpOp::Eq => lo <= c.rhs + FEASIBILITY_EPS && hi >= c.rhs - FEASIBILITY_EPS,
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// Lower bound on the minimized cost reachable from this node.
    fn cost_lower_bound(&self, depth: usize) -> f64 {
        let mut bound = self.obj_const;
        for (i, &coeff) in self.obj_coeffs.iter().enumerate() {
            if i < depth {
                bound += coeff * f64::from(self.assignment[i]);
            } else {
                bound += coeff.min(0.0);
            }
        }
        bound
    }
}

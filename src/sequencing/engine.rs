//! Sequencing engine.
//!
//! Single entry point wiring the model builder, the solver seam, and the
//! order decoder together, with the deterministic fallback sort for
//! degraded solver outcomes.

use super::builder::{resolved_weights, validate_agents, PrecedenceModel, PrecedenceOverride};
use super::config::SequencerConfig;
use super::decoder;
use super::error::SequencingError;
use crate::milp::{BranchBoundSolver, MilpSolver, SolveStatus, SolverConfig};
use std::collections::HashMap;
use tracing::{debug, warn};

/// How the returned order was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceStatus {
    /// The solver produced the order (proven optimal or best found).
    Optimal,
    /// The solver was unavailable or degraded; the deterministic
    /// weight-descending sort produced the order instead.
    Fallback,
}

/// Result of one sequencing request.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sequence {
    /// All input agents, ordered front to back; a permutation of the input.
    pub order: Vec<String>,
    /// Whether the order came from the solver or the fallback sort.
    pub status: SequenceStatus,
    /// Objective value of the order: `Σ_i weight[i] * position[i]`.
    pub objective: f64,
    /// Wall-clock time spent in the solver, in milliseconds.
    pub solve_time_ms: u64,
}

/// Precedence sequencing engine.
///
/// Computes, for a set of agents contending for one capacity-one resource,
/// the total order minimizing the weighted sum of order positions. The
/// request runs as a single synchronous formulate, solve, decode pass;
/// all state is request-scoped, so independent requests may run
/// concurrently on separate engines or share one engine across threads.
///
/// Solver degradation (timeout, failure) is absorbed by a deterministic
/// fallback sort and reported through [`SequenceStatus::Fallback`], never
/// as an error. For the plain weighted-position objective the fallback is
/// exact; the full ILP formulation earns its keep once side constraints
/// such as [`PrecedenceOverride`]s enter.
///
/// # Examples
///
/// ```
/// use railseq::sequencing::Sequencer;
/// use std::collections::HashMap;
///
/// let agents: Vec<String> = ["T1", "T2", "T3"].map(String::from).into();
/// let weights = HashMap::from([("T2".to_string(), 5.0)]);
///
/// let sequence = Sequencer::new().sequence(&agents, &weights).unwrap();
/// assert_eq!(sequence.order[0], "T2");
/// ```
pub struct Sequencer {
    config: SequencerConfig,
    solver: Box<dyn MilpSolver>,
}

impl Sequencer {
    /// Creates an engine with the default configuration and the in-crate
    /// [`BranchBoundSolver`].
    pub fn new() -> Self {
        Self::with_config(SequencerConfig::default())
    }

    /// Creates an engine with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid (see
    /// [`SequencerConfig::validate`]), so a misconfigured engine fails at
    /// construction rather than on the first request.
    pub fn with_config(config: SequencerConfig) -> Self {
        config.validate().expect("invalid SequencerConfig");
        Self {
            config,
            solver: Box::new(BranchBoundSolver::new()),
        }
    }

    /// Replaces the solver implementation (e.g. with an external MILP
    /// solver binding).
    pub fn with_solver(mut self, solver: impl MilpSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    /// Sequences the agents by weight-encoded priority.
    ///
    /// Agents missing from `weights` default to 1.0. Returns the ordered
    /// permutation of `agents` together with how it was obtained.
    pub fn sequence(
        &self,
        agents: &[String],
        weights: &HashMap<String, f64>,
    ) -> Result<Sequence, SequencingError> {
        self.sequence_with_overrides(agents, weights, &[])
    }

    /// Sequences the agents subject to fixed precedence overrides.
    ///
    /// Each override pins one pairwise decision in the model. Overrides
    /// must reference request agents and must not form a cycle.
    pub fn sequence_with_overrides(
        &self,
        agents: &[String],
        weights: &HashMap<String, f64>,
        overrides: &[PrecedenceOverride],
    ) -> Result<Sequence, SequencingError> {
        if agents.len() > self.config.max_agents {
            return Err(SequencingError::TooManyAgents {
                count: agents.len(),
                max: self.config.max_agents,
            });
        }

        let pm = PrecedenceModel::build(agents, weights, overrides)?;

        let solver_config = SolverConfig::default().with_time_limit_ms(self.config.time_limit_ms);
        let solution = self.solver.solve(pm.model(), &solver_config);
        debug!(
            status = ?solution.status,
            objective = ?solution.objective_value,
            solve_time_ms = solution.solve_time_ms,
            "precedence model solved"
        );

        match solution.status {
            SolveStatus::Optimal | SolveStatus::Feasible => {
                let order = decoder::decode(agents, &pm, &solution)?;
                let objective = weighted_position_cost(agents, pm.weights(), &order);
                Ok(Sequence {
                    order,
                    status: SequenceStatus::Optimal,
                    objective,
                    solve_time_ms: solution.solve_time_ms,
                })
            }
            // Any total order satisfies the constraint system and the
            // builder rejects contradictory overrides, so infeasibility
            // can only mean the model or solver integration is broken.
            SolveStatus::Infeasible | SolveStatus::ModelInvalid => {
                Err(SequencingError::InconsistentSolution(format!(
                    "solver reported {:?} for a satisfiable precedence model",
                    solution.status
                )))
            }
            SolveStatus::Timeout | SolveStatus::Unknown => {
                warn!(
                    status = ?solution.status,
                    agents = agents.len(),
                    "solver degraded, using deterministic fallback order"
                );
                let indices = fallback_indices(pm.weights(), pm.override_pairs());
                let order: Vec<String> = indices.iter().map(|&i| agents[i].clone()).collect();
                let objective = weighted_position_cost(agents, pm.weights(), &order);
                Ok(Sequence {
                    order,
                    status: SequenceStatus::Fallback,
                    objective,
                    solve_time_ms: solution.solve_time_ms,
                })
            }
        }
    }

    /// The solver-free ordering: agents sorted by weight descending,
    /// ties kept in input order.
    ///
    /// This is the exact optimum of the weighted-position objective when
    /// no overrides are in play, and is what the engine degrades to on
    /// solver failure.
    pub fn fallback_order(
        agents: &[String],
        weights: &HashMap<String, f64>,
    ) -> Result<Vec<String>, SequencingError> {
        validate_agents(agents)?;
        let resolved = resolved_weights(agents, weights)?;
        let indices = fallback_indices(&resolved, &[]);
        Ok(indices.into_iter().map(|i| agents[i].clone()).collect())
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Objective value of an order: `Σ weight * position`.
fn weighted_position_cost(agents: &[String], resolved: &[f64], order: &[String]) -> f64 {
    let index: HashMap<&str, usize> = agents
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    order
        .iter()
        .enumerate()
        .map(|(pos, id)| resolved[index[id.as_str()]] * pos as f64)
        .sum()
}

/// Greedy topological ordering: among agents whose override predecessors
/// are all placed, repeatedly place the heaviest (earliest input index on
/// ties). With no overrides this degenerates to a stable sort by weight
/// descending.
fn fallback_indices(weights: &[f64], override_pairs: &[(usize, usize)]) -> Vec<usize> {
    let n = weights.len();
    let mut unmet = vec![0usize; n];
    for &(_, b) in override_pairs {
        unmet[b] += 1;
    }

    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for _ in 0..n {
        let mut pick: Option<usize> = None;
        for i in 0..n {
            if placed[i] || unmet[i] > 0 {
                continue;
            }
            match pick {
                Some(p) if weights[i] <= weights[p] => {}
                _ => pick = Some(i),
            }
        }
        let next = pick.expect("override digraph is acyclic");
        placed[next] = true;
        order.push(next);
        for &(a, b) in override_pairs {
            if a == next {
                unmet[b] -= 1;
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milp::{MilpModel, MilpSolution};
    use proptest::prelude::*;

    fn agents(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn weights(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    /// Solver stub that always reports the given status.
    struct StubSolver(SolveStatus);

    impl MilpSolver for StubSolver {
        fn solve(&self, _model: &MilpModel, _config: &SolverConfig) -> MilpSolution {
            MilpSolution::empty(self.0)
        }
    }

    #[test]
    fn test_weighted_scenario() {
        // T2 and T4 tie at weight 1 and keep their input order.
        let ids = agents(&["T1", "T2", "T3", "T4"]);
        let w = weights(&[("T1", 2.0), ("T2", 1.0), ("T3", 3.0), ("T4", 1.0)]);

        let sequence = Sequencer::new().sequence(&ids, &w).expect("valid input");

        assert_eq!(sequence.order, agents(&["T3", "T1", "T2", "T4"]));
        assert_eq!(sequence.status, SequenceStatus::Optimal);
        // 3*0 + 2*1 + 1*2 + 1*3 = 7
        assert!((sequence.objective - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_agent() {
        let ids = agents(&["T1"]);
        let sequence = Sequencer::new()
            .sequence(&ids, &HashMap::new())
            .expect("valid input");

        assert_eq!(sequence.order, ids);
        assert_eq!(sequence.status, SequenceStatus::Optimal);
        assert_eq!(sequence.objective, 0.0);
    }

    #[test]
    fn test_empty_agents() {
        let result = Sequencer::new().sequence(&[], &HashMap::new());
        assert!(matches!(result, Err(SequencingError::EmptyAgents)));
    }

    #[test]
    fn test_duplicate_agents() {
        let result = Sequencer::new().sequence(&agents(&["T1", "T1"]), &HashMap::new());
        assert!(matches!(
            result,
            Err(SequencingError::DuplicateAgent { id }) if id == "T1"
        ));
    }

    #[test]
    fn test_agent_bound() {
        let engine = Sequencer::with_config(SequencerConfig::default().with_max_agents(2));
        let result = engine.sequence(&agents(&["T1", "T2", "T3"]), &HashMap::new());
        assert!(matches!(
            result,
            Err(SequencingError::TooManyAgents { count: 3, max: 2 })
        ));
    }

    #[test]
    fn test_default_weight_ties_keep_input_order() {
        let ids = agents(&["T1", "T2", "T3"]);
        let sequence = Sequencer::new()
            .sequence(&ids, &HashMap::new())
            .expect("valid input");

        assert_eq!(sequence.order, ids);
    }

    #[test]
    fn test_fallback_on_timeout() {
        let engine = Sequencer::new().with_solver(StubSolver(SolveStatus::Timeout));
        let ids = agents(&["T1", "T2", "T3"]);
        let w = weights(&[("T1", 1.0), ("T2", 9.0), ("T3", 4.0)]);

        let sequence = engine.sequence(&ids, &w).expect("fallback always works");

        assert_eq!(sequence.status, SequenceStatus::Fallback);
        assert_eq!(sequence.order, agents(&["T2", "T3", "T1"]));
    }

    #[test]
    fn test_fallback_on_unknown() {
        let engine = Sequencer::new().with_solver(StubSolver(SolveStatus::Unknown));
        let sequence = engine
            .sequence(&agents(&["T1", "T2"]), &HashMap::new())
            .expect("fallback always works");
        assert_eq!(sequence.status, SequenceStatus::Fallback);
    }

    #[test]
    fn test_infeasible_is_internal_error() {
        let engine = Sequencer::new().with_solver(StubSolver(SolveStatus::Infeasible));
        let result = engine.sequence(&agents(&["T1", "T2"]), &HashMap::new());

        match result {
            Err(err @ SequencingError::InconsistentSolution(_)) => {
                assert!(!err.is_input_error());
            }
            other => panic!("expected InconsistentSolution, got {other:?}"),
        }
    }

    #[test]
    fn test_unfilled_solver_assignment_is_internal_error() {
        // A plugged-in solver claiming Optimal without filling the
        // assignment must surface as an error, not a decoder panic.
        let engine = Sequencer::new().with_solver(StubSolver(SolveStatus::Optimal));
        let result = engine.sequence(&agents(&["T1", "T2"]), &HashMap::new());

        assert!(matches!(
            result,
            Err(SequencingError::InconsistentSolution(_))
        ));
    }

    #[test]
    #[should_panic(expected = "invalid SequencerConfig")]
    fn test_invalid_config_panics_at_construction() {
        let _ = Sequencer::with_config(SequencerConfig::default().with_max_agents(0));
    }

    #[test]
    fn test_override_beats_weight() {
        // T3 is the heaviest but the override forces T1 ahead of it.
        let ids = agents(&["T1", "T2", "T3"]);
        let w = weights(&[("T1", 1.0), ("T2", 2.0), ("T3", 5.0)]);

        let sequence = Sequencer::new()
            .sequence_with_overrides(&ids, &w, &[PrecedenceOverride::new("T1", "T3")])
            .expect("valid input");

        assert_eq!(sequence.status, SequenceStatus::Optimal);
        let pos = |id: &str| sequence.order.iter().position(|x| x == id).unwrap();
        assert!(pos("T1") < pos("T3"));
        // T2 is unconstrained and lighter than T3, yet the optimum keeps
        // the expensive T3 as early as the override allows: T1, T3, T2.
        assert_eq!(sequence.order, agents(&["T1", "T3", "T2"]));
    }

    #[test]
    fn test_fallback_with_overrides() {
        let engine = Sequencer::new().with_solver(StubSolver(SolveStatus::Timeout));
        let ids = agents(&["T1", "T2", "T3"]);
        let w = weights(&[("T1", 1.0), ("T2", 2.0), ("T3", 5.0)]);

        let sequence = engine
            .sequence_with_overrides(&ids, &w, &[PrecedenceOverride::new("T1", "T3")])
            .expect("fallback always works");

        assert_eq!(sequence.status, SequenceStatus::Fallback);
        let pos = |id: &str| sequence.order.iter().position(|x| x == id).unwrap();
        assert!(pos("T1") < pos("T3"));
    }

    #[test]
    fn test_fallback_order_direct() {
        let ids = agents(&["T1", "T2", "T3", "T4"]);
        let w = weights(&[("T1", 2.0), ("T2", 1.0), ("T3", 3.0), ("T4", 1.0)]);

        let order = Sequencer::fallback_order(&ids, &w).expect("valid input");
        assert_eq!(order, agents(&["T3", "T1", "T2", "T4"]));
    }

    #[test]
    fn test_solver_matches_fallback() {
        let ids = agents(&["A", "B", "C", "D", "E"]);
        let w = weights(&[("A", 0.5), ("B", 7.0), ("C", 2.0), ("D", 2.0), ("E", 0.0)]);

        let solved = Sequencer::new().sequence(&ids, &w).expect("valid input");
        let fallback = Sequencer::fallback_order(&ids, &w).expect("valid input");

        assert_eq!(solved.status, SequenceStatus::Optimal);
        assert_eq!(solved.order, fallback);
    }

    #[test]
    fn test_repeated_calls_are_deterministic() {
        let ids = agents(&["T1", "T2", "T3"]);
        let w = weights(&[("T1", 1.0), ("T2", 1.0), ("T3", 1.0)]);

        let engine = Sequencer::new();
        let first = engine.sequence(&ids, &w).expect("valid input");
        for _ in 0..5 {
            let again = engine.sequence(&ids, &w).expect("valid input");
            assert_eq!(again.order, first.order);
        }
    }

    // ---- Property tests ----

    // Integer-valued weights: well separated, so scaling by any positive
    // factor can never round two distinct weights into a tie.
    fn weight_sets(max_agents: usize) -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec((0u32..100).prop_map(f64::from), 1..=max_agents)
    }

    fn request(values: &[f64]) -> (Vec<String>, HashMap<String, f64>) {
        let ids: Vec<String> = (0..values.len()).map(|i| format!("T{i}")).collect();
        let w = ids
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect::<HashMap<_, _>>();
        (ids, w)
    }

    proptest! {
        #[test]
        fn prop_output_is_permutation(values in weight_sets(5)) {
            let (ids, w) = request(&values);
            let sequence = Sequencer::new().sequence(&ids, &w).unwrap();

            let mut sorted_out = sequence.order.clone();
            let mut sorted_in = ids.clone();
            sorted_out.sort();
            sorted_in.sort();
            prop_assert_eq!(sorted_out, sorted_in);
        }

        #[test]
        fn prop_solver_equals_fallback(values in weight_sets(5)) {
            let (ids, w) = request(&values);
            let solved = Sequencer::new().sequence(&ids, &w).unwrap();
            let fallback = Sequencer::fallback_order(&ids, &w).unwrap();

            prop_assert_eq!(solved.status, SequenceStatus::Optimal);
            prop_assert_eq!(&solved.order, &fallback);
        }

        #[test]
        fn prop_weight_scaling_is_invariant(
            values in weight_sets(5),
            scale in 0.001f64..1000.0,
        ) {
            let (ids, w) = request(&values);
            let scaled: HashMap<String, f64> =
                w.iter().map(|(k, &v)| (k.clone(), v * scale)).collect();

            let base = Sequencer::new().sequence(&ids, &w).unwrap();
            let rescaled = Sequencer::new().sequence(&ids, &scaled).unwrap();
            prop_assert_eq!(base.order, rescaled.order);
        }

        #[test]
        fn prop_positions_follow_weights(values in weight_sets(5)) {
            // In the output, weights are non-increasing front to back
            // (the objective rewards placing heavy agents early).
            let (ids, w) = request(&values);
            let sequence = Sequencer::new().sequence(&ids, &w).unwrap();

            let ws: Vec<f64> = sequence.order.iter().map(|id| w[id]).collect();
            for pair in ws.windows(2) {
                prop_assert!(pair[0] >= pair[1]);
            }
        }
    }
}

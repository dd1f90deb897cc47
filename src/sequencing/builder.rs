//! Precedence model builder.
//!
//! Translates a list of agents and per-agent weights into a 0-1 integer
//! program whose variables encode pairwise precedence and whose
//! constraints enforce total-order consistency.

use super::error::SequencingError;
use crate::milp::{Constraint, LinExpr, MilpModel, Objective, VarId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Weight assumed for agents missing from the weight map.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// A fixed precedence decision imposed on the model: `before` must be
/// sequenced ahead of `after`.
///
/// Overrides are the extension hook the ILP formulation exists for; a
/// plain weight sort cannot express them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrecedenceOverride {
    /// Agent that must come first.
    pub before: String,
    /// Agent that must come after.
    pub after: String,
}

impl PrecedenceOverride {
    /// Creates an override requiring `before` to precede `after`.
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }
}

/// The precedence ILP for one sequencing request.
///
/// Holds the generic [`MilpModel`] together with the dense n×n arena
/// mapping ordered agent-index pairs to their precedence variables.
/// Built fresh per request and discarded once the order is decoded;
/// nothing is shared across requests.
///
/// # Formulation
///
/// For every ordered pair of distinct indices `(i, j)` a binary variable
/// `x[i,j]` meaning "agent i is sequenced strictly before agent j":
///
/// - totality/antisymmetry: `x[i,j] + x[j,i] = 1` per unordered pair (O(n²))
/// - transitivity: `x[i,j] + x[j,k] - x[i,k] <= 1` per ordered triple (O(n³))
/// - objective: minimize `Σ_i w[i] * pos[i]` with
///   `pos[i] = Σ_{j≠i} x[j,i]` substituted directly, no position variables
///
/// The cubic constraint count is the dominant cost and the reason requests
/// are bounded (see [`SequencerConfig`](super::SequencerConfig)).
#[derive(Debug)]
pub struct PrecedenceModel {
    model: MilpModel,
    /// Row-major n×n arena; `vars[i * n + j]` is `x[i,j]`, diagonal `None`.
    vars: Vec<Option<VarId>>,
    n: usize,
    /// Per-agent weights in input order, defaults already applied.
    weights: Vec<f64>,
    /// Override agent-index pairs, deduplicated and verified acyclic.
    override_pairs: Vec<(usize, usize)>,
}

impl PrecedenceModel {
    /// Builds the precedence ILP for the given agents and weights.
    ///
    /// Agents missing from `weights` default to [`DEFAULT_WEIGHT`].
    /// Fails on an empty agent list, duplicate agents, a negative or
    /// non-finite supplied weight, or overrides that reference unknown
    /// agents or contradict each other.
    pub fn build(
        agents: &[String],
        weights: &HashMap<String, f64>,
        overrides: &[PrecedenceOverride],
    ) -> Result<Self, SequencingError> {
        validate_agents(agents)?;
        let resolved = resolved_weights(agents, weights)?;
        let n = agents.len();
        let override_pairs = resolve_overrides(agents, overrides)?;

        let mut model = MilpModel::new("precedence");
        let mut vars: Vec<Option<VarId>> = vec![None; n * n];

        // Mirror variables are allocated adjacently and pairs are grouped
        // by their larger index, so every variable among agents 0..=j is
        // placed before any variable involving j+1. Depth-first solvers
        // branching in creation order then close sub-tournaments early and
        // the pair and triple constraints prune almost immediately.
        for j in 1..n {
            for i in 0..j {
                vars[i * n + j] = Some(model.add_binary(format!("x_{i}_{j}")));
                vars[j * n + i] = Some(model.add_binary(format!("x_{j}_{i}")));
            }
        }
        let var = |i: usize, j: usize| vars[i * n + j].expect("off-diagonal pair variable");

        // Totality and antisymmetry: exactly one of x[i,j], x[j,i].
        for i in 0..n {
            for j in (i + 1)..n {
                model.add_constraint(Constraint::eq(
                    LinExpr::sum([(var(i, j), 1.0), (var(j, i), 1.0)]),
                    1.0,
                ));
            }
        }

        // Transitivity: no directed 3-cycles in the induced relation.
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    if i == j || j == k || i == k {
                        continue;
                    }
                    model.add_constraint(Constraint::le(
                        LinExpr::sum([(var(i, j), 1.0), (var(j, k), 1.0), (var(i, k), -1.0)]),
                        1.0,
                    ));
                }
            }
        }

        // Fixed precedence overrides pin their variable to 1.
        for &(a, b) in &override_pairs {
            model.add_constraint(Constraint::eq(LinExpr::term(var(a, b), 1.0), 1.0));
        }

        // Objective: minimize Σ_i w[i] * Σ_{j≠i} x[j,i].
        let mut objective = LinExpr::new();
        for (i, &weight) in resolved.iter().enumerate() {
            for j in 0..n {
                if j != i {
                    objective.add_term(var(j, i), weight);
                }
            }
        }
        model.set_objective(Objective::Minimize(objective));

        debug!(
            agents = n,
            variables = model.var_count(),
            constraints = model.constraint_count(),
            overrides = override_pairs.len(),
            "built precedence model"
        );

        Ok(Self {
            model,
            vars,
            n,
            weights: resolved,
            override_pairs,
        })
    }

    /// The underlying MILP model.
    pub fn model(&self) -> &MilpModel {
        &self.model
    }

    /// Number of agents in the request.
    pub fn agent_count(&self) -> usize {
        self.n
    }

    /// The precedence variable `x[i,j]`, `None` on the diagonal.
    pub fn var(&self, i: usize, j: usize) -> Option<VarId> {
        self.vars[i * self.n + j]
    }

    /// Resolved per-agent weights in input order, defaults applied.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Override agent-index pairs baked into the model.
    pub fn override_pairs(&self) -> &[(usize, usize)] {
        &self.override_pairs
    }
}

/// Checks the agent list is non-empty and free of duplicates.
pub(crate) fn validate_agents(agents: &[String]) -> Result<(), SequencingError> {
    if agents.is_empty() {
        return Err(SequencingError::EmptyAgents);
    }
    let mut seen = HashSet::with_capacity(agents.len());
    for id in agents {
        if !seen.insert(id.as_str()) {
            return Err(SequencingError::DuplicateAgent { id: id.clone() });
        }
    }
    Ok(())
}

/// Resolves the weight of each agent in input order, defaulting missing
/// entries to [`DEFAULT_WEIGHT`] and rejecting any supplied weight that is
/// negative or non-finite.
pub(crate) fn resolved_weights(
    agents: &[String],
    weights: &HashMap<String, f64>,
) -> Result<Vec<f64>, SequencingError> {
    for (id, &value) in weights {
        if !value.is_finite() || value < 0.0 {
            return Err(SequencingError::InvalidWeight {
                id: id.clone(),
                value,
            });
        }
    }
    Ok(agents
        .iter()
        .map(|id| weights.get(id).copied().unwrap_or(DEFAULT_WEIGHT))
        .collect())
}

/// Resolves override agent ids to index pairs and rejects cyclic override
/// sets. A cycle would make the model infeasible, which the engine treats
/// as an internal fault; it is caught here as the input error it really is.
pub(crate) fn resolve_overrides(
    agents: &[String],
    overrides: &[PrecedenceOverride],
) -> Result<Vec<(usize, usize)>, SequencingError> {
    let index: HashMap<&str, usize> = agents
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(overrides.len());
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    for o in overrides {
        let a = *index
            .get(o.before.as_str())
            .ok_or_else(|| SequencingError::UnknownAgent {
                id: o.before.clone(),
            })?;
        let b = *index
            .get(o.after.as_str())
            .ok_or_else(|| SequencingError::UnknownAgent { id: o.after.clone() })?;
        if seen.insert((a, b)) {
            pairs.push((a, b));
        }
    }

    // Kahn's algorithm over the override digraph; whatever cannot be
    // topologically consumed sits on a cycle.
    let n = agents.len();
    let mut indegree = vec![0usize; n];
    for &(_, b) in &pairs {
        indegree[b] += 1;
    }
    let mut queue: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut consumed = 0usize;
    while let Some(node) = queue.pop() {
        consumed += 1;
        for &(a, b) in &pairs {
            if a == node {
                indegree[b] -= 1;
                if indegree[b] == 0 {
                    queue.push(b);
                }
            }
        }
    }
    if consumed < n {
        let cyclic: Vec<String> = (0..n)
            .filter(|&i| indegree[i] > 0)
            .map(|i| agents[i].clone())
            .collect();
        return Err(SequencingError::OverrideCycle { agents: cyclic });
    }

    Ok(pairs)
}

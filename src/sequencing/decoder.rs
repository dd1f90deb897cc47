//! Order decoder.
//!
//! Converts a solved precedence assignment into a concrete ordered
//! sequence of agent identifiers.

use super::builder::PrecedenceModel;
use super::error::SequencingError;
use crate::milp::MilpSolution;

/// Computes the order position of each agent from a solved assignment.
///
/// `pos[i]` is the number of agents sequenced before agent `i`, i.e. the
/// sum of the assigned values of `x[j,i]` over all `j ≠ i`. Fails with
/// [`SequencingError::InconsistentSolution`] if the assignment does not
/// cover every model variable or the positions are not a permutation of
/// `0..n-1`. Both signal a solver or model fault rather than a user
/// error: any assignment satisfying the pair and triple constraints
/// yields a permutation, and a well-behaved solver returns one value per
/// variable.
pub fn decode_positions(
    pm: &PrecedenceModel,
    solution: &MilpSolution,
) -> Result<Vec<usize>, SequencingError> {
    // External solver implementations plugged in behind the seam may
    // report a solution without filling the assignment. Reject it here
    // before any variable lookup indexes into it.
    let expected = pm.model().var_count();
    if solution.assignment.len() != expected {
        return Err(SequencingError::InconsistentSolution(format!(
            "assignment covers {} of {} model variables",
            solution.assignment.len(),
            expected
        )));
    }

    let n = pm.agent_count();
    let mut positions = Vec::with_capacity(n);
    for i in 0..n {
        let pos: usize = (0..n)
            .filter(|&j| j != i)
            .map(|j| {
                let var = pm.var(j, i).expect("off-diagonal pair variable");
                usize::from(solution.value(var))
            })
            .sum();
        positions.push(pos);
    }

    let mut seen = vec![false; n];
    for (i, &pos) in positions.iter().enumerate() {
        if pos >= n {
            return Err(SequencingError::InconsistentSolution(format!(
                "agent {i} has out-of-range position {pos} (n = {n})"
            )));
        }
        if seen[pos] {
            return Err(SequencingError::InconsistentSolution(format!(
                "position {pos} assigned to more than one agent"
            )));
        }
        seen[pos] = true;
    }

    Ok(positions)
}

/// Decodes a solved assignment into the ordered agent sequence.
///
/// Agents are sorted ascending by position. Should the solver ever hand
/// back tied positions the stable sort keeps the original input order,
/// but a tie fails the permutation check first.
pub fn decode(
    agents: &[String],
    pm: &PrecedenceModel,
    solution: &MilpSolution,
) -> Result<Vec<String>, SequencingError> {
    let positions = decode_positions(pm, solution)?;
    let mut indices: Vec<usize> = (0..agents.len()).collect();
    indices.sort_by_key(|&i| positions[i]);
    Ok(indices.into_iter().map(|i| agents[i].clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milp::{MilpSolution, SolveStatus};
    use std::collections::HashMap;

    fn agents(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    /// Builds an assignment realizing the given order of agent indices.
    fn assignment_for_order(pm: &PrecedenceModel, order: &[usize]) -> MilpSolution {
        let mut rank = vec![0usize; order.len()];
        for (r, &i) in order.iter().enumerate() {
            rank[i] = r;
        }
        let mut assignment = vec![0u8; pm.model().var_count()];
        for i in 0..order.len() {
            for j in 0..order.len() {
                if i != j && rank[i] < rank[j] {
                    assignment[pm.var(i, j).unwrap().index()] = 1;
                }
            }
        }
        MilpSolution {
            status: SolveStatus::Optimal,
            assignment,
            objective_value: None,
            solve_time_ms: 0,
        }
    }

    #[test]
    fn test_decode_realized_order() {
        let ids = agents(&["A", "B", "C"]);
        let pm = PrecedenceModel::build(&ids, &HashMap::new(), &[]).expect("valid input");
        let solution = assignment_for_order(&pm, &[2, 0, 1]);

        let order = decode(&ids, &pm, &solution).expect("consistent");
        assert_eq!(order, agents(&["C", "A", "B"]));

        let positions = decode_positions(&pm, &solution).expect("consistent");
        assert_eq!(positions, vec![1, 2, 0]);
    }

    #[test]
    fn test_decode_single_agent() {
        let ids = agents(&["A"]);
        let pm = PrecedenceModel::build(&ids, &HashMap::new(), &[]).expect("valid input");
        let solution = MilpSolution {
            status: SolveStatus::Optimal,
            assignment: Vec::new(),
            objective_value: Some(0.0),
            solve_time_ms: 0,
        };

        let order = decode(&ids, &pm, &solution).expect("consistent");
        assert_eq!(order, ids);
    }

    #[test]
    fn test_decode_rejects_short_assignment() {
        // A solver handing back fewer values than model variables is a
        // seam fault, reported as an error rather than an index panic.
        let ids = agents(&["A", "B", "C"]);
        let pm = PrecedenceModel::build(&ids, &HashMap::new(), &[]).expect("valid input");
        let solution = MilpSolution {
            status: SolveStatus::Optimal,
            assignment: vec![1, 0],
            objective_value: None,
            solve_time_ms: 0,
        };

        let result = decode_positions(&pm, &solution);
        assert!(matches!(
            result,
            Err(SequencingError::InconsistentSolution(_))
        ));
    }

    #[test]
    fn test_decode_rejects_tied_positions() {
        // All-zero assignment puts every agent at position 0.
        let ids = agents(&["A", "B"]);
        let pm = PrecedenceModel::build(&ids, &HashMap::new(), &[]).expect("valid input");
        let solution = MilpSolution {
            status: SolveStatus::Optimal,
            assignment: vec![0; pm.model().var_count()],
            objective_value: None,
            solve_time_ms: 0,
        };

        let result = decode(&ids, &pm, &solution);
        assert!(matches!(
            result,
            Err(SequencingError::InconsistentSolution(_))
        ));
    }

    #[test]
    fn test_decode_rejects_saturated_assignment() {
        // All-one assignment violates antisymmetry; every agent claims
        // position n-1.
        let ids = agents(&["A", "B", "C"]);
        let pm = PrecedenceModel::build(&ids, &HashMap::new(), &[]).expect("valid input");
        let solution = MilpSolution {
            status: SolveStatus::Optimal,
            assignment: vec![1; pm.model().var_count()],
            objective_value: None,
            solve_time_ms: 0,
        };

        let result = decode_positions(&pm, &solution);
        assert!(matches!(
            result,
            Err(SequencingError::InconsistentSolution(_))
        ));
    }
}

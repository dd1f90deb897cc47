//! MILP model definition.

use super::variables::{BinVar, VarId};

/// Feasibility tolerance for floating-point constraint checks.
pub const FEASIBILITY_EPS: f64 = 1e-6;

/// A linear expression over binary variables: `Σ coeff * var + constant`.
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    /// (variable, coefficient) pairs.
    pub terms: Vec<(VarId, f64)>,
    /// Constant offset.
    pub constant: f64,
}

impl LinExpr {
    /// Creates an empty expression (constant 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an expression from a single term.
    pub fn term(var: VarId, coeff: f64) -> Self {
        Self {
            terms: vec![(var, coeff)],
            constant: 0.0,
        }
    }

    /// Creates an expression summing the given terms.
    pub fn sum(terms: impl IntoIterator<Item = (VarId, f64)>) -> Self {
        Self {
            terms: terms.into_iter().collect(),
            constant: 0.0,
        }
    }

    /// Appends a term to this expression.
    pub fn add_term(&mut self, var: VarId, coeff: f64) {
        self.terms.push((var, coeff));
    }

    /// Evaluates the expression against a 0/1 assignment indexed by [`VarId`].
    pub fn value(&self, assignment: &[u8]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(v, c)| c * f64::from(assignment[v.index()]))
                .sum::<f64>()
    }

    /// Largest variable index referenced, if any.
    fn max_var_index(&self) -> Option<usize> {
        self.terms.iter().map(|&(v, _)| v.index()).max()
    }
}

/// Comparison operator of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `expr <= rhs`
    Le,
    /// `expr >= rhs`
    Ge,
    /// `expr == rhs`
    Eq,
}

/// A linear constraint `expr <op> rhs`.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Left-hand side.
    pub expr: LinExpr,
    /// Comparison operator.
    pub op: CmpOp,
    /// Right-hand side constant.
    pub rhs: f64,
}

impl Constraint {
    /// Creates `expr <= rhs`.
    pub fn le(expr: LinExpr, rhs: f64) -> Self {
        Self {
            expr,
            op: CmpOp::Le,
            rhs,
        }
    }

    /// Creates `expr >= rhs`.
    pub fn ge(expr: LinExpr, rhs: f64) -> Self {
        Self {
            expr,
            op: CmpOp::Ge,
            rhs,
        }
    }

    /// Creates `expr == rhs`.
    pub fn eq(expr: LinExpr, rhs: f64) -> Self {
        Self {
            expr,
            op: CmpOp::Eq,
            rhs,
        }
    }

    /// Whether the constraint holds under the given assignment
    /// (within [`FEASIBILITY_EPS`]).
    pub fn satisfied_by(&self, assignment: &[u8]) -> bool {
        let lhs = self.expr.value(assignment);
        match self.op {
            CmpOp::Le => lhs <= self.rhs + FEASIBILITY_EPS,
            CmpOp::Ge => lhs >= self.rhs - FEASIBILITY_EPS,
            CmpOp::Eq => (lhs - self.rhs).abs() <= FEASIBILITY_EPS,
        }
    }
}

/// Objective function for a MILP model.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize the expression.
    Minimize(LinExpr),
    /// Maximize the expression.
    Maximize(LinExpr),
}

impl Objective {
    /// The underlying expression, regardless of sense.
    pub fn expr(&self) -> &LinExpr {
        match self {
            Objective::Minimize(e) | Objective::Maximize(e) => e,
        }
    }
}

/// A 0-1 integer linear program.
///
/// Contains binary variables, linear constraints, and an optional linear
/// objective. The model is solver-agnostic: it is handed to a
/// [`MilpSolver`](super::MilpSolver) implementation for solving.
///
/// # Examples
///
/// ```
/// use railseq::milp::{Constraint, LinExpr, MilpModel, Objective};
///
/// let mut model = MilpModel::new("cover");
/// let x = model.add_binary("x");
/// let y = model.add_binary("y");
/// model.add_constraint(Constraint::ge(LinExpr::sum([(x, 1.0), (y, 1.0)]), 1.0));
/// model.set_objective(Objective::Minimize(LinExpr::sum([(x, 1.0), (y, 2.0)])));
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MilpModel {
    /// Model name.
    pub name: String,
    /// Binary variables, indexed by [`VarId`].
    pub vars: Vec<BinVar>,
    /// Constraints.
    pub constraints: Vec<Constraint>,
    /// Objective function.
    pub objective: Option<Objective>,
}

impl MilpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Adds a binary variable and returns its handle.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(BinVar::new(name));
        id
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Sets the objective function.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Evaluates the objective under the given assignment, if an
    /// objective is set.
    pub fn objective_value(&self, assignment: &[u8]) -> Option<f64> {
        self.objective.as_ref().map(|o| o.expr().value(assignment))
    }

    /// Validates the model for consistency.
    ///
    /// Checks that every variable referenced by a constraint or the
    /// objective exists, and that all coefficients are finite.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.vars.len();
        for (idx, c) in self.constraints.iter().enumerate() {
            if let Some(max) = c.expr.max_var_index() {
                if max >= n {
                    return Err(format!("constraint {idx} references undefined variable {max}"));
                }
            }
            if !c.rhs.is_finite() || c.expr.terms.iter().any(|&(_, co)| !co.is_finite()) {
                return Err(format!("constraint {idx} has a non-finite coefficient"));
            }
        }
        if let Some(obj) = &self.objective {
            if let Some(max) = obj.expr().max_var_index() {
                if max >= n {
                    return Err(format!("objective references undefined variable {max}"));
                }
            }
            if obj.expr().terms.iter().any(|&(_, co)| !co.is_finite()) {
                return Err("objective has a non-finite coefficient".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milp::VarId;

    #[test]
    fn test_expr_value() {
        let e = LinExpr {
            terms: vec![(VarId(0), 2.0), (VarId(1), 3.0)],
            constant: 1.0,
        };
        assert!((e.value(&[1, 0]) - 3.0).abs() < 1e-12);
        assert!((e.value(&[1, 1]) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_constraint_satisfied() {
        let e = LinExpr::sum([(VarId(0), 1.0), (VarId(1), 1.0)]);
        assert!(Constraint::eq(e.clone(), 1.0).satisfied_by(&[1, 0]));
        assert!(!Constraint::eq(e.clone(), 1.0).satisfied_by(&[1, 1]));
        assert!(Constraint::le(e.clone(), 1.0).satisfied_by(&[0, 0]));
        assert!(Constraint::ge(e, 1.0).satisfied_by(&[1, 1]));
    }

    #[test]
    fn test_model_counts() {
        let mut model = MilpModel::new("test");
        let x = model.add_binary("x");
        let y = model.add_binary("y");
        model.add_constraint(Constraint::eq(LinExpr::sum([(x, 1.0), (y, 1.0)]), 1.0));

        assert_eq!(model.var_count(), 2);
        assert_eq!(model.constraint_count(), 1);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_validate_undefined_variable() {
        let mut model = MilpModel::new("test");
        model.add_binary("x");
        model.add_constraint(Constraint::le(LinExpr::term(VarId(5), 1.0), 1.0));

        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_non_finite_coefficient() {
        let mut model = MilpModel::new("test");
        let x = model.add_binary("x");
        model.set_objective(Objective::Minimize(LinExpr::term(x, f64::NAN)));

        assert!(model.validate().is_err());
    }

    #[test]
    fn test_objective_value() {
        let mut model = MilpModel::new("test");
        let x = model.add_binary("x");
        let y = model.add_binary("y");
        model.set_objective(Objective::Minimize(LinExpr::sum([(x, 2.0), (y, 5.0)])));

        assert_eq!(model.objective_value(&[1, 1]), Some(7.0));
        assert_eq!(MilpModel::new("empty").objective_value(&[]), None);
    }
}

//! Linear expressions and constraints over model variables.

use std::fmt;

/// Handle of a variable in a [`MilpModel`](super::MilpModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in the model (and in solution vectors).
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// `Σ coefᵢ·varᵢ + constant`.
///
/// Terms are kept in insertion order; repeated variables are allowed and
/// summed by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    /// The zero expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// A constant expression.
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// `Σ vars` with unit coefficients.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    /// Appends `coef · var`.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    /// Builder form of [`add_term`](Self::add_term).
    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    /// Adds to the constant part.
    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Appends every term of `other` scaled by `factor`.
    pub fn add_scaled(&mut self, other: &LinearExpr, factor: f64) {
        self.terms
            .extend(other.terms.iter().map(|&(v, c)| (v, c * factor)));
        self.constant += other.constant * factor;
    }

    /// The `(var, coef)` terms.
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// The constant part.
    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    /// Whether the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression at `values` (indexed by [`VarId::index`]).
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }

    /// `self ≤ rhs`.
    pub fn leq(self, rhs: f64) -> LinearConstraint {
        LinearConstraint::new(self, Sense::LessEq, rhs)
    }

    /// `self ≥ rhs`.
    pub fn geq(self, rhs: f64) -> LinearConstraint {
        LinearConstraint::new(self, Sense::GreaterEq, rhs)
    }

    /// `self = rhs`.
    pub fn eq(self, rhs: f64) -> LinearConstraint {
        LinearConstraint::new(self, Sense::Equal, rhs)
    }
}

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    LessEq,
    GreaterEq,
    Equal,
}

/// `expr (≤ | ≥ | =) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Creates a constraint.
    pub fn new(expr: LinearExpr, sense: Sense, rhs: f64) -> Self {
        Self { expr, sense, rhs }
    }

    /// Amount by which `values` break the constraint (0 when satisfied).
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::LessEq => (lhs - self.rhs).max(0.0),
            Sense::GreaterEq => (self.rhs - lhs).max(0.0),
            Sense::Equal => (lhs - self.rhs).abs(),
        }
    }

    /// Whether `values` satisfy the constraint within `tolerance`,
    /// scaled by the magnitude of the right-hand side.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.violation(values) <= tolerance * self.rhs.abs().max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate() {
        let expr = LinearExpr::constant(10.0)
            .with_term(VarId(0), 2.0)
            .with_term(VarId(2), -1.0);
        let values = [1.0, 5.0, 3.0];
        assert!((expr.evaluate(&values) - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_sum_and_scale() {
        let mut expr = LinearExpr::sum([VarId(0), VarId(1)]);
        expr.add_scaled(&LinearExpr::constant(1.0).with_term(VarId(1), 1.0), -2.0);
        let values = [1.0, 1.0];
        // 1 + 1 - 2·(1 + 1)
        assert!((expr.evaluate(&values) - (-2.0)).abs() < 1e-10);
        assert_eq!(expr.terms().len(), 3);
    }

    #[test]
    fn test_constraint_satisfaction() {
        let c = LinearExpr::sum([VarId(0), VarId(1)]).leq(1.0);
        assert!(c.is_satisfied(&[1.0, 0.0], 1e-6));
        assert!(!c.is_satisfied(&[1.0, 1.0], 1e-6));
        assert!((c.violation(&[1.0, 1.0]) - 1.0).abs() < 1e-10);

        let c = LinearExpr::sum([VarId(0)]).geq(1.0);
        assert!(c.is_satisfied(&[0.9999999], 1e-6));
        assert!(!c.is_satisfied(&[0.0], 1e-6));

        let c = LinearExpr::sum([VarId(0)]).eq(2.0);
        assert!(c.is_satisfied(&[2.0], 1e-6));
        assert!(!c.is_satisfied(&[2.5], 1e-6));
    }
}

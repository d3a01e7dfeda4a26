//! Backend-neutral mixed-integer linear model.

use super::expr::{LinearConstraint, LinearExpr, VarId};

/// Domain of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarKind {
    /// `{0, 1}`.
    Binary,
    /// `[lower, upper]`; infinite bounds mean unbounded.
    Continuous { lower: f64, upper: f64 },
}

/// A model variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name: String,
    pub kind: VarKind,
}

/// A constraint tagged with the family it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledConstraint {
    pub label: &'static str,
    pub constraint: LinearConstraint,
}

/// A minimisation objective with its lexicographic priority
/// (higher priority is optimised first).
#[derive(Debug, Clone, PartialEq)]
pub struct PrioritizedObjective {
    pub name: &'static str,
    pub priority: u32,
    pub expression: LinearExpr,
}

/// Variables, labelled constraints, and prioritised objectives.
#[derive(Debug, Clone, Default)]
pub struct MilpModel {
    variables: Vec<VariableDef>,
    constraints: Vec<LabelledConstraint>,
    objectives: Vec<PrioritizedObjective>,
}

impl MilpModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binary variable.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name.into(), VarKind::Binary)
    }

    /// Adds a continuous variable with the given bounds.
    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_variable(name.into(), VarKind::Continuous { lower, upper })
    }

    fn add_variable(&mut self, name: String, kind: VarKind) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VariableDef { name, kind });
        id
    }

    /// Adds a constraint under a family label.
    pub fn add_constraint(&mut self, label: &'static str, constraint: LinearConstraint) {
        self.constraints.push(LabelledConstraint { label, constraint });
    }

    /// Adds a minimisation objective.
    pub fn add_objective(&mut self, name: &'static str, priority: u32, expression: LinearExpr) {
        self.objectives.push(PrioritizedObjective {
            name,
            priority,
            expression,
        });
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn constraints(&self) -> &[LabelledConstraint] {
        &self.constraints
    }

    /// Constraints of one family.
    pub fn constraints_labelled<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a LinearConstraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| c.label == label)
            .map(|c| &c.constraint)
    }

    /// Number of constraints in one family.
    pub fn count_labelled(&self, label: &str) -> usize {
        self.constraints_labelled(label).count()
    }

    /// Objectives from highest to lowest priority (stable for ties).
    pub fn objectives_by_priority(&self) -> Vec<&PrioritizedObjective> {
        let mut objectives: Vec<_> = self.objectives.iter().collect();
        objectives.sort_by(|a, b| b.priority.cmp(&a.priority));
        objectives
    }

    /// Objective by name.
    pub fn objective(&self, name: &str) -> Option<&PrioritizedObjective> {
        self.objectives.iter().find(|o| o.name == name)
    }

    /// First place where `values` leave the model's feasible region:
    /// a bound, integrality, or constraint breach. `None` if feasible.
    pub fn first_violation(&self, values: &[f64], tolerance: f64) -> Option<String> {
        if values.len() != self.variables.len() {
            return Some(format!(
                "expected {} values, got {}",
                self.variables.len(),
                values.len()
            ));
        }
        for (def, &value) in self.variables.iter().zip(values) {
            let ok = match def.kind {
                VarKind::Binary => {
                    (value - value.round()).abs() <= tolerance
                        && (-tolerance..=1.0 + tolerance).contains(&value)
                }
                VarKind::Continuous { lower, upper } => {
                    value.is_finite() && value >= lower - tolerance && value <= upper + tolerance
                }
            };
            if !ok {
                return Some(format!("variable {} = {} is out of its domain", def.name, value));
            }
        }
        self.constraints
            .iter()
            .find(|c| !c.constraint.is_satisfied(values, tolerance))
            .map(|c| format!("{} constraint violated", c.label))
    }
}

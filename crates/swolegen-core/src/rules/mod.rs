//! Semantic rules checked after a workout passes schema validation.
//!
//! Each rule sees the originating plan and the produced workout. A
//! [`RuleSet`] runs every rule and aggregates the failures instead of
//! stopping at the first one.

use std::collections::HashSet;

use thiserror::Error;

use crate::schema::{AnalyzerPlan, SupersetPolicy, Workout};

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub rule: String,
    pub message: String,
}

impl std::fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

/// Every rule a workout violated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("workout violates {} rule(s): {}", .violations.len(), render(.violations))]
pub struct RuleViolations {
    pub violations: Vec<RuleViolation>,
}

fn render(violations: &[RuleViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A business rule over a (plan, workout) pair.
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;

    /// `Err` carries a human-readable reason suitable for a repair prompt.
    fn check(&self, plan: &AnalyzerPlan, workout: &Workout) -> Result<(), String>;
}

/// `none` forbids superset tags, `required` demands at least one.
#[derive(Debug, Default, Clone, Copy)]
pub struct SupersetPolicyRule;

impl Rule for SupersetPolicyRule {
    fn name(&self) -> &str {
        "superset-policy"
    }

    fn check(&self, plan: &AnalyzerPlan, workout: &Workout) -> Result<(), String> {
        let tagged: Vec<&str> = workout.superset_sets().map(|s| s.id.as_str()).collect();
        match plan.meta.superset_policy {
            SupersetPolicy::None if !tagged.is_empty() => Err(format!(
                "plan policy is none but {} set(s) carry a superset tag ({})",
                tagged.len(),
                tagged.join(", ")
            )),
            SupersetPolicy::Required if tagged.is_empty() => {
                Err("plan policy is required but no set carries a superset tag".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnitsMatchRule;

impl Rule for UnitsMatchRule {
    fn name(&self) -> &str {
        "units-match"
    }

    fn check(&self, plan: &AnalyzerPlan, workout: &Workout) -> Result<(), String> {
        if plan.meta.units != workout.meta.units {
            return Err(format!(
                "workout uses {} but the plan uses {}",
                workout.meta.units, plan.meta.units
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UniqueSetIdsRule;

impl Rule for UniqueSetIdsRule {
    fn name(&self) -> &str {
        "unique-set-ids"
    }

    fn check(&self, _plan: &AnalyzerPlan, workout: &Workout) -> Result<(), String> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for set in &workout.sets {
            if !seen.insert(set.id.as_str()) && !dupes.contains(&set.id.as_str()) {
                dupes.push(set.id.as_str());
            }
        }
        if dupes.is_empty() {
            Ok(())
        } else {
            Err(format!("duplicate set id(s): {}", dupes.join(", ")))
        }
    }
}

/// An ordered collection of rules.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// No rules; every workout passes.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self::empty()
            .with(SupersetPolicyRule)
            .with(UnitsMatchRule)
            .with(UniqueSetIdsRule)
    }

    pub fn with(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule; all failures are reported together.
    pub fn evaluate(&self, plan: &AnalyzerPlan, workout: &Workout) -> Result<(), RuleViolations> {
        let violations: Vec<RuleViolation> = self
            .rules
            .iter()
            .filter_map(|rule| {
                rule.check(plan, workout).err().map(|message| RuleViolation {
                    rule: rule.name().to_string(),
                    message,
                })
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(RuleViolations { violations })
        }
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.names()).finish()
    }
}

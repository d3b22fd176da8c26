//! Exercise definitions - stages and the rep cycle

use forma_core::{FormaError, FormaResult};

use crate::AngleRule;

/// Named milestone in an exercise's movement cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    /// Rules in declaration order
    pub rules: Vec<AngleRule>,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Builder-style rule append
    pub fn rule(mut self, rule: AngleRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn get_rule(&self, name: &str) -> Option<&AngleRule> {
        self.rules.iter().find(|r| r.name == name)
    }
}

/// Stage transition that completes one repetition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepCycle {
    pub from: String,
    pub to: String,
}

impl RepCycle {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    #[inline]
    pub fn completes(&self, from: &str, to: &str) -> bool {
        self.from == from && self.to == to
    }
}

/// A complete exercise: ordered stages plus optional rep counting
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseDefinition {
    pub name: String,
    pub stages: Vec<Stage>,
    pub rep_cycle: Option<RepCycle>,
}

impl ExerciseDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            rep_cycle: None,
        }
    }

    /// Builder-style stage append
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Builder-style rep cycle
    pub fn reps(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rep_cycle = Some(RepCycle::new(from, to));
        self
    }

    pub fn get_stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Stage lookup that surfaces a missing stage as `NotFound`
    pub fn stage_named(&self, name: &str) -> FormaResult<&Stage> {
        self.get_stage(name)
            .ok_or_else(|| FormaError::NotFound(format!("{}/{}", self.name, name)))
    }

    /// Iterate over every rule of every stage
    pub fn rules(&self) -> impl Iterator<Item = (&Stage, &AngleRule)> {
        self.stages
            .iter()
            .flat_map(|stage| stage.rules.iter().map(move |rule| (stage, rule)))
    }

    /// Default cycle for exercises with `down` and `up` stages
    pub(crate) fn infer_rep_cycle(&mut self) {
        if self.rep_cycle.is_none() && self.get_stage("down").is_some() && self.get_stage("up").is_some() {
            self.rep_cycle = Some(RepCycle::new("down", "up"));
        }
    }

    /// Structural checks; run once at catalog load
    pub(crate) fn validate(&self) -> FormaResult<()> {
        if self.name.trim().is_empty() {
            return Err(FormaError::malformed_exercise(&self.name, "empty exercise name"));
        }
        if self.stages.is_empty() {
            return Err(FormaError::malformed_exercise(&self.name, "no stages"));
        }

        for (i, stage) in self.stages.iter().enumerate() {
            if self.stages[..i].iter().any(|s| s.name == stage.name) {
                return Err(FormaError::malformed_rule(
                    &self.name,
                    &stage.name,
                    "*",
                    "duplicate stage name",
                ));
            }
            if stage.rules.is_empty() {
                return Err(FormaError::malformed_rule(&self.name, &stage.name, "*", "no rules"));
            }
            for (j, rule) in stage.rules.iter().enumerate() {
                if stage.rules[..j].iter().any(|r| r.name == rule.name) {
                    return Err(FormaError::malformed_rule(
                        &self.name,
                        &stage.name,
                        &rule.name,
                        "duplicate rule name",
                    ));
                }
                if let Some(defect) = rule.angle.defect() {
                    return Err(FormaError::malformed_rule(&self.name, &stage.name, &rule.name, defect));
                }
                if rule.p1 == rule.p2 || rule.p2 == rule.p3 {
                    return Err(FormaError::malformed_rule(
                        &self.name,
                        &stage.name,
                        &rule.name,
                        "vertex joint repeated",
                    ));
                }
            }
        }

        if let Some(cycle) = &self.rep_cycle {
            for stage in [&cycle.from, &cycle.to] {
                if self.get_stage(stage).is_none() {
                    return Err(FormaError::malformed_exercise(
                        &self.name,
                        format!("rep cycle references missing stage '{}'", stage),
                    ));
                }
            }
            if cycle.from == cycle.to {
                return Err(FormaError::malformed_exercise(
                    &self.name,
                    "rep cycle needs two distinct stages",
                ));
            }
        }

        Ok(())
    }
}

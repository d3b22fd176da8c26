//! Catalog configuration format
//!
//! ```json
//! {
//!   "SQUAT": {
//!     "stages": {
//!       "down": {
//!         "rules": {
//!           "knee": {
//!             "p1": "left_hip", "p2": "left_knee", "p3": "left_ankle",
//!             "angle": { "min": 70, "max": 110 },
//!             "feedback": "You're not going low enough. Try to break parallel."
//!           }
//!         }
//!       }
//!     },
//!     "rep": { "from": "down", "to": "up" }
//!   }
//! }
//! ```
//!
//! Object key order is significant (it is the rule declaration order), so maps
//! are read into ordered entry lists. Duplicate keys are kept and rejected by
//! validation with a precise location.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use forma_core::{FormaError, FormaResult, Joint};

use crate::{AngleRule, ExerciseDefinition, RepCycle, Stage};

/// JSON object read as entries in document order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawAngle {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRule {
    pub p1: String,
    pub p2: String,
    pub p3: String,
    pub angle: RawAngle,
    pub feedback: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStage {
    pub rules: OrderedMap<RawRule>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRepCycle {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawExercise {
    pub stages: OrderedMap<RawStage>,
    #[serde(default)]
    pub rep: Option<RawRepCycle>,
}

/// Top-level document: exercise name -> exercise
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(transparent)]
pub struct RawCatalog(pub OrderedMap<RawExercise>);

impl RawCatalog {
    pub fn parse(json: &str) -> FormaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve joint names into typed definitions
    pub fn into_definitions(self) -> FormaResult<Vec<ExerciseDefinition>> {
        let RawCatalog(OrderedMap(entries)) = self;
        entries
            .into_iter()
            .map(|(name, raw)| raw.into_definition(name))
            .collect()
    }
}

impl RawExercise {
    fn into_definition(self, name: String) -> FormaResult<ExerciseDefinition> {
        let mut definition = ExerciseDefinition::new(name);

        for (stage_name, raw_stage) in self.stages.0 {
            let mut stage = Stage::new(stage_name);
            for (rule_name, raw_rule) in raw_stage.rules.0 {
                let joint = |field: &str| {
                    field.parse::<Joint>().map_err(|_| {
                        FormaError::malformed_rule(
                            &definition.name,
                            &stage.name,
                            &rule_name,
                            format!("unknown joint '{}'", field),
                        )
                    })
                };
                let joints = [
                    joint(&raw_rule.p1)?,
                    joint(&raw_rule.p2)?,
                    joint(&raw_rule.p3)?,
                ];
                stage.rules.push(AngleRule::new(
                    rule_name,
                    joints,
                    raw_rule.angle.min,
                    raw_rule.angle.max,
                    raw_rule.feedback,
                ));
            }
            definition.stages.push(stage);
        }

        definition.rep_cycle = self.rep.map(|r| RepCycle::new(r.from, r.to));
        Ok(definition)
    }
}

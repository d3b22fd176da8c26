//! Exercise catalog - the immutable registry of exercise definitions

use std::collections::HashMap;
use std::path::Path;

use forma_core::{FormaError, FormaResult};

use crate::raw::RawCatalog;
use crate::{builtin, canonical_name, ExerciseDefinition};

/// Validated, read-only mapping from exercise name to definition.
///
/// Iteration follows registration order; the identifier relies on it for
/// deterministic tie-breaking.
#[derive(Debug, Clone)]
pub struct ExerciseCatalog {
    exercises: Vec<ExerciseDefinition>,
    index: HashMap<String, usize>,
}

impl ExerciseCatalog {
    /// Validate and register definitions in the given order
    pub fn from_definitions(definitions: Vec<ExerciseDefinition>) -> FormaResult<Self> {
        let mut exercises = Vec::with_capacity(definitions.len());
        let mut index = HashMap::with_capacity(definitions.len());

        for mut definition in definitions {
            definition.infer_rep_cycle();
            definition.validate()?;
            if index.contains_key(&definition.name) {
                return Err(FormaError::malformed_exercise(
                    &definition.name,
                    "duplicate exercise name",
                ));
            }
            index.insert(definition.name.clone(), exercises.len());
            exercises.push(definition);
        }

        tracing::debug!(
            exercises = exercises.len(),
            rules = exercises.iter().map(|e| e.rules().count()).sum::<usize>(),
            "exercise catalog loaded"
        );

        Ok(ExerciseCatalog { exercises, index })
    }

    /// Bundled exercises
    pub fn builtin() -> FormaResult<Self> {
        Self::from_definitions(builtin::definitions())
    }

    /// Load from the JSON configuration format
    pub fn from_json(json: &str) -> FormaResult<Self> {
        Self::from_definitions(RawCatalog::parse(json)?.into_definitions()?)
    }

    /// Load from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> FormaResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Definition by catalog key or display name
    pub fn get(&self, name: &str) -> Option<&ExerciseDefinition> {
        self.index
            .get(name)
            .or_else(|| self.index.get(&canonical_name(name)))
            .map(|&i| &self.exercises[i])
    }

    /// Definition by name, `NotFound` if absent
    pub fn lookup(&self, name: &str) -> FormaResult<&ExerciseDefinition> {
        self.get(name)
            .ok_or_else(|| FormaError::NotFound(format!("exercise '{}'", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Exercise names in registration order
    pub fn list(&self) -> impl Iterator<Item = &str> {
        self.exercises.iter().map(|e| e.name.as_str())
    }

    /// Definitions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ExerciseDefinition> {
        self.exercises.iter()
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

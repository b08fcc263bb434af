use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use grader::Exercise;

/// An exercise pack file: `[[exercise]]` tables plus optional level info.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExercisePack {
    #[serde(rename = "exercise", default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub levels: BTreeMap<String, Level>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Level {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ExercisePack {
    pub fn load(path: &Path) -> Result<ExercisePack, String> {
        let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        let pack: ExercisePack = toml::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))?;
        for exercise in &pack.exercises {
            exercise.validate().map_err(|e| format!("{}: {}", path.display(), e))?;
        }
        tracing::debug!(path = %path.display(), exercises = pack.exercises.len(), "loaded exercise pack");
        Ok(pack)
    }

    /// Exercises of `level`, in file order; all of them for `None`.
    pub fn filtered(&self, level: Option<&str>) -> Vec<Exercise> {
        self.exercises
            .iter()
            .filter(|e| level.is_none_or(|level| e.level == level))
            .cloned()
            .collect()
    }

    pub fn find(&self, id: u32) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }
}

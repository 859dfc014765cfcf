//! Loaded static models and the loader collaborator

use std::collections::HashMap;
use std::path::{Component as PathComponent, Path, PathBuf};

use thiserror::Error;

use crate::component::ingress::parse_records;
use crate::component::Component;

/// Errors that can occur while loading a referenced model
#[derive(Debug, Error)]
pub enum LoadError {
    /// No model with this id is known to the loader
    #[error("static model not found: {model_id}")]
    NotFound { model_id: String },

    /// Error reading a model file
    #[error("error reading static model file {path}: {message}")]
    FileReadError { path: PathBuf, message: String },

    /// The model document is not a component list
    #[error("invalid static model {model_id}: {message}")]
    InvalidDocument { model_id: String, message: String },
}

/// Source of referenced model contents.
///
/// The engine asks for each distinct model id at most once per session;
/// deduplicating concurrent requests for the same id is the loader's job.
pub trait StaticModelLoader {
    fn load(&mut self, model_id: &str) -> Result<Vec<Component>, LoadError>;
}

/// Raw component lists of the models loaded so far, keyed by model id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedModels {
    models: HashMap<String, Vec<Component>>,
}

impl LoadedModels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the contents of a model
    pub fn insert(&mut self, model_id: impl Into<String>, components: Vec<Component>) {
        self.models.insert(model_id.into(), components);
    }

    /// Builder-style [`LoadedModels::insert`]
    pub fn with_model(mut self, model_id: impl Into<String>, components: Vec<Component>) -> Self {
        self.insert(model_id, components);
        self
    }

    pub fn get(&self, model_id: &str) -> Option<&[Component]> {
        self.models.get(model_id).map(|c| c.as_slice())
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.models.contains_key(model_id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Ids of all loaded models
    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(|s| s.as_str())
    }
}

impl StaticModelLoader for LoadedModels {
    fn load(&mut self, model_id: &str) -> Result<Vec<Component>, LoadError> {
        self.models
            .get(model_id)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                model_id: model_id.to_string(),
            })
    }
}

/// Loads `<base>/<model_id>.json` files holding component record arrays
#[derive(Debug, Clone)]
pub struct ModelDirectory {
    base_path: PathBuf,
}

impl ModelDirectory {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// File holding the given model. `None` for ids that would leave the
    /// base directory.
    pub fn resolve_path(&self, model_id: &str) -> Option<PathBuf> {
        let relative = Path::new(model_id);
        let contained = !model_id.is_empty()
            && relative
                .components()
                .all(|part| matches!(part, PathComponent::Normal(_)));
        contained.then(|| self.base_path.join(format!("{}.json", model_id)))
    }
}

impl StaticModelLoader for ModelDirectory {
    fn load(&mut self, model_id: &str) -> Result<Vec<Component>, LoadError> {
        let path = match self.resolve_path(model_id) {
            Some(path) if path.exists() => path,
            Some(_) => {
                return Err(LoadError::NotFound {
                    model_id: model_id.to_string(),
                })
            }
            None => {
                tracing::warn!(model_id, "model id escapes the model directory");
                return Err(LoadError::NotFound {
                    model_id: model_id.to_string(),
                });
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| LoadError::FileReadError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let batch = parse_records(&content).map_err(|e| LoadError::InvalidDocument {
            model_id: model_id.to_string(),
            message: e.to_string(),
        })?;

        for err in &batch.errors {
            tracing::warn!(model_id, %err, "skipping record in static model");
        }

        Ok(batch.components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loaded_models_as_loader() {
        let mut models =
            LoadedModels::new().with_model("m1", vec![Component::stock("s1", 0.0, 0.0, "A")]);
        assert_eq!(models.load("m1").unwrap().len(), 1);
        assert!(matches!(
            models.load("missing"),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_path() {
        let dir = ModelDirectory::new("/models");
        assert_eq!(
            dir.resolve_path("library/growth"),
            Some(PathBuf::from("/models/library/growth.json"))
        );
        assert_eq!(dir.resolve_path("./growth"), None);
        assert_eq!(dir.resolve_path("../growth"), None);
        assert_eq!(dir.resolve_path("library/../../growth"), None);
        assert_eq!(dir.resolve_path("/etc/growth"), None);
        assert_eq!(dir.resolve_path(""), None);
    }

    #[test]
    fn test_escaping_id_is_not_found() {
        let base = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/models");
        let mut dir = ModelDirectory::new(base);
        assert!(dir.load("growth").is_ok());
        // Same file, reached through the parent
        assert!(matches!(
            dir.load("../models/growth"),
            Err(LoadError::NotFound { model_id }) if model_id == "../models/growth"
        ));
    }

    #[test]
    fn test_directory_missing_file() {
        let mut dir = ModelDirectory::new("/nonexistent-model-dir");
        assert!(matches!(dir.load("m1"), Err(LoadError::NotFound { .. })));
    }
}

//! Turning source text into live definitions
//!
//! Compiling arbitrary participant code is out of process; a
//! [`DefinitionLoader`] is the boundary where a contract instance comes back.
pub mod builtins;
pub mod recipe;

pub use builtins::{builtin, BobbingSphere, RotatingCube, WireframeBlob, BUILTIN_NAMES};
pub use recipe::{Animation, Recipe, RecipeLoader};

use crate::error::{HarnessError, HarnessResult};
use crate::traits::{AnimationContract, UserDefinition};

/// "Compile text into a contract instance" service
pub trait DefinitionLoader {
    fn load(&mut self, source: &str) -> HarnessResult<Box<dyn AnimationContract>>;
}

/// Built-in names, or a JSON recipe when the text is an object
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceLoader {
    recipes: RecipeLoader,
}

impl DefinitionLoader for SourceLoader {
    fn load(&mut self, source: &str) -> HarnessResult<Box<dyn AnimationContract>> {
        let trimmed = source.trim();
        if trimmed.starts_with('{') {
            return self.recipes.load(trimmed);
        }
        builtin(trimmed).ok_or_else(|| {
            HarnessError::definition(format!(
                "unknown definition '{}' (expected a recipe or one of {})",
                trimmed,
                BUILTIN_NAMES.join(", ")
            ))
        })
    }
}

/// Version counter over the editor's source text
///
/// Every change of the text bumps the version, identical text does not.
/// A failed load keeps the bumped version, so the same broken text is not
/// reloaded, while the live generation stays as it is.
#[derive(Debug)]
pub struct SourceTracker<L: DefinitionLoader> {
    loader: L,
    version: u64,
    source: Option<String>,
}

impl<L: DefinitionLoader> SourceTracker<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            version: 0,
            source: None,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Text as last seen
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// `Ok(None)` when the text is unchanged
    pub fn update(&mut self, source: &str) -> HarnessResult<Option<UserDefinition>> {
        if self.source.as_deref() == Some(source) {
            return Ok(None);
        }
        self.source = Some(source.to_string());
        self.version += 1;

        let contract = self.loader.load(source)?;
        log::debug!("loaded '{}' as v{}", contract.name(), self.version);
        Ok(Some(UserDefinition::new(self.version, contract)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_keeps_version() {
        let mut tracker = SourceTracker::new(SourceLoader::default());

        let first = tracker.update("rotating-cube").unwrap().unwrap();
        assert_eq!(first.version(), 1);
        assert!(tracker.update("rotating-cube").unwrap().is_none());

        let second = tracker.update("bobbing-sphere").unwrap().unwrap();
        assert_eq!(second.version(), 2);
        assert_eq!(second.name(), "bobbing-sphere");
    }

    #[test]
    fn test_whitespace_change_is_a_new_version() {
        let mut tracker = SourceTracker::new(SourceLoader::default());
        tracker.update("wireframe-blob").unwrap();
        let again = tracker.update("wireframe-blob\n").unwrap().unwrap();
        assert_eq!(again.version(), 2);
    }

    #[test]
    fn test_load_error_is_reported_once() {
        let mut tracker = SourceTracker::new(SourceLoader::default());
        assert!(matches!(tracker.update("teapot"), Err(HarnessError::Definition(_))));
        assert!(tracker.update("teapot").unwrap().is_none());
        assert_eq!(tracker.version(), 1);
    }

    #[test]
    fn test_recipe_source() {
        let mut loader = SourceLoader::default();
        let contract = loader
            .load(r#" { "name": "dot", "shape": { "type": "sphere", "radius": 0.5, "width_segments": 8, "height_segments": 4 } }"#)
            .unwrap();
        assert_eq!(contract.name(), "dot");
    }
}

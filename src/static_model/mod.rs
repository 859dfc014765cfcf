//! Static models: reusable sub-diagrams embedded by reference
//!
//! A static model reference names another diagram by id. Its contents are
//! loaded through a [`StaticModelLoader`], kept in [`LoadedModels`], and
//! expanded under the reference with namespaced ids and translated positions.

mod expand;
mod registry;

pub use expand::{expand, translate, Expansion, MAX_NESTING_DEPTH};
pub(crate) use expand::expand_in;
pub use registry::{LoadError, LoadedModels, ModelDirectory, StaticModelLoader};

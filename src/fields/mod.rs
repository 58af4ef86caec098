//!
//! fieldstore fields module
//! ------------------------
//! Lazy, tree-structured field storage for array-backed catalogs. A
//! `FieldContainer` maps names to materialized arrays, nested containers
//! (particle-type groups and the like) and pending recipes. Reading a name that
//! only has a recipe runs the recipe's generator against the container, caches
//! the result and returns it.
//!
//! Key responsibilities:
//! - Lookup precedence: alias (one hop), child container, materialized field, recipe.
//! - Recipe argument binding against per-tree default settings.
//! - Recipe registration onto one, several or all child containers.
//! - Merging container trees and projecting fields into a polars `DataFrame`.

mod container;
mod dataframe;
mod merge;
mod recipe;
mod registration;

pub use container::{ContainerOptions, FieldContainer, DEFAULT_INTERNAL_NAMES};
pub use recipe::{DerivedFieldRecipe, FieldKind, FieldRecipe, Generator, ParamSpec, RecipeArgs, RecipeDefaults, RecipeParams, RecipeSource};
pub use registration::{FieldRegistration, RecipeTarget};

use crate::array::FieldArray;
use crate::error::{FieldError, FieldResult};

/// A value that can be stored under a name in a container.
#[derive(Clone, Debug)]
pub enum FieldEntry {
    Array(FieldArray),
    Container(FieldContainer),
    Recipe(FieldRecipe),
}

impl From<FieldArray> for FieldEntry {
    fn from(a: FieldArray) -> Self { FieldEntry::Array(a) }
}

impl From<FieldContainer> for FieldEntry {
    fn from(c: FieldContainer) -> Self { FieldEntry::Container(c) }
}

impl From<FieldRecipe> for FieldEntry {
    fn from(r: FieldRecipe) -> Self { FieldEntry::Recipe(r) }
}

impl From<DerivedFieldRecipe> for FieldEntry {
    fn from(r: DerivedFieldRecipe) -> Self { FieldEntry::Recipe(r.into()) }
}

/// Result of a lookup: an array handle or a borrowed child container.
#[derive(Debug)]
pub enum Resolved<'a> {
    Array(FieldArray),
    Container(&'a FieldContainer),
}

impl<'a> Resolved<'a> {
    pub fn into_array(self, key: &str) -> FieldResult<FieldArray> {
        match self {
            Resolved::Array(a) => Ok(a),
            Resolved::Container(_) => Err(FieldError::type_mismatch(format!("'{}' is a container, not a field", key))),
        }
    }

    pub fn as_array(&self) -> Option<&FieldArray> {
        match self {
            Resolved::Array(a) => Some(a),
            Resolved::Container(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&'a FieldContainer> {
        match self {
            Resolved::Container(c) => Some(*c),
            Resolved::Array(_) => None,
        }
    }

    pub fn is_container(&self) -> bool { matches!(self, Resolved::Container(_)) }
}

/// Per-call lookup behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LookupOptions {
    /// Skip materialized values and re-run the recipe.
    pub force_derived: bool,
    /// Write recipe results back into the container.
    pub cache: bool,
    /// When false, a key backed only by a recipe is an error.
    pub allow_derived: bool,
}

impl Default for LookupOptions {
    fn default() -> Self { Self { force_derived: false, cache: true, allow_derived: true } }
}

impl LookupOptions {
    pub fn forced() -> Self { Self { force_derived: true, ..Self::default() } }
    pub fn uncached() -> Self { Self { cache: false, ..Self::default() } }
    pub fn stored_only() -> Self { Self { allow_derived: false, ..Self::default() } }
}

/// Which buckets `keys` enumerates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyFilter {
    pub fields: bool,
    pub recipes: bool,
    pub containers: bool,
    /// Include reserved internal names such as `uid`.
    pub internal: bool,
}

impl Default for KeyFilter {
    fn default() -> Self { Self { fields: true, recipes: true, containers: true, internal: false } }
}

impl KeyFilter {
    pub fn without_containers() -> Self { Self { containers: false, ..Self::default() } }
    pub fn without_recipes() -> Self { Self { recipes: false, ..Self::default() } }
    pub fn with_internal(self) -> Self { Self { internal: true, ..self } }
}

/// Mapping-style access to a node of a field tree.
pub trait FieldMapping {
    fn get_entry(&mut self, key: &str) -> FieldResult<Resolved<'_>>;
    fn set(&mut self, key: &str, value: FieldEntry);
    fn remove(&mut self, key: &str) -> FieldResult<()>;
    fn keys(&self, filter: KeyFilter) -> Vec<String>;
    fn contains_key(&self, key: &str) -> bool;

    fn len(&self) -> usize { self.keys(KeyFilter::default()).len() }
    fn is_empty(&self) -> bool { self.len() == 0 }
}

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::array::FieldArray;
use crate::error::{FieldError, FieldResult};
use super::container::FieldContainer;
use super::recipe::{DerivedFieldRecipe, FieldRecipe, Generator, RecipeArgs, RecipeParams};

/// Where a registered recipe is inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RecipeTarget {
    /// The registering container itself.
    #[default]
    Own,
    Child(String),
    Children(Vec<String>),
    /// Every child container present at registration time.
    AllChildren,
}

impl From<&str> for RecipeTarget {
    fn from(s: &str) -> Self {
        if s == "all" { RecipeTarget::AllChildren } else { RecipeTarget::Child(s.to_string()) }
    }
}

impl From<Vec<String>> for RecipeTarget {
    fn from(v: Vec<String>) -> Self { RecipeTarget::Children(v) }
}

impl From<&[&str]> for RecipeTarget {
    fn from(v: &[&str]) -> Self { RecipeTarget::Children(v.iter().map(|s| s.to_string()).collect()) }
}

/// Pending registration returned by `FieldContainer::register_field`.
///
/// Nothing is inserted until `generator` is called.
pub struct FieldRegistration<'a> {
    container: &'a mut FieldContainer,
    target: RecipeTarget,
    name: Option<String>,
    description: String,
    units: Option<String>,
    params: RecipeParams,
}

impl<'a> FieldRegistration<'a> {
    pub fn name(mut self, name: &str) -> Self { self.name = Some(name.to_string()); self }
    pub fn description(mut self, description: &str) -> Self { self.description = description.to_string(); self }
    pub fn units(mut self, units: &str) -> Self { self.units = Some(units.to_string()); self }

    /// Declare a setting taken from the container defaults when present.
    pub fn param(mut self, name: &str) -> Self { self.params = self.params.param(name); self }
    pub fn param_with_default(mut self, name: &str, default: Value) -> Self { self.params = self.params.param_with_default(name, default); self }
    /// Also receive every container default the generator did not declare.
    pub fn accept_extra(mut self) -> Self { self.params = self.params.accept_extra(); self }
    pub fn params(mut self, params: RecipeParams) -> Self { self.params = params; self }

    /// Insert a derived recipe built from `f` into every target container.
    ///
    /// Without an explicit name, the generator's function name becomes the
    /// field name; closures have none and are rejected.
    pub fn generator<F>(self, f: F) -> FieldResult<()>
    where
        F: Fn(&mut FieldContainer, &RecipeArgs) -> FieldResult<FieldArray> + Send + Sync + 'static,
    {
        let name = match self.name {
            Some(n) => n,
            None => generator_name::<F>().ok_or_else(|| FieldError::invalid_recipe("closure generators need an explicit field name"))?,
        };
        let generator: Generator = Arc::new(f);
        let recipe: FieldRecipe = DerivedFieldRecipe::from_generator(&name, generator)
            .with_description(&self.description)
            .with_units(self.units.as_deref())
            .with_params(self.params)
            .into();

        let container = self.container;
        let keys: Vec<String> = match &self.target {
            RecipeTarget::Own => {
                debug!(target: "fieldstore::fields", container=?container.name(), field=%name, "register_field");
                container.recipes_mut().insert(name, recipe);
                return Ok(());
            }
            RecipeTarget::Child(c) => vec![c.clone()],
            RecipeTarget::Children(cs) => cs.clone(),
            RecipeTarget::AllChildren => container.containers().keys().cloned().collect(),
        };
        if let Some(missing) = keys.iter().find(|k| !container.containers().contains_key(k.as_str())) {
            return Err(FieldError::not_found(missing.clone()));
        }
        debug!(target: "fieldstore::fields", container=?container.name(), field=%name, targets=?keys, "register_field");
        for k in keys {
            if let Some(child) = container.containers_mut().get_mut(&k) {
                child.recipes_mut().insert(name.clone(), recipe.clone());
            }
        }
        Ok(())
    }
}

impl FieldContainer {
    /// Start registering a derived field on `target`.
    pub fn register_field<T: Into<RecipeTarget>>(&mut self, target: T) -> FieldRegistration<'_> {
        FieldRegistration {
            container: self,
            target: target.into(),
            name: None,
            description: String::new(),
            units: None,
            params: RecipeParams::default(),
        }
    }
}

/// Last path segment of a function item's type name.
fn generator_name<F>() -> Option<String> {
    let full = std::any::type_name::<F>();
    let base = full.split('<').next().unwrap_or(full);
    let last = base.rsplit("::").next().unwrap_or(base);
    if last.is_empty() || last.contains('{') || last.contains('}') {
        return None;
    }
    Some(last.to_string())
}

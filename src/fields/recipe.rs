//! Field recipes and recipe argument binding.
//!
//! A recipe is an immutable description of how to obtain a field that is not
//! materialized yet: either a generator run against the owning container, or a
//! precomputed array. Generators declare the named settings they consume via
//! `RecipeParams`; the container binds them against its `RecipeDefaults` at
//! evaluation time and passes the result as `RecipeArgs`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::array::FieldArray;
use crate::error::{FieldError, FieldResult};
use super::container::FieldContainer;

/// Generator signature shared by every derived recipe.
pub type Generator = Arc<dyn Fn(&mut FieldContainer, &RecipeArgs) -> FieldResult<FieldArray> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Computed internally (bookkeeping such as unique ids).
    Internal,
    /// Loaded from storage by an I/O layer.
    Stored,
    /// Computed from other fields.
    Derived,
}

#[derive(Clone)]
pub enum RecipeSource {
    Generator(Generator),
    Precomputed(FieldArray),
}

impl fmt::Debug for RecipeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeSource::Generator(_) => f.write_str("Generator(..)"),
            RecipeSource::Precomputed(a) => write!(f, "Precomputed(shape={:?})", a.shape()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldRecipe {
    name: String,
    kind: FieldKind,
    source: RecipeSource,
    description: String,
    units: Option<String>,
    params: RecipeParams,
}

impl FieldRecipe {
    /// Exactly one of `generator` and `precomputed` must be given.
    pub fn new(name: &str, kind: FieldKind, generator: Option<Generator>, precomputed: Option<FieldArray>) -> FieldResult<Self> {
        let source = match (generator, precomputed) {
            (Some(g), None) => RecipeSource::Generator(g),
            (None, Some(a)) => RecipeSource::Precomputed(a),
            (None, None) => return Err(FieldError::invalid_recipe(format!("recipe '{}' needs either a generator or a precomputed array", name))),
            (Some(_), Some(_)) => return Err(FieldError::invalid_recipe(format!("recipe '{}' cannot have both a generator and a precomputed array", name))),
        };
        Ok(Self { name: name.to_string(), kind, source, description: String::new(), units: None, params: RecipeParams::default() })
    }

    pub fn with_description(mut self, description: &str) -> Self { self.description = description.to_string(); self }
    pub fn with_units(mut self, units: Option<&str>) -> Self { self.units = units.map(str::to_string); self }
    pub fn with_params(mut self, params: RecipeParams) -> Self { self.params = params; self }

    pub fn name(&self) -> &str { &self.name }
    pub fn kind(&self) -> FieldKind { self.kind }
    pub fn source(&self) -> &RecipeSource { &self.source }
    pub fn description(&self) -> &str { &self.description }
    pub fn units(&self) -> Option<&str> { self.units.as_deref() }
    pub fn params(&self) -> &RecipeParams { &self.params }
    pub fn is_derived(&self) -> bool { self.kind == FieldKind::Derived }
}

/// A recipe of kind `Derived` backed by a generator.
#[derive(Clone, Debug)]
pub struct DerivedFieldRecipe(FieldRecipe);

impl DerivedFieldRecipe {
    pub fn new<F>(name: &str, f: F) -> Self
    where
        F: Fn(&mut FieldContainer, &RecipeArgs) -> FieldResult<FieldArray> + Send + Sync + 'static,
    {
        Self::from_generator(name, Arc::new(f))
    }

    pub fn from_generator(name: &str, generator: Generator) -> Self {
        DerivedFieldRecipe(FieldRecipe {
            name: name.to_string(),
            kind: FieldKind::Derived,
            source: RecipeSource::Generator(generator),
            description: String::new(),
            units: None,
            params: RecipeParams::default(),
        })
    }

    pub fn with_description(self, description: &str) -> Self { DerivedFieldRecipe(self.0.with_description(description)) }
    pub fn with_units(self, units: Option<&str>) -> Self { DerivedFieldRecipe(self.0.with_units(units)) }
    pub fn with_params(self, params: RecipeParams) -> Self { DerivedFieldRecipe(self.0.with_params(params)) }

    pub fn recipe(&self) -> &FieldRecipe { &self.0 }
    pub fn into_recipe(self) -> FieldRecipe { self.0 }
}

impl From<DerivedFieldRecipe> for FieldRecipe {
    fn from(r: DerivedFieldRecipe) -> Self { r.0 }
}

/// One named setting a generator consumes.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    /// `None` means "no default": the container's default of the same name is used if present.
    pub default: Option<Value>,
}

/// Named settings a generator declares, and whether it takes every other default too.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecipeParams {
    declared: Vec<ParamSpec>,
    accepts_extra: bool,
}

impl RecipeParams {
    pub fn new() -> Self { Self::default() }

    pub fn param(mut self, name: &str) -> Self {
        self.declared.push(ParamSpec { name: name.to_string(), default: None });
        self
    }

    pub fn param_with_default(mut self, name: &str, default: Value) -> Self {
        self.declared.push(ParamSpec { name: name.to_string(), default: Some(default) });
        self
    }

    pub fn accept_extra(mut self) -> Self { self.accepts_extra = true; self }

    pub fn declared(&self) -> &[ParamSpec] { &self.declared }
    pub fn accepts_extra(&self) -> bool { self.accepts_extra }
    pub fn is_declared(&self, name: &str) -> bool { self.declared.iter().any(|p| p.name == name) }

    /// Resolve declared parameters against container defaults.
    ///
    /// Unset parameters pick up the default of the same name; parameters with
    /// their own default keep it. With `accepts_extra`, every undeclared
    /// container default is passed as well.
    pub fn bind(&self, defaults: &RecipeDefaults) -> RecipeArgs {
        let mut values: BTreeMap<String, Value> = BTreeMap::new();
        for p in &self.declared {
            match &p.default {
                Some(v) => { values.insert(p.name.clone(), v.clone()); }
                None => {
                    if let Some(v) = defaults.get(&p.name) { values.insert(p.name.clone(), v.clone()); }
                }
            }
        }
        if self.accepts_extra {
            for (k, v) in defaults.iter() {
                if !self.is_declared(k) { values.insert(k.clone(), v.clone()); }
            }
        }
        RecipeArgs { values }
    }
}

/// Default settings shared by every recipe evaluated in a container tree.
///
/// Values are opaque to the container; they typically come from the
/// configuration layer. Cloning shares the underlying map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecipeDefaults(Arc<Map<String, Value>>);

impl RecipeDefaults {
    pub fn new(map: Map<String, Value>) -> Self { RecipeDefaults(Arc::new(map)) }

    pub fn get(&self, name: &str) -> Option<&Value> { self.0.get(name) }
    pub fn contains_key(&self, name: &str) -> bool { self.0.contains_key(name) }
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> { self.0.iter() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Copy-on-write insert; other holders of the previous map are unaffected.
    pub fn insert(&mut self, name: &str, value: Value) {
        Arc::make_mut(&mut self.0).insert(name.to_string(), value);
    }
}

impl From<Map<String, Value>> for RecipeDefaults {
    fn from(map: Map<String, Value>) -> Self { RecipeDefaults::new(map) }
}

/// Arguments bound for a single generator invocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecipeArgs {
    values: BTreeMap<String, Value>,
}

impl RecipeArgs {
    pub fn get(&self, name: &str) -> Option<&Value> { self.values.get(name) }
    pub fn contains(&self, name: &str) -> bool { self.values.contains_key(name) }
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
    pub fn names(&self) -> impl Iterator<Item = &str> { self.values.keys().map(String::as_str) }

    pub fn get_f64(&self, name: &str) -> Option<f64> { self.get(name).and_then(Value::as_f64) }
    pub fn get_i64(&self, name: &str) -> Option<i64> { self.get(name).and_then(Value::as_i64) }
    pub fn get_bool(&self, name: &str) -> Option<bool> { self.get(name).and_then(Value::as_bool) }
    pub fn get_str(&self, name: &str) -> Option<&str> { self.get(name).and_then(Value::as_str) }

    /// Deserialize a structured argument; `Ok(None)` when it was not bound.
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> FieldResult<Option<T>> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| FieldError::generator(format!("argument '{}': {}", name, e))),
        }
    }
}

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use crate::array::FieldArray;
use crate::error::{FieldError, FieldResult};
use super::recipe::{FieldRecipe, RecipeDefaults, RecipeSource};
use super::{FieldEntry, FieldMapping, KeyFilter, LookupOptions, Resolved};

/// Names reserved for bookkeeping fields, hidden from default enumeration.
pub const DEFAULT_INTERNAL_NAMES: &[&str] = &["uid"];

/// Construction parameters for a `FieldContainer`.
#[derive(Clone, Debug, Default)]
pub struct ContainerOptions {
    pub name: Option<String>,
    /// Child containers created empty, inheriting `recipe_defaults`.
    pub containers: Vec<String>,
    pub recipe_defaults: RecipeDefaults,
    pub aliases: HashMap<String, String>,
    pub fields: Vec<(String, FieldArray)>,
}

/// A mutable tree node of fields, pending recipes and child containers.
///
/// Lookups resolve aliases once, then check child containers, then
/// materialized fields and finally recipes. A recipe result is cached in
/// `fields`, so later reads never re-run the generator unless forced.
#[derive(Clone, Debug)]
pub struct FieldContainer {
    name: Option<String>,
    aliases: HashMap<String, String>,
    fields: HashMap<String, FieldArray>,
    recipes: HashMap<String, FieldRecipe>,
    containers: HashMap<String, FieldContainer>,
    recipe_defaults: RecipeDefaults,
    internal_names: Vec<String>,
    /// Keys whose recipe is currently running.
    in_progress: HashSet<String>,
}

impl Default for FieldContainer {
    fn default() -> Self { Self::new() }
}

impl FieldContainer {
    pub fn new() -> Self {
        Self {
            name: None,
            aliases: HashMap::new(),
            fields: HashMap::new(),
            recipes: HashMap::new(),
            containers: HashMap::new(),
            recipe_defaults: RecipeDefaults::default(),
            internal_names: DEFAULT_INTERNAL_NAMES.iter().map(|s| s.to_string()).collect(),
            in_progress: HashSet::new(),
        }
    }

    pub fn named(name: &str) -> Self {
        let mut c = Self::new();
        c.name = Some(name.to_string());
        c
    }

    pub fn with_defaults(name: Option<String>, recipe_defaults: RecipeDefaults) -> Self {
        let mut c = Self::new();
        c.name = name;
        c.recipe_defaults = recipe_defaults;
        c
    }

    pub fn from_options(opts: ContainerOptions) -> Self {
        let mut c = Self::with_defaults(opts.name, opts.recipe_defaults);
        c.aliases = opts.aliases;
        for (k, v) in opts.fields { c.fields.insert(k, v); }
        for k in opts.containers {
            let child = FieldContainer::with_defaults(Some(k.clone()), c.recipe_defaults.clone());
            c.fields.remove(&k);
            c.containers.insert(k, child);
        }
        c
    }

    pub fn name(&self) -> Option<&str> { self.name.as_deref() }
    pub fn fields(&self) -> &HashMap<String, FieldArray> { &self.fields }
    pub fn recipes(&self) -> &HashMap<String, FieldRecipe> { &self.recipes }
    pub fn containers(&self) -> &HashMap<String, FieldContainer> { &self.containers }
    pub fn aliases(&self) -> &HashMap<String, String> { &self.aliases }
    pub fn recipe_defaults(&self) -> &RecipeDefaults { &self.recipe_defaults }
    pub fn internal_names(&self) -> &[String] { &self.internal_names }

    pub(crate) fn containers_mut(&mut self) -> &mut HashMap<String, FieldContainer> { &mut self.containers }
    pub(crate) fn recipes_mut(&mut self) -> &mut HashMap<String, FieldRecipe> { &mut self.recipes }
    pub(crate) fn fields_mut(&mut self) -> &mut HashMap<String, FieldArray> { &mut self.fields }

    pub(crate) fn into_parts(self) -> (HashMap<String, FieldArray>, HashMap<String, FieldRecipe>, HashMap<String, FieldContainer>) {
        (self.fields, self.recipes, self.containers)
    }

    /// Set a recipe default on this container and every descendant.
    pub fn set_recipe_default(&mut self, name: &str, value: Value) {
        self.recipe_defaults.insert(name, value.clone());
        for child in self.containers.values_mut() { child.set_recipe_default(name, value.clone()); }
    }

    pub fn add_alias(&mut self, alias: &str, name: &str) {
        self.aliases.insert(alias.to_string(), name.to_string());
    }

    /// Single-hop alias substitution.
    pub fn resolve_alias<'a>(&'a self, key: &'a str) -> &'a str {
        self.aliases.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Create and attach an empty child; the child shares this container's recipe defaults.
    pub fn new_container(&mut self, key: &str, opts: ContainerOptions) -> &mut FieldContainer {
        let opts = ContainerOptions { name: Some(key.to_string()), recipe_defaults: self.recipe_defaults.clone(), ..opts };
        debug!(target: "fieldstore::fields", parent=?self.name, child=%key, "new_container");
        self.fields.remove(key);
        match self.containers.entry(key.to_string()) {
            Entry::Occupied(mut o) => { o.insert(FieldContainer::from_options(opts)); o.into_mut() }
            Entry::Vacant(v) => v.insert(FieldContainer::from_options(opts)),
        }
    }

    pub fn container(&self, key: &str) -> Option<&FieldContainer> {
        let key = self.resolve_alias(key);
        self.containers.get(key)
    }

    pub fn container_mut(&mut self, key: &str) -> Option<&mut FieldContainer> {
        let key = self.resolve_alias(key).to_string();
        self.containers.get_mut(&key)
    }

    /// Lookup with caching; see `lookup`.
    pub fn get(&mut self, key: &str) -> FieldResult<Resolved<'_>> {
        self.lookup(key, LookupOptions::default())
    }

    /// Lookup expecting an array; a child container under `key` is a type mismatch.
    pub fn array(&mut self, key: &str) -> FieldResult<FieldArray> {
        self.get(key)?.into_array(key)
    }

    /// Re-run the recipe for `key` even if a materialized value exists.
    pub fn get_forced(&mut self, key: &str) -> FieldResult<Resolved<'_>> {
        self.lookup(key, LookupOptions::forced())
    }

    /// Non-throwing lookup: `Ok(None)` when the key is unknown.
    ///
    /// Derived values are returned but never written back; `opts.cache` is ignored.
    pub fn get_opt(&mut self, key: &str, opts: LookupOptions) -> FieldResult<Option<Resolved<'_>>> {
        let opts = LookupOptions { cache: false, ..opts };
        match self.lookup(key, opts) {
            Ok(r) => Ok(Some(r)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Non-throwing lookup returning `default` when the key is unknown. Never caches.
    pub fn get_or(&mut self, key: &str, default: FieldArray, opts: LookupOptions) -> FieldResult<Resolved<'_>> {
        Ok(self.get_opt(key, opts)?.unwrap_or(Resolved::Array(default)))
    }

    /// Resolve `key`: alias, child container, materialized field, recipe.
    pub fn lookup(&mut self, key: &str, opts: LookupOptions) -> FieldResult<Resolved<'_>> {
        let key = self.resolve_alias(key).to_string();
        if self.containers.contains_key(&key) {
            return Ok(Resolved::Container(&self.containers[&key]));
        }
        if !opts.force_derived {
            if let Some(v) = self.fields.get(&key) { return Ok(Resolved::Array(v.clone())); }
        }
        let recipe = match self.recipes.get(&key) {
            Some(r) => r.clone(),
            None => return Err(FieldError::not_found(key)),
        };
        if !opts.allow_derived {
            return Err(FieldError::derived_forbidden(key));
        }
        if !self.in_progress.insert(key.clone()) {
            return Err(FieldError::recursive_derivation(key));
        }
        let value = self.evaluate(&key, &recipe);
        self.in_progress.remove(&key);
        let value = value?;
        if opts.cache {
            self.fields.insert(key, value.clone());
        }
        Ok(Resolved::Array(value))
    }

    fn evaluate(&mut self, key: &str, recipe: &FieldRecipe) -> FieldResult<FieldArray> {
        match recipe.source() {
            RecipeSource::Precomputed(arr) => Ok(arr.clone()),
            RecipeSource::Generator(generator) => {
                let args = recipe.params().bind(&self.recipe_defaults);
                debug!(target: "fieldstore::fields", container=?self.name, field=%key, args=?args.names().collect::<Vec<_>>(), "deriving field");
                generator(self, &args)
            }
        }
    }

    /// Route a value by variant: arrays to fields, containers to children, recipes to recipes.
    pub fn set(&mut self, key: &str, value: FieldEntry) {
        match value {
            FieldEntry::Array(a) => {
                if self.containers.remove(key).is_some() {
                    debug!(target: "fieldstore::fields", field=%key, "array replaces child container");
                }
                self.fields.insert(key.to_string(), a);
            }
            FieldEntry::Container(mut c) => {
                if c.name.is_none() { c.name = Some(key.to_string()); }
                self.fields.remove(key);
                self.containers.insert(key.to_string(), c);
            }
            FieldEntry::Recipe(r) => {
                self.recipes.insert(key.to_string(), r);
            }
        }
    }

    pub fn insert_array<A: Into<FieldArray>>(&mut self, key: &str, value: A) { self.set(key, FieldEntry::Array(value.into())); }
    pub fn insert_container(&mut self, key: &str, value: FieldContainer) { self.set(key, FieldEntry::Container(value)); }
    pub fn insert_recipe<R: Into<FieldRecipe>>(&mut self, key: &str, recipe: R) { self.set(key, FieldEntry::Recipe(recipe.into())); }

    /// Drop the recipe and the field under `key`.
    ///
    /// The recipe goes first; a key without a materialized field then fails.
    pub fn remove(&mut self, key: &str) -> FieldResult<()> {
        self.recipes.remove(key);
        match self.fields.remove(key) {
            Some(_) => Ok(()),
            None => Err(FieldError::not_found(key)),
        }
    }

    pub fn keys(&self, filter: KeyFilter) -> Vec<String> {
        let mut out: BTreeSet<String> = BTreeSet::new();
        if filter.fields {
            // internal names only hide materialized fields
            out.extend(self.fields.keys().filter(|k| filter.internal || !self.internal_names.contains(k)).cloned());
        }
        if filter.recipes { out.extend(self.recipes.keys().cloned()); }
        if filter.containers { out.extend(self.containers.keys().cloned()); }
        out.into_iter().collect()
    }

    pub fn len(&self) -> usize { self.keys(KeyFilter::default()).len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Membership after alias substitution; never triggers derivation.
    pub fn contains_key(&self, key: &str) -> bool {
        let key = self.resolve_alias(key);
        self.containers.contains_key(key) || self.fields.contains_key(key) || self.recipes.contains_key(key)
    }

    pub fn field_count(&self) -> usize { self.fields.len() }

    /// Common first-dimension length of all materialized fields, if they agree.
    pub fn field_length(&self) -> Option<usize> {
        let mut lens = self.fields.values().map(FieldArray::len);
        let first = lens.next()??;
        if lens.all(|l| l == Some(first)) { Some(first) } else { None }
    }
}

impl FieldMapping for FieldContainer {
    fn get_entry(&mut self, key: &str) -> FieldResult<Resolved<'_>> { FieldContainer::get(self, key) }
    fn set(&mut self, key: &str, value: FieldEntry) { FieldContainer::set(self, key, value) }
    fn remove(&mut self, key: &str) -> FieldResult<()> { FieldContainer::remove(self, key) }
    fn keys(&self, filter: KeyFilter) -> Vec<String> { FieldContainer::keys(self, filter) }
    fn contains_key(&self, key: &str) -> bool { FieldContainer::contains_key(self, key) }
}

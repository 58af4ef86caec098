//! Settings loader feeding recipe defaults.
//!
//! Settings are a nested JSON-like mapping assembled from YAML files and
//! `FIELDSTORE_*` environment variables. The field layer never interprets
//! individual keys; it only hands them to recipes as default arguments.
//!
//! Resolution order for a named resource (see `load_file`):
//! 1) absolute path (after `~` expansion)
//! 2) `~/.config/fieldstore/<resource>`
//! 3) resources bundled with the crate under `configfiles/`

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FieldError, FieldResult};
use crate::fields::RecipeDefaults;

pub const ENV_PREFIX: &str = "FIELDSTORE_";
/// Env var (after prefix stripping: `config_path`) naming the main config file.
pub const ENV_CONFIG_PATH: &str = "FIELDSTORE_CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = ".fieldstore.yaml";

const BUILTIN_RESOURCES: &[(&str, &str)] = &[
    ("default.yaml", include_str!("../configfiles/default.yaml")),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Settings {
    pub fn new(map: Map<String, Value>) -> Self { Settings(map) }

    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

    /// Nested lookup by dotted path, e.g. `cosmology.h`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut cur = self.0.get(parts.next()?)?;
        for p in parts {
            cur = cur.as_object()?.get(p)?;
        }
        Some(cur)
    }

    pub fn insert(&mut self, key: &str, value: Value) { self.0.insert(key.to_string(), value); }
    pub fn as_map(&self) -> &Map<String, Value> { &self.0 }
    pub fn into_map(self) -> Map<String, Value> { self.0 }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Merge `other` into these settings; conflicting leaves are an error.
    pub fn merged(mut self, other: Settings) -> FieldResult<Settings> {
        merge_recursively(&mut self.0, other.0, &mut Vec::new())?;
        Ok(self)
    }

    pub fn recipe_defaults(&self) -> RecipeDefaults { RecipeDefaults::new(self.0.clone()) }
}

impl From<Settings> for RecipeDefaults {
    fn from(s: Settings) -> Self { RecipeDefaults::new(s.0) }
}

/// Merge `b` into `a`. Nested maps merge, equal leaves pass, anything else conflicts.
pub fn merge_recursively(a: &mut Map<String, Value>, b: Map<String, Value>, path: &mut Vec<String>) -> FieldResult<()> {
    for (key, bval) in b {
        match a.get_mut(&key) {
            None => { a.insert(key, bval); }
            Some(aval) => {
                path.push(key.clone());
                match (aval, bval) {
                    (Value::Object(am), Value::Object(bm)) => merge_recursively(am, bm, path)?,
                    (aval, bval) if *aval == bval => {}
                    _ => return Err(FieldError::config(format!("Conflict at {}", path.join(".")))),
                }
                path.pop();
            }
        }
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).ok().map(PathBuf::from)
}

fn expand_user(p: &str) -> PathBuf {
    if p == "~" {
        if let Some(h) = home_dir() { return h; }
    }
    if let Some(rest) = p.strip_prefix("~/") {
        if let Some(h) = home_dir() { return h.join(rest); }
    }
    PathBuf::from(p)
}

/// Parse YAML text into settings. An empty document is an empty mapping.
pub fn parse_yaml(text: &str, origin: &str) -> FieldResult<Settings> {
    if text.trim().is_empty() { return Ok(Settings::default()); }
    let v: Value = serde_yaml_ng::from_str(text)
        .map_err(|e| FieldError::config(format!("cannot parse '{}': {}", origin, e)))?;
    match v {
        Value::Object(m) => Ok(Settings(m)),
        Value::Null => Ok(Settings::default()),
        other => Err(FieldError::config(format!("'{}' must contain a mapping at top level, found {}", origin, other))),
    }
}

fn read_yaml(path: &Path) -> FieldResult<Settings> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| FieldError::config(format!("cannot read '{}': {}", path.display(), e)))?;
    parse_yaml(&text, &path.display().to_string())
}

/// Load settings from a path or named resource.
pub fn load_file(resource: &str) -> FieldResult<Settings> {
    if resource.is_empty() {
        return Err(FieldError::config("Config name cannot be empty."));
    }
    let path = expand_user(resource);
    if path.is_absolute() {
        debug!(target: "fieldstore::config", path=%path.display(), "loading config from absolute path");
        return read_yaml(&path);
    }
    if let Some(home) = home_dir() {
        let user_path = home.join(".config").join("fieldstore").join(resource);
        if user_path.is_file() {
            debug!(target: "fieldstore::config", path=%user_path.display(), "loading config from user dir");
            return read_yaml(&user_path);
        }
    }
    match BUILTIN_RESOURCES.iter().find(|(name, _)| *name == resource) {
        Some((name, text)) => {
            debug!(target: "fieldstore::config", resource=%name, "loading bundled config");
            parse_yaml(text, name)
        }
        None => Err(FieldError::config(format!("config resource '{}' not found", resource))),
    }
}

/// Load and merge several config files in order.
pub fn load_files<S: AsRef<str>>(paths: &[S]) -> FieldResult<Settings> {
    let mut conf = Settings::default();
    for p in paths {
        conf = conf.merged(load_file(p.as_ref())?)?;
    }
    Ok(conf)
}

/// Split `FIELDSTORE_*` variables into the config path override and plain overrides.
///
/// Names are lowercased after the prefix is removed; values stay strings.
pub fn env_overrides<I: IntoIterator<Item = (String, String)>>(vars: I) -> (Option<String>, Map<String, Value>) {
    let mut path = None;
    let mut out = Map::new();
    for (k, v) in vars {
        let Some(stripped) = k.strip_prefix(ENV_PREFIX) else { continue };
        let key = stripped.to_lowercase();
        if key == "config_path" {
            path = Some(v);
        } else {
            out.insert(key, Value::String(v));
        }
    }
    (path, out)
}

/// Build settings from an explicit environment snapshot.
///
/// Without a `config_path` override the default `~/.fieldstore.yaml` is used
/// when it exists. Environment values replace file values of the same key.
pub fn resolve<I: IntoIterator<Item = (String, String)>>(vars: I) -> FieldResult<Settings> {
    let (path, overrides) = env_overrides(vars);
    let mut conf = match path {
        Some(p) => load_file(&p)?,
        None => match home_dir().map(|h| h.join(DEFAULT_CONFIG_FILE)) {
            Some(p) if p.is_file() => read_yaml(&p)?,
            _ => Settings::default(),
        },
    };
    for (k, v) in overrides { conf.0.insert(k, v); }
    debug!(target: "fieldstore::config", keys=conf.len(), "config resolved");
    Ok(conf)
}

static CONFIG: Lazy<Mutex<Option<Settings>>> = Lazy::new(|| Mutex::new(None));

/// Process-wide settings, read once and cached until `reload` is requested.
pub fn get_config(reload: bool) -> FieldResult<Settings> {
    let mut guard = CONFIG.lock();
    if !reload {
        if let Some(conf) = guard.as_ref() { return Ok(conf.clone()); }
    }
    let conf = resolve(std::env::vars())?;
    *guard = Some(conf.clone());
    Ok(conf)
}

#[cfg(test)]
#[path = "config/config_tests.rs"]
mod config_tests;

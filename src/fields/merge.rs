use std::collections::HashMap;

use tracing::debug;

use crate::error::{FieldError, FieldResult};
use super::container::FieldContainer;
use super::FieldEntry;

impl FieldContainer {
    /// Merge the child containers of `other` into this container's children.
    ///
    /// Children missing here are created with this container's recipe
    /// defaults. On a key collision, `overwrite = true` keeps this side's entry
    /// and `overwrite = false` takes `other`'s. This also holds when an incoming
    /// child meets a field of the same name here. Fields and recipes of the two
    /// roots themselves are left alone; every level below them is merged.
    pub fn merge<E: Into<FieldEntry>>(&mut self, other: E, overwrite: bool) -> FieldResult<()> {
        let other = match other.into() {
            FieldEntry::Container(c) => c,
            FieldEntry::Array(_) => return Err(FieldError::merge_type("Can only merge FieldContainers, got an array")),
            FieldEntry::Recipe(_) => return Err(FieldError::merge_type("Can only merge FieldContainers, got a recipe")),
        };
        debug!(target: "fieldstore::fields", into=?self.name(), from=?other.name(), overwrite, "merge");
        let (_, _, children) = other.into_parts();
        self.merge_children(children, overwrite);
        Ok(())
    }

    fn merge_children(&mut self, children: HashMap<String, FieldContainer>, overwrite: bool) {
        let defaults = self.recipe_defaults().clone();
        for (key, theirs) in children {
            if !self.containers().contains_key(&key) {
                if overwrite && self.fields().contains_key(&key) {
                    debug!(target: "fieldstore::fields", child=%key, "merge keeps existing field over incoming child");
                    continue;
                }
                crate::tprintln!("[fields.merge] creating child '{}'", key);
                self.fields_mut().remove(&key);
                self.containers_mut().insert(key.clone(), FieldContainer::with_defaults(Some(key.clone()), defaults.clone()));
            }
            if let Some(ours) = self.containers_mut().get_mut(&key) {
                ours.absorb(theirs, overwrite);
            }
        }
    }

    fn absorb(&mut self, other: FieldContainer, overwrite: bool) {
        let (fields, recipes, children) = other.into_parts();
        for (k, v) in fields {
            if self.containers().contains_key(&k) { continue; }
            if overwrite {
                self.fields_mut().entry(k).or_insert(v);
            } else {
                self.fields_mut().insert(k, v);
            }
        }
        for (k, r) in recipes {
            if overwrite {
                self.recipes_mut().entry(k).or_insert(r);
            } else {
                self.recipes_mut().insert(k, r);
            }
        }
        self.merge_children(children, overwrite);
    }
}

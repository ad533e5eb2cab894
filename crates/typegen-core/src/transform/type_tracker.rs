use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::ir::{TypeDefinition, TypeCollection};

/// Run-scoped registry of generated type names.
///
/// Owns the name-to-definition and ref-path-to-name maps for one
/// generation run. Constructed explicitly and passed down the resolution
/// call chain; never shared between runs, so repeated runs (tests
/// included) cannot interfere with each other.
#[derive(Debug, Default)]
pub struct TypeTracker {
    definitions: IndexMap<String, TypeDefinition>,
    refs: HashMap<String, String>,
    /// Names handed out for definitions still being resolved. Counted as
    /// taken by `exists` so a recursive resolution cannot claim a name a
    /// caller higher up the stack already holds.
    reserved: HashSet<String>,
    default_suffixes: Vec<String>,
}

impl TypeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the suffix list consulted by `generate_unique_name`.
    /// Consumes and returns the tracker so a scoped copy can be set up
    /// without mutating one already handed out.
    pub fn with_default_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.default_suffixes = suffixes;
        self
    }

    /// Register a definition under its name; a non-empty `ref_path` also
    /// indexes ref-path to name. Callers resolve naming before
    /// registering: a ref path already bound to a different name is a
    /// caller bug and the original binding wins.
    pub fn register(&mut self, def: TypeDefinition, ref_path: &str) {
        self.reserved.remove(&def.name);
        if self.definitions.contains_key(&def.name) {
            warn!("type name {} registered twice, replacing definition", def.name);
        }
        if !ref_path.is_empty() {
            match self.refs.get(ref_path) {
                Some(existing) if existing != &def.name => {
                    warn!(
                        "ref {ref_path} already bound to {existing}, ignoring rebind to {}",
                        def.name
                    );
                }
                _ => {
                    self.refs.insert(ref_path.to_string(), def.name.clone());
                }
            }
        }
        debug!("registered type {}", def.name);
        self.definitions.insert(def.name.clone(), def);
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&TypeDefinition> {
        self.definitions.get(name)
    }

    pub fn lookup_by_ref(&self, ref_path: &str) -> Option<&str> {
        self.refs.get(ref_path).map(String::as_str)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.definitions.contains_key(name) || self.reserved.contains(name)
    }

    /// Mark a generated name as taken before its definition is registered.
    /// The reservation is consumed by `register`.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.reserved.insert(name.into());
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns `base` unless taken, otherwise applies the configured
    /// default suffix strategy, then the numeric fallback.
    pub fn generate_unique_name(&self, base: &str) -> String {
        let suffixes = self.default_suffixes.clone();
        self.generate_unique_name_with_suffixes(base, &suffixes)
    }

    /// Tries `base`, then `base + suffixes[i]` in order, then numeric
    /// suffixes `base0`, `base1`, ... until an unused name is found. The
    /// numeric fallback is unbounded, so this always terminates with a
    /// fresh name.
    pub fn generate_unique_name_with_suffixes<S: AsRef<str>>(
        &self,
        base: &str,
        suffixes: &[S],
    ) -> String {
        if !self.exists(base) {
            return base.to_string();
        }
        for suffix in suffixes {
            let candidate = format!("{base}{}", suffix.as_ref());
            if !self.exists(&candidate) {
                return candidate;
            }
        }
        let mut i = 0usize;
        loop {
            let candidate = format!("{base}{i}");
            if !self.exists(&candidate) {
                debug!("name collision on {base}, using {candidate}");
                return candidate;
            }
            i += 1;
        }
    }

    /// Drain the registry into the renderer-facing collection, in
    /// registration order.
    pub fn into_collection(self) -> TypeCollection {
        TypeCollection {
            definitions: self.definitions.into_values().collect(),
            ..Default::default()
        }
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.values()
    }
}

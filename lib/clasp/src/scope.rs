//! Named configuration scopes.
//!
//! Each logical service owns a [`NamedScope`]: a type-indexed, name-keyed
//! registry of capability handles. The [`ScopeRegistry`] holds all named
//! scopes plus one root scope that children fall back to unless a service
//! opts out of ancestor inheritance.
//!
//! Registration happens once at startup; after that the registry is
//! read-only and lookups take `&self`, so concurrent reads need no locking.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

type AnyEntry = Box<dyn Any + Send + Sync>;

/// One named configuration namespace.
///
/// Entries are stored per capability type, keyed by registration name.
/// Name maps are ordered so that "any instance" lookups are deterministic
/// (lexicographically smallest registration name wins).
#[derive(Default)]
pub struct NamedScope {
    entries: HashMap<TypeId, BTreeMap<String, AnyEntry>>,
}

impl NamedScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability handle under a name.
    ///
    /// Re-registering the same type and name replaces the previous entry;
    /// this only happens during startup wiring.
    pub fn register<T>(&mut self, name: impl Into<String>, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries
            .entry(TypeId::of::<T>())
            .or_default()
            .insert(name.into(), Box::new(value));
    }

    /// Get any registered instance of `T`, if one exists.
    #[must_use]
    pub fn get<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|named| named.values().next())
            .and_then(|entry| entry.downcast_ref::<T>())
            .cloned()
    }

    /// Get the instance of `T` registered under `name`.
    #[must_use]
    pub fn get_named<T>(&self, name: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|named| named.get(name))
            .and_then(|entry| entry.downcast_ref::<T>())
            .cloned()
    }

    /// All registered instances of `T`, keyed by registration name.
    #[must_use]
    pub fn get_all<T>(&self) -> BTreeMap<String, T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .map(|named| {
                named
                    .iter()
                    .filter_map(|(name, entry)| {
                        entry.downcast_ref::<T>().map(|v| (name.clone(), v.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether any instance of `T` is registered.
    #[must_use]
    pub fn contains<T>(&self) -> bool
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .is_some_and(|named| !named.is_empty())
    }
}

impl std::fmt::Debug for NamedScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedScope")
            .field("capability_types", &self.entries.len())
            .finish()
    }
}

/// All named scopes plus the root (default) scope.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    root: NamedScope,
    scopes: HashMap<String, NamedScope>,
}

impl ScopeRegistry {
    /// Create a registry with an empty root scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to the root scope, for default registrations.
    pub fn root_mut(&mut self) -> &mut NamedScope {
        &mut self.root
    }

    /// Mutable access to a named scope, creating it if needed.
    pub fn scope_mut(&mut self, context_id: impl Into<String>) -> &mut NamedScope {
        self.scopes.entry(context_id.into()).or_default()
    }

    /// Look up `T` in the named scope, falling back to the root scope.
    ///
    /// Returns `None` if not registered anywhere; optional lookups never
    /// fail.
    #[must_use]
    pub fn get_instance<T>(&self, context_id: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.scopes
            .get(context_id)
            .and_then(NamedScope::get::<T>)
            .or_else(|| self.root.get::<T>())
    }

    /// Look up `T` in the named scope only, with no root fallback.
    ///
    /// Used for services that opted out of ancestor inheritance.
    #[must_use]
    pub fn get_instance_without_ancestors<T>(&self, context_id: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.scopes.get(context_id).and_then(NamedScope::get::<T>)
    }

    /// All instances of `T` visible from the named scope, keyed by
    /// registration name. Entries in the named scope shadow root entries
    /// registered under the same name.
    #[must_use]
    pub fn get_instances<T>(&self, context_id: &str) -> BTreeMap<String, T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut instances = self.root.get_all::<T>();
        if let Some(scope) = self.scopes.get(context_id) {
            instances.extend(scope.get_all::<T>());
        }
        instances
    }

    /// All instances of `T` in the named scope only.
    #[must_use]
    pub fn get_instances_without_ancestors<T>(&self, context_id: &str) -> BTreeMap<String, T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.scopes
            .get(context_id)
            .map(NamedScope::get_all::<T>)
            .unwrap_or_default()
    }

    /// Look up `T` under a specific registration name, with root fallback.
    #[must_use]
    pub fn get_named_instance<T>(&self, context_id: &str, name: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.scopes
            .get(context_id)
            .and_then(|scope| scope.get_named::<T>(name))
            .or_else(|| self.root.get_named::<T>(name))
    }
}

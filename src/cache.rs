//! Per-run store of built named types.
//!
//! Every named type is built at most once per generation run. Slots are keyed
//! by the GraphQL name a [`TypeKey`] resolves to, so two distinct types that
//! would share a name are detected as a conflict rather than overwritten.
//! A slot is owned by a full [`TypeKey`], so the input and output variants of
//! one type may never share a name either. Types still being built are tracked so that a re-entrant reference (a cycle)
//! gets a named reference instead of recursing.

use crate::error::{Error, Result};
use crate::introspect::TypeId;
use crate::types::NamedType;
use async_graphql::indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Whether a type is used as an argument/input field or as an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    Input,
    Output,
}

/// Identity of a cache slot: nominal type plus variance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub type_id: TypeId,
    pub variance: Variance,
}

impl TypeKey {
    pub fn new(type_id: TypeId, variance: Variance) -> Self {
        Self { type_id, variance }
    }

    pub fn input(type_id: TypeId) -> Self {
        Self::new(type_id, Variance::Input)
    }

    pub fn output(type_id: TypeId) -> Self {
        Self::new(type_id, Variance::Output)
    }

    pub fn is_input(&self) -> bool {
        self.variance == Variance::Input
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variance {
            Variance::Input => write!(f, "{} (input)", self.type_id),
            Variance::Output => write!(f, "{}", self.type_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedTypeEntry {
    pub key: TypeKey,
    pub named_type: Arc<NamedType>,
}

/// Result of [`TypesCache::build_or_reuse`].
#[derive(Debug, Clone)]
pub enum CachedType {
    /// The finished type, shared with the cache
    Built(Arc<NamedType>),
    /// Reference by name only: a built-in scalar, or a type that is still
    /// under construction
    Reference(String),
}

impl CachedType {
    pub fn name(&self) -> &str {
        match self {
            CachedType::Built(ty) => ty.name(),
            CachedType::Reference(name) => name,
        }
    }

    pub fn built(&self) -> Option<&Arc<NamedType>> {
        match self {
            CachedType::Built(ty) => Some(ty),
            CachedType::Reference(_) => None,
        }
    }
}

/// Cache of named types for a single generation run.
#[derive(Debug)]
pub struct TypesCache {
    supported_packages: Vec<String>,
    entries: IndexMap<String, CachedTypeEntry>,
    /// Slot name -> owner, for slots whose builder is running
    in_construction: HashMap<String, TypeKey>,
    /// Names held by types built outside the cache (the root types)
    reserved: HashMap<String, TypeKey>,
}

impl TypesCache {
    pub fn new(supported_packages: Vec<String>) -> Self {
        Self {
            supported_packages,
            entries: IndexMap::new(),
            in_construction: HashMap::new(),
            reserved: HashMap::new(),
        }
    }

    pub fn supported_packages(&self) -> &[String] {
        &self.supported_packages
    }

    pub fn is_supported(&self, type_id: &TypeId) -> bool {
        type_id.is_in_packages(&self.supported_packages)
    }

    /// Fail with [`Error::TypeNotSupported`] unless the type is in a supported package.
    pub fn ensure_supported(&self, type_id: &TypeId) -> Result<()> {
        if self.is_supported(type_id) {
            Ok(())
        } else {
            Err(Error::TypeNotSupported {
                type_id: type_id.clone(),
                packages: self.supported_packages.clone(),
            })
        }
    }

    /// Claim `name` for `owner` without storing a type under it.
    ///
    /// Reserved names never show up in [`into_types`](Self::into_types), but
    /// any other key resolving to them is a conflict.
    pub fn reserve(&mut self, name: &str, owner: TypeKey) -> Result<()> {
        self.check_owner(name, &owner)?;
        if let Some(building) = self.in_construction.get(name) {
            if *building != owner {
                return Err(conflict(name, building, &owner));
            }
        }
        self.reserved.insert(name.to_string(), owner);
        Ok(())
    }

    fn check_owner(&self, name: &str, key: &TypeKey) -> Result<()> {
        let existing = self
            .reserved
            .get(name)
            .or_else(|| self.entries.get(name).map(|entry| &entry.key));
        match existing {
            Some(existing) if existing != key => Err(conflict(name, existing, key)),
            _ => Ok(()),
        }
    }

    /// Look up a finished type by slot name.
    pub fn resolve(&self, name: &str, key: &TypeKey) -> Result<Option<Arc<NamedType>>> {
        self.check_owner(name, key)?;
        Ok(self.entries.get(name).map(|entry| entry.named_type.clone()))
    }

    /// Store a finished type. A `None` name leaves the type uncached.
    pub fn register(
        &mut self,
        name: Option<&str>,
        key: TypeKey,
        named_type: NamedType,
    ) -> Result<Arc<NamedType>> {
        let named_type = Arc::new(named_type);
        let Some(name) = name else {
            return Ok(named_type);
        };

        self.check_owner(name, &key)?;
        self.entries.insert(
            name.to_string(),
            CachedTypeEntry {
                key,
                named_type: named_type.clone(),
            },
        );
        Ok(named_type)
    }

    /// Whether the slot for `name` is being built right now.
    pub fn is_in_construction(&self, name: &str) -> bool {
        self.in_construction.contains_key(name)
    }

    /// Return the cached type for `key`, a lazy reference if it is being
    /// built, or build and register it.
    ///
    /// `name` is the slot name `key` resolves to. The builder receives the
    /// cache so it can resolve nested types through it.
    pub fn build_or_reuse<F>(&mut self, key: &TypeKey, name: &str, build: F) -> Result<CachedType>
    where
        F: FnOnce(&mut TypesCache) -> Result<NamedType>,
    {
        if let Some(existing) = self.resolve(name, key)? {
            tracing::trace!(type_name = name, "reusing cached type");
            return Ok(CachedType::Built(existing));
        }

        if let Some(building) = self.in_construction.get(name) {
            if building != key {
                return Err(conflict(name, building, key));
            }
            tracing::debug!(type_name = name, "type is under construction, using a named reference");
            return Ok(CachedType::Reference(name.to_string()));
        }

        tracing::debug!(type_name = name, type_key = %key, "building type");
        self.in_construction.insert(name.to_string(), key.clone());
        let built = build(self);
        self.in_construction.remove(name);

        let named_type = built?;
        if named_type.name() != name {
            return Err(Error::Schema(format!(
                "type {key} was built as {} but is cached as {name}",
                named_type.name()
            )));
        }
        let named_type = self.register(Some(name), key.clone(), named_type)?;
        Ok(CachedType::Built(named_type))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finished types in registration order.
    pub fn into_types(self) -> Vec<Arc<NamedType>> {
        self.entries
            .into_values()
            .map(|entry| entry.named_type)
            .collect()
    }
}

fn conflict(name: &str, existing: &TypeKey, new: &TypeKey) -> Error {
    Error::ConflictingTypes {
        name: name.to_string(),
        existing: existing.clone(),
        new: new.clone(),
    }
}

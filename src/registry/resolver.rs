use crate::context::{ContextAccessor, ResolveContext};
use crate::error::{Error, Result};
use crate::node::Attributes;
use crate::position::Position;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

/// A tag's rendering capability: turn its attributes (plus the ambient
/// context) into the string the tag expands to.
pub trait Resolver: Send + Sync {
    fn resolve(
        &self,
        ctx: &dyn ContextAccessor,
        rc: &ResolveContext,
        attrs: &Attributes,
    ) -> Result<String>;

    /// Check the attribute set before any rendering work happens. The
    /// executor runs this ahead of [`resolve`](Self::resolve); failures go
    /// through the same per-tag error strategy.
    fn validate(&self, _attrs: &Attributes, _pos: Position) -> Result<()> {
        Ok(())
    }
}

/// Tag name → resolver, safe for many concurrent readers and occasional
/// exclusive writers. First registration for a given name wins.
#[derive(Default)]
pub struct ResolverRegistry {
    inner: RwLock<IndexMap<String, Arc<dyn Resolver>>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, resolver: Arc<dyn Resolver>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyTagName);
        }
        let mut guard = self.inner.write().expect("resolver registry poisoned");
        if guard.contains_key(&name) {
            return Err(Error::ResolverAlreadyExists(name));
        }
        log::debug!(target: "prompty::registry", "registered resolver for `{}`", name);
        guard.insert(name, resolver);
        Ok(())
    }

    /// Like [`register`](Self::register) but panics on failure; used for
    /// built-ins that must never collide.
    pub fn must_register(&self, name: impl Into<String>, resolver: Arc<dyn Resolver>) {
        let name = name.into();
        self.register(name.clone(), resolver)
            .unwrap_or_else(|e| panic!("failed to register built-in resolver `{}`: {}", name, e));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Resolver>> {
        log::trace!(target: "prompty::registry", "looking up resolver `{}`", name);
        self.inner.read().expect("resolver registry poisoned").get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.read().expect("resolver registry poisoned").contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.inner.read().expect("resolver registry poisoned").len()
    }

    /// Registered tag names, sorted ascending for deterministic
    /// introspection.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .read()
            .expect("resolver registry poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

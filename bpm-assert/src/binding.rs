//! Resolving which engine backs the current test.
//!
//! Most tests own their engine and pass it straight to
//! [`ProcessEngineAssertions::new`](crate::ProcessEngineAssertions::new).
//! When engines are created elsewhere (a shared fixture, several engines in
//! one suite) register them in an [`EngineRegistry`] and let an
//! [`EngineBinding`] pick the one to use. Both are plain values owned by the
//! test, so parallel tests never observe each other's binding.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = EngineRegistry::new();
//! registry.register(Arc::new(InMemoryEngine::default()));
//!
//! let mut binding = EngineBinding::new();
//! let engine = binding.engine(&registry)?;   // the single registered engine
//! let assertions = ProcessEngineAssertions::new(&engine);
//! ```

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{Error, ProcessEngine, Result};

/// Engines known to a test suite, keyed by [`ProcessEngine::name`].
pub struct EngineRegistry<E: ProcessEngine> {
    engines: BTreeMap<String, Arc<E>>,
}

impl<E: ProcessEngine> fmt::Debug for EngineRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.engines.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<E: ProcessEngine> Default for EngineRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ProcessEngine> EngineRegistry<E> {
    pub fn new() -> Self {
        Self {
            engines: BTreeMap::new(),
        }
    }

    /// Register an engine under its name, replacing any engine with the same name.
    ///
    /// Returns the replaced engine, if any.
    pub fn register(&mut self, engine: Arc<E>) -> Option<Arc<E>> {
        let name = engine.name().to_string();
        tracing::debug!(engine = %name, "registering process engine");
        self.engines.insert(name, engine)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<E>> {
        self.engines.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<E>> {
        self.engines.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Returns the registered engine if it is the only one.
    fn single(&self) -> Option<Arc<E>> {
        match self.engines.len() {
            1 => self.engines.values().next().cloned(),
            _ => None,
        }
    }
}

/// The engine bound to the current test.
pub struct EngineBinding<E: ProcessEngine> {
    bound: Option<Arc<E>>,
}

impl<E: ProcessEngine> fmt::Debug for EngineBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBinding")
            .field("bound", &self.bound.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

impl<E: ProcessEngine> Default for EngineBinding<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ProcessEngine> EngineBinding<E> {
    pub fn new() -> Self {
        Self { bound: None }
    }

    /// Bind an engine explicitly. Takes precedence over registry lookup.
    pub fn init(&mut self, engine: Arc<E>) {
        self.bound = Some(engine);
    }

    /// Clear the binding, returning to the state before the first `init`.
    pub fn reset(&mut self) {
        self.bound = None;
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Resolve the engine for this test.
    ///
    /// Returns the explicitly bound engine if there is one. Otherwise, if
    /// exactly one engine is registered, binds and returns it.
    ///
    /// # Errors
    ///
    /// [`Error::IllegalState`] when nothing is bound and the registry holds
    /// zero or several engines.
    pub fn engine(&mut self, registry: &EngineRegistry<E>) -> Result<Arc<E>> {
        if let Some(engine) = &self.bound {
            return Ok(engine.clone());
        }
        if let Some(engine) = registry.single() {
            tracing::debug!(engine = %engine.name(), "binding the only registered process engine");
            self.bound = Some(engine.clone());
            return Ok(engine);
        }
        let message = match registry.len() {
            0 => "No ProcessEngine found to be registered with EngineRegistry!".to_string(),
            n => format!("{n} ProcessEngines initialized. Call EngineBinding::init first!"),
        };
        Err(Error::illegal_state(message))
    }
}

use crate::cancel::CancellationToken;
use crate::engine::Engine;
use crate::position::Position;
use crate::value::Value;

/// The data bag an executing template reads variables and `for` sources
/// from. Implementations may be simple maps or custom structures; the
/// engine never constructs one itself.
///
/// The three trailing methods are optional capabilities: a context that
/// can't support them keeps the default (`None`/empty) and the executor
/// degrades gracefully (missing-key diagnostics fall back to an empty
/// candidate list; `prompty.for` and a non-isolated `prompty.include` with
/// `with` bindings fail with [`crate::error::Error::ForContextNoChild`]).
pub trait ContextAccessor {
    /// Resolve a dot-separated path (`user.profile.name`) against the
    /// context. Returns `None` when the path does not resolve.
    fn get(&self, path: &str) -> Option<Value>;

    fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// All top-level keys this context can resolve, used for "did you
    /// mean"/"available keys" diagnostics. `None` when the context can't
    /// enumerate itself.
    fn keys(&self) -> Option<Vec<String>> {
        None
    }

    /// Create a scoped child context with `bindings` layered over this
    /// one, for `prompty.for` loop variables. `None` when the context
    /// doesn't support scoping.
    fn child(&self, _bindings: Vec<(String, Value)>) -> Option<Box<dyn ContextAccessor>> {
        None
    }

    /// Overrides the default per-tag error strategy (`throw`) when a tag
    /// has no `onerror` attribute of its own. `None` defers to the
    /// engine-wide default.
    fn error_strategy(&self) -> Option<ErrorStrategy> {
        None
    }
}

/// Ambient information handed to a resolver alongside the context: where
/// the tag appears, how deep rendering currently is, and a way back into
/// the owning engine for resolvers like `prompty.include`/`prompty.extends`.
pub struct ResolveContext<'a> {
    pub pos: Position,
    pub depth: usize,
    pub engine: Option<&'a Engine>,
    pub cancel: &'a CancellationToken,
}

/// Per-tag error-handling policy. See the executor for how this is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorStrategy {
    #[default]
    Throw,
    Default,
    Remove,
    KeepRaw,
    Log,
}

impl ErrorStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "throw" => Some(ErrorStrategy::Throw),
            "default" => Some(ErrorStrategy::Default),
            "remove" => Some(ErrorStrategy::Remove),
            "keepraw" => Some(ErrorStrategy::KeepRaw),
            "log" => Some(ErrorStrategy::Log),
            _ => None,
        }
    }
}

/// A plain, owned key/value map context, useful for tests and for embedding
/// another data source behind a thin adapter.
#[derive(Debug, Clone, Default)]
pub struct MapContext {
    data: indexmap::IndexMap<String, Value>,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    fn get_path(&self, path: &str) -> Option<Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.data.get(first)?.clone();
        for part in parts {
            current = match current {
                Value::Map(ref m) => m.get(part)?.clone(),
                _ => return None,
            };
        }
        Some(current)
    }
}

impl ContextAccessor for MapContext {
    fn get(&self, path: &str) -> Option<Value> {
        self.get_path(path)
    }

    fn keys(&self) -> Option<Vec<String>> {
        Some(self.data.keys().cloned().collect())
    }

    fn child(&self, bindings: Vec<(String, Value)>) -> Option<Box<dyn ContextAccessor>> {
        let mut ctx = self.clone();
        for (k, v) in bindings {
            ctx.data.insert(k, v);
        }
        Some(Box::new(ctx))
    }
}

use crate::error::{Error, Result};
use crate::position::Position;
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

pub type FuncImpl = dyn Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync;

/// A callable exposed to the expression sub-language: `min_args`/`max_args`
/// bound how many arguments `call` accepts (`max_args = None` means
/// unbounded).
pub struct FunctionDescriptor {
    pub name: String,
    pub min_args: usize,
    pub max_args: Option<usize>,
    pub func: Arc<FuncImpl>,
}

/// Identifier → function descriptor, safe for many concurrent readers and
/// occasional exclusive writers. Duplicate names are rejected outright.
#[derive(Default)]
pub struct FunctionRegistry {
    inner: RwLock<IndexMap<String, FunctionDescriptor>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        func: impl Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::FuncEmptyName);
        }
        let mut guard = self.inner.write().expect("function registry poisoned");
        if guard.contains_key(&name) {
            return Err(Error::FuncAlreadyExists(name));
        }
        log::debug!(target: "prompty::registry", "registered function `{}`", name);
        guard.insert(
            name.clone(),
            FunctionDescriptor {
                name,
                min_args,
                max_args,
                func: Arc::new(func),
            },
        );
        Ok(())
    }

    pub fn must_register(
        &self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        func: impl Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) {
        let name = name.into();
        self.register(name.clone(), min_args, max_args, func)
            .unwrap_or_else(|e| panic!("failed to register built-in function `{}`: {}", name, e));
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.read().expect("function registry poisoned").contains_key(name)
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .read()
            .expect("function registry poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn call(&self, name: &str, args: Vec<Value>, pos: Position) -> Result<Value> {
        let guard = self.inner.read().expect("function registry poisoned");
        let desc = match guard.get(name) {
            Some(d) => d,
            None => {
                let suggestion = crate::suggest::suggest(name, &guard.keys().cloned().collect::<Vec<_>>());
                return Err(Error::FuncNotFound {
                    pos,
                    name: name.to_string(),
                    suggestion,
                });
            }
        };
        if args.len() < desc.min_args {
            return Err(Error::FuncTooFewArgs {
                pos,
                name: name.to_string(),
                min: desc.min_args,
                got: args.len(),
            });
        }
        if let Some(max) = desc.max_args {
            if args.len() > max {
                return Err(Error::FuncTooManyArgs {
                    pos,
                    name: name.to_string(),
                    max,
                    got: args.len(),
                });
            }
        }
        (desc.func)(&args).map_err(|message| Error::FuncExecError {
            pos,
            name: name.to_string(),
            message,
        })
    }
}

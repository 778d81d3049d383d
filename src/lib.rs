//! `prompty` compiles a human-authored template, literal text mixed with
//! delimited directives of the form `{~tag attr="value"~}...{~/tag~}` or the
//! self-closing `{~tag attr="value" /~}`, into a tree, then renders that
//! tree against a runtime data context.
//!
//! # Overview
//!
//! The pipeline mirrors a small compiler: an optional YAML frontmatter block
//! is split off first ([`frontmatter::split`]), the remaining body is
//! tokenized ([`lexer::lex`]), parsed into a [`node::Node`] tree
//! ([`parser::parse`]), and finally walked by the [`executor`] against a
//! [`context::ContextAccessor`] implementation supplied by the caller.
//! Boolean conditions and `switch` subjects are themselves a small
//! expression sub-language with its own tokenizer/parser/evaluator under
//! [`expr`].
//!
//! Tags and expression functions are pluggable through the
//! [`registry::ResolverRegistry`] and [`registry::FunctionRegistry`]; the
//! reserved `prompty.*` namespace ships a built-in set under [`builtins`].
//! The [`Engine`] type packages both registries, engine-wide limits, and a
//! small template store used by `prompty.include`/`prompty.extends`.
//!
//! # Example
//!
//! ```
//! use prompty::{Engine, MapContext, Value};
//!
//! let engine = Engine::builder().build().unwrap();
//! let template = engine.compile("greeting", "Hello {~prompty.var name=\"who\" /~}!").unwrap();
//! let ctx = MapContext::new().insert("who", Value::str("world"));
//! assert_eq!(engine.render(&template, &ctx).unwrap(), "Hello world!");
//! ```

pub mod builtins;
pub mod cancel;
pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod expr;
pub mod frontmatter;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod position;
pub mod registry;
pub mod suggest;
pub mod value;

pub use cancel::CancellationToken;
pub use context::{ContextAccessor, ErrorStrategy, MapContext, ResolveContext};
pub use engine::{Engine, EngineBuilder, EngineConfig, Template};
pub use error::{Error, Result};
pub use node::Node;
pub use position::Position;
pub use registry::{FunctionRegistry, Resolver, ResolverRegistry};
pub use value::Value;

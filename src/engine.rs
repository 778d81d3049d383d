use crate::cancel::CancellationToken;
use crate::context::{ContextAccessor, ErrorStrategy};
use crate::error::{Error, Result};
use crate::frontmatter::{self, Frontmatter};
use crate::node::Node;
use crate::registry::{FunctionRegistry, Resolver, ResolverRegistry};
use crate::{executor, lexer, parser};
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

/// Fixed engine-wide limits and defaults, the same small `Copy` config
/// struct the rest of the crate's resolvers and the executor consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bounds structural recursion and include depth. `0` means unlimited.
    pub max_depth: usize,
    pub max_loop_iterations: usize,
    pub max_include_depth: usize,
    pub default_error_strategy: ErrorStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_loop_iterations: 10_000,
            max_include_depth: 100,
            default_error_strategy: ErrorStrategy::Throw,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
    include_depth_overridden: bool,
}

impl EngineConfigBuilder {
    pub fn max_depth(mut self, n: usize) -> Self {
        self.config.max_depth = n;
        if !self.include_depth_overridden {
            self.config.max_include_depth = n;
        }
        self
    }

    pub fn max_loop_iterations(mut self, n: usize) -> Self {
        self.config.max_loop_iterations = n;
        self
    }

    pub fn max_include_depth(mut self, n: usize) -> Self {
        self.config.max_include_depth = n;
        self.include_depth_overridden = true;
        self
    }

    pub fn default_error_strategy(mut self, s: ErrorStrategy) -> Self {
        self.config.default_error_strategy = s;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

/// A compiled, immutable template tree. Cheap to clone (wraps an `Arc`-free
/// owned tree) and safe to render repeatedly against different contexts.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    root: Node,
    frontmatter: Frontmatter,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frontmatter(&self) -> &Frontmatter {
        &self.frontmatter
    }

    pub(crate) fn root_children(&self) -> &[Node] {
        match &self.root {
            Node::Root { children } => children,
            _ => &[],
        }
    }

    /// Print the compiled tree to stdout, for development/debugging only.
    pub fn print_tree(&self) -> std::io::Result<()> {
        self.root.print()
    }
}

/// Owns the resolver/function registries and configuration, and a small
/// built-in template store used by `prompty.include`/`prompty.extends`.
/// Cheap to share: clone the `Arc` you build it behind rather than the
/// engine itself.
pub struct Engine {
    config: EngineConfig,
    resolvers: ResolverRegistry,
    functions: FunctionRegistry,
    templates: RwLock<IndexMap<String, Arc<Template>>>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Parse `source` into its own tree, without resolving `extends`
    /// against any template loader. Any `prompty.block` region in the
    /// result behaves as a plain named passthrough; `prompty.extends`
    /// itself is left as an unresolved tag and will fail with
    /// `UnknownTag` if executed; use [`Self::compile_with_inheritance`]
    /// for templates that extend another.
    pub fn compile(&self, name: impl Into<String>, source: &str) -> Result<Template> {
        let (frontmatter, root) = parse_source(source)?;
        Ok(Template { name: name.into(), root, frontmatter })
    }

    /// Parse `source` and, if it carries a `prompty.extends`, graft its
    /// block overrides onto the already-registered parent template (see
    /// [`Self::register_template`]). Multi-level inheritance works because
    /// the parent is itself fully resolved before being registered.
    pub fn compile_with_inheritance(&self, name: impl Into<String>, source: &str) -> Result<Template> {
        let name = name.into();
        let (frontmatter, root) = parse_source(source)?;
        let info = parser::extract_inheritance(&root)?;
        let children = match root {
            Node::Root { children } => children,
            _ => Vec::new(),
        };
        let Some((parent_name, pos)) = info.extends else {
            return Ok(Template { name, root: Node::Root { children }, frontmatter });
        };
        let parent = self.get_compiled(&parent_name).ok_or_else(|| Error::TemplateNotFound {
            pos,
            name: parent_name.clone(),
        })?;
        let merged = parser::merge_blocks(parent.root_children().to_vec(), &info.blocks);
        Ok(Template { name, root: Node::Root { children: merged }, frontmatter })
    }

    /// Compile and store `source` under `name` so later
    /// `prompty.include`/`prompty.extends` lookups can find it.
    pub fn register_template(&self, name: impl Into<String>, source: &str) -> Result<()> {
        let name = name.into();
        let template = self.compile_with_inheritance(name.clone(), source)?;
        self.templates
            .write()
            .expect("template store poisoned")
            .insert(name, Arc::new(template));
        Ok(())
    }

    pub fn get_compiled(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.read().expect("template store poisoned").get(name).cloned()
    }

    /// Render a compiled template against a context. Not cancellable; use
    /// [`Self::render_cancellable`] to pass an ambient cancellation token.
    pub fn render(&self, template: &Template, ctx: &dyn ContextAccessor) -> Result<String> {
        self.render_cancellable(template, ctx, &CancellationToken::new())
    }

    /// Render a compiled template against a context, checked against
    /// `cancel` before each resolver call and each `for` iteration.
    /// Cancellation always propagates as `Error::Cancelled`, regardless of
    /// any tag's error strategy.
    pub fn render_cancellable(
        &self,
        template: &Template,
        ctx: &dyn ContextAccessor,
        cancel: &CancellationToken,
    ) -> Result<String> {
        executor::execute(&template.root, ctx, self, cancel)
    }
}

fn parse_source(source: &str) -> Result<(Frontmatter, Node)> {
    let frontmatter = frontmatter::split(source)?;
    let tokens = lexer::lex(&frontmatter.template_body)?;
    let root = parser::parse(&frontmatter.template_body, &tokens)?;
    Ok((frontmatter, root))
}

/// Fluent construction of an [`Engine`]: configure limits, optionally add
/// custom resolvers/functions alongside the built-ins, then `.build()`.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    extra_resolvers: Vec<(String, Arc<dyn Resolver>)>,
    extra_functions: Vec<(
        String,
        usize,
        Option<usize>,
        Arc<dyn Fn(&[crate::value::Value]) -> std::result::Result<crate::value::Value, String> + Send + Sync>,
    )>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn register_resolver(mut self, name: impl Into<String>, resolver: Arc<dyn Resolver>) -> Self {
        self.extra_resolvers.push((name.into(), resolver));
        self
    }

    pub fn register_function(
        mut self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        func: impl Fn(&[crate::value::Value]) -> std::result::Result<crate::value::Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.extra_functions.push((name.into(), min_args, max_args, Arc::new(func)));
        self
    }

    pub fn build(self) -> Result<Engine> {
        let resolvers = ResolverRegistry::new();
        crate::builtins::register_resolvers(&resolvers);
        for (name, resolver) in self.extra_resolvers {
            resolvers.register(name, resolver)?;
        }

        let functions = FunctionRegistry::new();
        crate::builtins::register_functions(&functions);
        for (name, min_args, max_args, func) in self.extra_functions {
            functions.register(name, min_args, max_args, move |args| func(args))?;
        }

        Ok(Engine {
            config: self.config,
            resolvers,
            functions,
            templates: RwLock::new(IndexMap::new()),
        })
    }
}

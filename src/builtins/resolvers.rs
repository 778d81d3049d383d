use crate::context::{ContextAccessor, MapContext, ResolveContext};
use crate::error::{Error, Result};
use crate::node::Attributes;
use crate::position::Position;
use crate::registry::Resolver;

/// `{~prompty.var name="a.b" default="x" /~}` looks up a dotted path in
/// the context and renders it. Missing paths fall back to `default` when
/// present, otherwise error with a "did you mean" suggestion built from
/// whatever keys the context can enumerate.
pub struct VarResolver;

impl Resolver for VarResolver {
    fn resolve(&self, ctx: &dyn ContextAccessor, rc: &ResolveContext, attrs: &Attributes) -> Result<String> {
        let name = attrs
            .get("name")
            .ok_or(Error::MissingNameAttr(rc.pos))?;
        if let Some(value) = ctx.get(name) {
            return Ok(value.render());
        }
        if let Some(default) = attrs.get("default") {
            return Ok(default.clone());
        }
        let candidates = ctx.keys().unwrap_or_default();
        let suggestion = crate::suggest::suggest(name, &candidates);
        Err(Error::VariableNotFound {
            pos: rc.pos,
            name: name.clone(),
            suggestion,
        })
    }

    fn validate(&self, attrs: &Attributes, pos: Position) -> Result<()> {
        attrs.get("name").map(|_| ()).ok_or(Error::MissingNameAttr(pos))
    }
}

/// `{~prompty.env name="HOME" default="" /~}` reads a process environment
/// variable.
pub struct EnvResolver;

impl Resolver for EnvResolver {
    fn resolve(&self, _ctx: &dyn ContextAccessor, rc: &ResolveContext, attrs: &Attributes) -> Result<String> {
        let name = attrs
            .get("name")
            .ok_or(Error::MissingNameAttr(rc.pos))?;
        match std::env::var(name) {
            Ok(value) => Ok(value),
            Err(_) => match attrs.get("default") {
                Some(default) => Ok(default.clone()),
                None => Ok(String::new()),
            },
        }
    }

    fn validate(&self, attrs: &Attributes, pos: Position) -> Result<()> {
        attrs.get("name").map(|_| ()).ok_or(Error::MissingNameAttr(pos))
    }
}

/// Parses `with="alias=path,other=path.nested"` into `(alias, path)` pairs.
fn parse_with_bindings(spec: &str) -> Vec<(String, String)> {
    spec.split(',')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            let k = k.trim();
            let v = v.trim();
            if k.is_empty() || v.is_empty() {
                None
            } else {
                Some((k.to_string(), v.to_string()))
            }
        })
        .collect()
}

/// `{~prompty.include template="partial" with="a=user.name" isolate="true" /~}`
/// renders another named template, depth-bounded by the owning engine's
/// `max_include_depth`. `with` resolves each `alias=path`
/// pair against the caller's context and binds `alias` in the included
/// template's context; `isolate="true"` means the included template sees
/// only those bindings rather than the caller's ambient context.
pub struct IncludeResolver;

impl Resolver for IncludeResolver {
    fn resolve(&self, ctx: &dyn ContextAccessor, rc: &ResolveContext, attrs: &Attributes) -> Result<String> {
        let name = attrs
            .get("template")
            .ok_or(Error::MissingTemplateAttr(rc.pos))?;
        let engine = rc.engine.ok_or(Error::EngineNotAvailable(rc.pos))?;
        let max_include_depth = engine.config().max_include_depth;
        if max_include_depth != 0 && rc.depth >= max_include_depth {
            return Err(Error::DepthExceeded(rc.pos));
        }
        let template = engine
            .get_compiled(name)
            .ok_or_else(|| Error::TemplateNotFound {
                pos: rc.pos,
                name: name.clone(),
            })?;

        let bindings: Vec<(String, crate::value::Value)> = attrs
            .get("with")
            .map(|spec| parse_with_bindings(spec))
            .unwrap_or_default()
            .into_iter()
            .map(|(alias, path)| (alias, ctx.get(&path).unwrap_or(crate::value::Value::Nil)))
            .collect();

        let isolate = attrs.get("isolate").map(|s| s == "true").unwrap_or(false);

        if isolate {
            let mut isolated = MapContext::new();
            for (alias, value) in bindings {
                isolated = isolated.insert(alias, value);
            }
            return crate::executor::execute_nodes(template.root_children(), &isolated, engine, rc.depth + 1, rc.cancel);
        }

        if bindings.is_empty() {
            return crate::executor::execute_nodes(template.root_children(), ctx, engine, rc.depth + 1, rc.cancel);
        }
        let child_ctx = ctx.child(bindings).ok_or(Error::ForContextNoChild(rc.pos))?;
        crate::executor::execute_nodes(template.root_children(), child_ctx.as_ref(), engine, rc.depth + 1, rc.cancel)
    }

    fn validate(&self, attrs: &Attributes, pos: Position) -> Result<()> {
        attrs.get("template").map(|_| ()).ok_or(Error::MissingTemplateAttr(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::position::Position;
    use crate::value::Value;
    use once_cell::sync::Lazy;

    static NEVER: Lazy<CancellationToken> = Lazy::new(CancellationToken::new);

    fn rc(pos: Position) -> ResolveContext<'static> {
        ResolveContext { pos, depth: 0, engine: None, cancel: &NEVER }
    }

    #[test]
    fn var_resolves_dotted_path() {
        let ctx = MapContext::new().insert("name", Value::str("Ada"));
        let mut attrs = Attributes::new();
        attrs.insert("name".into(), "name".into());
        let out = VarResolver.resolve(&ctx, &rc(Position::new(0, 1, 1)), &attrs).unwrap();
        assert_eq!(out, "Ada");
    }

    #[test]
    fn var_missing_uses_default() {
        let ctx = MapContext::new();
        let mut attrs = Attributes::new();
        attrs.insert("name".into(), "missing".into());
        attrs.insert("default".into(), "fallback".into());
        let out = VarResolver.resolve(&ctx, &rc(Position::new(0, 1, 1)), &attrs).unwrap();
        assert_eq!(out, "fallback");
    }

    #[test]
    fn var_missing_without_default_errors_with_suggestion() {
        let ctx = MapContext::new().insert("nam", Value::str("x"));
        let mut attrs = Attributes::new();
        attrs.insert("name".into(), "name".into());
        let err = VarResolver.resolve(&ctx, &rc(Position::new(0, 1, 1)), &attrs).unwrap_err();
        assert!(matches!(err, Error::VariableNotFound { suggestion: Some(_), .. }));
    }

    #[test]
    fn validate_catches_a_missing_required_attribute() {
        let pos = Position::new(0, 1, 1);
        assert!(matches!(
            VarResolver.validate(&Attributes::new(), pos),
            Err(Error::MissingNameAttr(_))
        ));
        assert!(matches!(
            IncludeResolver.validate(&Attributes::new(), pos),
            Err(Error::MissingTemplateAttr(_))
        ));
        let mut ok = Attributes::new();
        ok.insert("name".into(), "x".into());
        assert!(VarResolver.validate(&ok, pos).is_ok());
    }

    #[test]
    fn include_without_engine_errors() {
        let ctx = MapContext::new();
        let mut attrs = Attributes::new();
        attrs.insert("template".into(), "partial".into());
        let err = IncludeResolver.resolve(&ctx, &rc(Position::new(0, 1, 1)), &attrs).unwrap_err();
        assert!(matches!(err, Error::EngineNotAvailable(_)));
    }

    #[test]
    fn include_with_binds_aliases_from_caller_context() {
        let engine = crate::engine::Engine::builder().build().unwrap();
        engine.register_template("partial", "hi {~prompty.var name=\"who\"/~}").unwrap();
        let template = engine
            .compile("t", "{~prompty.include template=\"partial\" with=\"who=user.name\" /~}")
            .unwrap();
        let inner = {
            let mut m = indexmap::IndexMap::new();
            m.insert("name".to_string(), Value::str("Ada"));
            Value::Map(m)
        };
        let ctx = MapContext::new().insert("user", inner);
        assert_eq!(engine.render(&template, &ctx).unwrap(), "hi Ada");
    }

    #[test]
    fn include_isolate_hides_ambient_context() {
        let engine = crate::engine::Engine::builder().build().unwrap();
        engine.register_template("partial", "{~prompty.var name=\"secret\" default=\"none\"/~}").unwrap();
        let template = engine
            .compile("t", "{~prompty.include template=\"partial\" isolate=\"true\" /~}")
            .unwrap();
        let ctx = MapContext::new().insert("secret", Value::str("leaked"));
        assert_eq!(engine.render(&template, &ctx).unwrap(), "none");
    }
}

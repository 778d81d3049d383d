use indexmap::IndexMap;
use prompty::{ContextAccessor, Engine, ErrorStrategy, MapContext, Value};

/// A `ContextAccessor` backed by `serde_json::Value`, standing in for a
/// real application's data layer the way the dev-dependency is used
/// elsewhere in the reference corpus: a convenient concrete JSON context
/// rather than something the crate itself depends on.
struct JsonContext {
    root: serde_json::Value,
    overlay: IndexMap<String, Value>,
}

impl JsonContext {
    fn new(root: serde_json::Value) -> Self {
        Self { root, overlay: IndexMap::new() }
    }
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::str(s.clone()),
        serde_json::Value::Array(a) => Value::List(a.iter().map(json_to_value).collect()),
        serde_json::Value::Object(o) => {
            let mut m = IndexMap::new();
            for (k, v) in o {
                m.insert(k.clone(), json_to_value(v));
            }
            Value::Map(m)
        }
    }
}

impl ContextAccessor for JsonContext {
    fn get(&self, path: &str) -> Option<Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        if let Some(v) = self.overlay.get(first) {
            let mut current = v.clone();
            for part in parts {
                current = match current {
                    Value::Map(ref m) => m.get(part)?.clone(),
                    _ => return None,
                };
            }
            return Some(current);
        }
        let mut current = self.root.get(first)?.clone();
        for part in parts {
            current = current.get(part)?.clone();
        }
        Some(json_to_value(&current))
    }

    fn keys(&self) -> Option<Vec<String>> {
        match &self.root {
            serde_json::Value::Object(o) => Some(o.keys().cloned().collect()),
            _ => None,
        }
    }

    fn child(&self, bindings: Vec<(String, Value)>) -> Option<Box<dyn ContextAccessor>> {
        let mut overlay = self.overlay.clone();
        for (k, v) in bindings {
            overlay.insert(k, v);
        }
        Some(Box::new(JsonContext { root: self.root.clone(), overlay }))
    }
}

#[test]
fn scenario_1_var_interpolation() {
    let engine = Engine::builder().build().unwrap();
    let template = engine.compile("t", r#"Hello {~prompty.var name="user" /~}!"#).unwrap();
    let ctx = JsonContext::new(serde_json::json!({"user": "Ada"}));
    assert_eq!(engine.render(&template, &ctx).unwrap(), "Hello Ada!");
}

#[test]
fn scenario_2_if_else() {
    let engine = Engine::builder().build().unwrap();
    let src = r#"{~prompty.if eval="n > 0"~}pos{~prompty.else~}nonpos{~/prompty.if~}"#;
    let template = engine.compile("t", src).unwrap();
    let pos_ctx = JsonContext::new(serde_json::json!({"n": 3}));
    assert_eq!(engine.render(&template, &pos_ctx).unwrap(), "pos");
    let nonpos_ctx = JsonContext::new(serde_json::json!({"n": 0}));
    assert_eq!(engine.render(&template, &nonpos_ctx).unwrap(), "nonpos");
}

#[test]
fn scenario_3_for_loop() {
    let engine = Engine::builder().build().unwrap();
    let src = r#"{~prompty.for item="x" in="items"~}[{~prompty.var name="x"/~}]{~/prompty.for~}"#;
    let template = engine.compile("t", src).unwrap();
    let ctx = JsonContext::new(serde_json::json!({"items": ["a", "b", "c"]}));
    assert_eq!(engine.render(&template, &ctx).unwrap(), "[a][b][c]");
}

#[test]
fn scenario_4_switch_case() {
    let engine = Engine::builder().build().unwrap();
    let src = r#"{~prompty.switch eval="role"~}{~prompty.case value="admin"~}A{~/prompty.case~}{~prompty.case value="user"~}U{~/prompty.case~}{~prompty.casedefault~}?{~/prompty.casedefault~}{~/prompty.switch~}"#;
    let template = engine.compile("t", src).unwrap();
    let user_ctx = JsonContext::new(serde_json::json!({"role": "user"}));
    assert_eq!(engine.render(&template, &user_ctx).unwrap(), "U");
    let other_ctx = JsonContext::new(serde_json::json!({"role": "other"}));
    assert_eq!(engine.render(&template, &other_ctx).unwrap(), "?");
}

#[test]
fn scenario_5_var_default_fallback() {
    let engine = Engine::builder().build().unwrap();
    let template = engine.compile("t", r#"{~prompty.var name="missing" default="fallback" /~}"#).unwrap();
    let ctx = JsonContext::new(serde_json::json!({}));
    assert_eq!(engine.render(&template, &ctx).unwrap(), "fallback");
}

#[test]
fn scenario_6_escaped_tag_is_literal_text() {
    let engine = Engine::builder().build().unwrap();
    let template = engine.compile("t", r#"\{~prompty.var name="x"/~}"#).unwrap();
    let ctx = MapContext::new();
    assert_eq!(engine.render(&template, &ctx).unwrap(), r#"{~prompty.var name="x"/~}"#);
}

#[test]
fn scenario_7_raw_block_ignores_context() {
    let engine = Engine::builder().build().unwrap();
    let template = engine.compile("t", r#"{~prompty.raw~}{~prompty.var name="x"/~}{~/prompty.raw~}"#).unwrap();
    let ctx = JsonContext::new(serde_json::json!({"x": "should not appear"}));
    assert_eq!(engine.render(&template, &ctx).unwrap(), r#"{~prompty.var name="x"/~}"#);
}

#[test]
fn scenario_8_frontmatter_split() {
    let fm = prompty::frontmatter::split("---\nname: t\n---\nBody").unwrap();
    assert!(fm.has_frontmatter);
    assert_eq!(fm.frontmatter_yaml, "name: t");
    assert_eq!(fm.template_body, "Body");
}

#[test]
fn scenario_9_onerror_default_substitutes_default_attr() {
    let engine = Engine::builder().build().unwrap();
    let template = engine
        .compile("t", r#"{~prompty.var name="unknown" onerror="default" default="x"/~}"#)
        .unwrap();
    let ctx = JsonContext::new(serde_json::json!({}));
    assert_eq!(engine.render(&template, &ctx).unwrap(), "x");
}

#[test]
fn nested_collections_render_via_dot_paths() {
    let engine = Engine::builder().build().unwrap();
    let template = engine.compile("t", r#"{~prompty.var name="user.profile.name" /~}"#).unwrap();
    let ctx = JsonContext::new(serde_json::json!({"user": {"profile": {"name": "Grace"}}}));
    assert_eq!(engine.render(&template, &ctx).unwrap(), "Grace");
}

#[test]
fn expression_functions_are_reachable_from_conditions() {
    let engine = Engine::builder().build().unwrap();
    let src = r#"{~prompty.if eval="upper(name) == \"ADA\""~}match{~prompty.else~}no{~/prompty.if~}"#;
    let template = engine.compile("t", src).unwrap();
    let ctx = JsonContext::new(serde_json::json!({"name": "ada"}));
    assert_eq!(engine.render(&template, &ctx).unwrap(), "match");
}

#[test]
fn custom_resolver_and_function_are_consulted() {
    use std::sync::Arc;

    struct ShoutResolver;
    impl prompty::Resolver for ShoutResolver {
        fn resolve(
            &self,
            _ctx: &dyn ContextAccessor,
            _rc: &prompty::ResolveContext,
            attrs: &prompty::node::Attributes,
        ) -> prompty::Result<String> {
            Ok(attrs.get("text").cloned().unwrap_or_default().to_uppercase())
        }
    }

    let engine = Engine::builder()
        .register_resolver("app.shout", Arc::new(ShoutResolver))
        .register_function("double", 1, Some(1), |args| {
            args[0].as_f64().map(|f| Value::Float(f * 2.0)).ok_or_else(|| "expected a number".to_string())
        })
        .build()
        .unwrap();

    let template = engine.compile("t", r#"{~app.shout text="hi" /~}"#).unwrap();
    let ctx = MapContext::new();
    assert_eq!(engine.render(&template, &ctx).unwrap(), "HI");

    let expr_template = engine.compile("t2", r#"{~prompty.if eval="double(n) == 10"~}yes{~prompty.else~}no{~/prompty.if~}"#).unwrap();
    let ctx2 = MapContext::new().insert("n", Value::Int(5));
    assert_eq!(engine.render(&expr_template, &ctx2).unwrap(), "yes");
}

#[test]
fn default_error_strategy_throws() {
    let engine = Engine::builder().build().unwrap();
    let template = engine.compile("t", r#"{~prompty.var name="missing" /~}"#).unwrap();
    let ctx = MapContext::new();
    assert!(engine.render(&template, &ctx).is_err());
}

#[test]
fn context_level_error_strategy_overrides_default() {
    struct LoggingMapContext(MapContext);
    impl ContextAccessor for LoggingMapContext {
        fn get(&self, path: &str) -> Option<Value> {
            self.0.get(path)
        }
        fn keys(&self) -> Option<Vec<String>> {
            self.0.keys()
        }
        fn error_strategy(&self) -> Option<ErrorStrategy> {
            Some(ErrorStrategy::Remove)
        }
    }

    let engine = Engine::builder().build().unwrap();
    let template = engine.compile("t", r#"before{~prompty.var name="missing" /~}after"#).unwrap();
    let ctx = LoggingMapContext(MapContext::new());
    assert_eq!(engine.render(&template, &ctx).unwrap(), "beforeafter");
}

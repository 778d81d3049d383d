mod error_strategy;

use crate::cancel::CancellationToken;
use crate::context::{ContextAccessor, ResolveContext};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::node::{Attributes, Node};
use crate::position::Position;
use crate::value::Value;

/// Render a compiled tree against a context, starting at depth 0.
pub fn execute(root: &Node, ctx: &dyn ContextAccessor, engine: &Engine, cancel: &CancellationToken) -> Result<String> {
    let children = match root {
        Node::Root { children } => children,
        other => std::slice::from_ref(other),
    };
    execute_nodes(children, ctx, engine, 0, cancel)
}

/// Render a sibling list at a given nesting depth. Checked against
/// `max_depth` here rather than per-tag, so a chain of nested
/// conditionals/loops/switches/blocks with no intervening directive tag
/// still trips the bound.
pub fn execute_nodes(
    nodes: &[Node],
    ctx: &dyn ContextAccessor,
    engine: &Engine,
    depth: usize,
    cancel: &CancellationToken,
) -> Result<String> {
    let max_depth = engine.config().max_depth;
    if max_depth != 0 && depth > max_depth {
        let pos = nodes.first().map(Node::pos).unwrap_or_else(|| Position::new(0, 1, 1));
        return Err(Error::MaxDepthExceeded(pos));
    }
    let mut out = String::new();
    for node in nodes {
        out.push_str(&execute_node(node, ctx, engine, depth, cancel)?);
    }
    Ok(out)
}

fn execute_node(node: &Node, ctx: &dyn ContextAccessor, engine: &Engine, depth: usize, cancel: &CancellationToken) -> Result<String> {
    match node {
        Node::Text { content, .. } => Ok(content.clone()),
        Node::Tag {
            name,
            attributes,
            children,
            raw_content,
            raw_source,
            pos,
            ..
        } => execute_tag(name, attributes, children, raw_content.as_deref(), raw_source, *pos, ctx, engine, depth, cancel),
        Node::Conditional { branches } => execute_conditional(branches, ctx, engine, depth, cancel),
        Node::For {
            item_var,
            index_var,
            source,
            limit,
            children,
            pos,
        } => execute_for(item_var, index_var.as_deref(), source, *limit, children, *pos, ctx, engine, depth, cancel),
        Node::Switch {
            expression,
            cases,
            default,
            pos,
        } => execute_switch(expression, cases, default.as_ref(), *pos, ctx, engine, depth, cancel),
        Node::Block { children, .. } => execute_nodes(children, ctx, engine, depth, cancel),
        Node::Root { children } => execute_nodes(children, ctx, engine, depth, cancel),
    }
}

#[allow(clippy::too_many_arguments)]
fn execute_tag(
    name: &str,
    attrs: &Attributes,
    children: &[Node],
    raw_content: Option<&str>,
    raw_source: &str,
    pos: Position,
    ctx: &dyn ContextAccessor,
    engine: &Engine,
    depth: usize,
    cancel: &CancellationToken,
) -> Result<String> {
    if name == "prompty.raw" {
        return Ok(raw_content.unwrap_or_default().to_string());
    }

    let strategy = error_strategy::resolve(attrs, ctx, engine.config().default_error_strategy);

    let resolver = match engine.resolvers().get(name) {
        Some(r) => r,
        None => {
            let suggestion = crate::suggest::suggest(name, &engine.resolvers().list());
            return error_strategy::apply(
                Error::UnknownTag { pos, name: name.to_string(), suggestion },
                strategy,
                attrs,
                raw_source,
                name,
            );
        }
    };

    if let Err(err) = resolver.validate(attrs, pos) {
        return error_strategy::apply(
            Error::ResolverFailed { pos, name: name.to_string(), source: Box::new(err) },
            strategy,
            attrs,
            raw_source,
            name,
        );
    }

    if cancel.is_cancelled() {
        return Err(Error::Cancelled(pos));
    }

    let rc = ResolveContext { pos, depth, engine: Some(engine), cancel };
    let resolved = match resolver.resolve(ctx, &rc, attrs) {
        Ok(s) => s,
        Err(Error::Cancelled(p)) => return Err(Error::Cancelled(p)),
        Err(err) => {
            return error_strategy::apply(
                Error::ResolverFailed { pos, name: name.to_string(), source: Box::new(err) },
                strategy,
                attrs,
                raw_source,
                name,
            );
        }
    };

    if children.is_empty() {
        Ok(resolved)
    } else {
        Ok(resolved + &execute_nodes(children, ctx, engine, depth + 1, cancel)?)
    }
}

fn execute_conditional(
    branches: &[crate::node::Branch],
    ctx: &dyn ContextAccessor,
    engine: &Engine,
    depth: usize,
    cancel: &CancellationToken,
) -> Result<String> {
    for branch in branches {
        let taken = match &branch.condition {
            None => true,
            Some(expr_src) => crate::expr::evaluate_to_bool(expr_src, ctx, engine.functions()).map_err(|e| {
                Error::CondExprFailed { pos: branch.pos, source: Box::new(e) }
            })?,
        };
        if taken {
            return execute_nodes(&branch.children, ctx, engine, depth + 1, cancel);
        }
    }
    Ok(String::new())
}

#[allow(clippy::too_many_arguments)]
fn execute_for(
    item_var: &str,
    index_var: Option<&str>,
    source: &str,
    limit: Option<usize>,
    children: &[Node],
    pos: Position,
    ctx: &dyn ContextAccessor,
    engine: &Engine,
    depth: usize,
    cancel: &CancellationToken,
) -> Result<String> {
    let collection = ctx.get(source).ok_or_else(|| Error::ForCollectionPath { pos, path: source.to_string() })?;

    let items: Vec<(Value, Value)> = match &collection {
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (Value::Int(i as i64), v.clone()))
            .collect(),
        Value::Map(_) => collection
            .sorted_map_entries()
            .into_iter()
            .map(|(k, v)| (Value::str(k), v.clone()))
            .collect(),
        other => {
            return Err(Error::ForNotIterable { pos, path: source.to_string(), type_name: other.type_name() });
        }
    };

    // An explicit `limit` truncates at its value; the engine ceiling is an
    // error on both paths, never a silent cut-off.
    let max_loop = engine.config().max_loop_iterations;
    let mut out = String::new();
    for (i, (index_val, item_val)) in items.into_iter().enumerate() {
        if limit.is_some_and(|l| i >= l) {
            break;
        }
        if i >= max_loop {
            return Err(Error::MaxLoopIterationsExceeded(pos));
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled(pos));
        }
        let mut bindings = vec![(item_var.to_string(), item_val)];
        if let Some(idx_name) = index_var {
            bindings.push((idx_name.to_string(), index_val));
        }
        let child_ctx = ctx.child(bindings).ok_or(Error::ForContextNoChild(pos))?;
        out.push_str(&execute_nodes(children, child_ctx.as_ref(), engine, depth + 1, cancel)?);
    }
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn execute_switch(
    expression: &str,
    cases: &[crate::node::Case],
    default: Option<&crate::node::Case>,
    pos: Position,
    ctx: &dyn ContextAccessor,
    engine: &Engine,
    depth: usize,
    cancel: &CancellationToken,
) -> Result<String> {
    let subject = crate::expr::parse(expression)
        .and_then(|e| crate::expr::evaluate(&e, ctx, engine.functions()))
        .map_err(|e| Error::CondExprFailed { pos, source: Box::new(e) })?;
    let subject_str = subject.render();

    for case in cases {
        let matched = if let Some(value_src) = &case.value {
            subject_str == *value_src
        } else if let Some(eval_src) = &case.eval {
            crate::expr::evaluate_to_bool(eval_src, ctx, engine.functions())
                .map_err(|e| Error::CondExprFailed { pos: case.pos, source: Box::new(e) })?
        } else {
            false
        };
        if matched {
            return execute_nodes(&case.children, ctx, engine, depth + 1, cancel);
        }
    }
    if let Some(d) = default {
        return execute_nodes(&d.children, ctx, engine, depth + 1, cancel);
    }
    Ok(String::new())
}

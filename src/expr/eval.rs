use super::{BinaryOp, Expr, UnaryOp};
use crate::context::ContextAccessor;
use crate::error::{Error, Result};
use crate::registry::function::FunctionRegistry;
use crate::value::Value;

/// Evaluate a parsed expression tree against a context and function
/// registry, returning its raw value (used directly by `switch`, and
/// reduced to truthiness by `if`/`elseif`/`case`).
pub fn evaluate(expr: &Expr, ctx: &dyn ContextAccessor, funcs: &FunctionRegistry) -> Result<Value> {
    match expr {
        Expr::Literal { value, .. } => Ok(value.clone()),
        Expr::Identifier { name, .. } => Ok(ctx.get(name).unwrap_or(Value::Nil)),
        Expr::Unary { op, right, .. } => {
            let v = evaluate(right, ctx, funcs)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
            }
        }
        Expr::Binary { op, left, right, pos } => match op {
            BinaryOp::And => {
                let l = evaluate(left, ctx, funcs)?;
                if !l.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(evaluate(right, ctx, funcs)?.is_truthy()))
            }
            BinaryOp::Or => {
                let l = evaluate(left, ctx, funcs)?;
                if l.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(evaluate(right, ctx, funcs)?.is_truthy()))
            }
            BinaryOp::Eq => {
                let l = evaluate(left, ctx, funcs)?;
                let r = evaluate(right, ctx, funcs)?;
                Ok(Value::Bool(l.loose_eq(&r)))
            }
            BinaryOp::Neq => {
                let l = evaluate(left, ctx, funcs)?;
                let r = evaluate(right, ctx, funcs)?;
                Ok(Value::Bool(!l.loose_eq(&r)))
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Lte | BinaryOp::Gte => {
                let l = evaluate(left, ctx, funcs)?;
                let r = evaluate(right, ctx, funcs)?;
                let ord = l.partial_cmp_loose(&r).ok_or_else(|| Error::TypeComparison {
                    pos: *pos,
                    lhs: l.type_name(),
                    rhs: r.type_name(),
                })?;
                use std::cmp::Ordering::*;
                let result = match (op, ord) {
                    (BinaryOp::Lt, Less) => true,
                    (BinaryOp::Gt, Greater) => true,
                    (BinaryOp::Lte, Less | Equal) => true,
                    (BinaryOp::Gte, Greater | Equal) => true,
                    _ => false,
                };
                Ok(Value::Bool(result))
            }
        },
        Expr::Call { name, args, pos } => {
            let mut values = Vec::with_capacity(args.len());
            for a in args {
                values.push(evaluate(a, ctx, funcs)?);
            }
            funcs.call(name, values, *pos)
        }
    }
}

/// Convenience: parse and evaluate to a boolean via truthiness, used by
/// `if`/`elseif`/`case`.
pub fn evaluate_to_bool(src: &str, ctx: &dyn ContextAccessor, funcs: &FunctionRegistry) -> Result<bool> {
    let expr = super::parse(src)?;
    Ok(evaluate(&expr, ctx, funcs)?.is_truthy())
}

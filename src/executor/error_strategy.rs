use crate::context::{ContextAccessor, ErrorStrategy};
use crate::error::Error;
use crate::node::Attributes;

/// Resolve the effective strategy for a tag: its own `onerror` attribute
/// wins, then the context's override, then the engine-wide default.
pub fn resolve(attrs: &Attributes, ctx: &dyn ContextAccessor, engine_default: ErrorStrategy) -> ErrorStrategy {
    attrs
        .get("onerror")
        .and_then(|s| ErrorStrategy::parse(s))
        .or_else(|| ctx.error_strategy())
        .unwrap_or(engine_default)
}

/// Turn a tag failure into either a propagated error or a substitute
/// string, per `strategy`. `raw_source` backs `keepraw`.
pub fn apply(
    err: Error,
    strategy: ErrorStrategy,
    attrs: &Attributes,
    raw_source: &str,
    tag_name: &str,
) -> crate::error::Result<String> {
    match strategy {
        ErrorStrategy::Throw => Err(err),
        ErrorStrategy::Default => Ok(attrs.get("default").cloned().unwrap_or_default()),
        ErrorStrategy::Remove => Ok(String::new()),
        ErrorStrategy::KeepRaw => Ok(raw_source.to_string()),
        ErrorStrategy::Log => {
            log::warn!(target: "prompty::executor", "suppressed error in `{}`: {}", tag_name, err);
            Ok(String::new())
        }
    }
}

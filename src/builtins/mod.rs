pub mod functions;
pub mod resolvers;

use crate::registry::{FunctionRegistry, ResolverRegistry};
use std::sync::Arc;

/// Register every reserved `prompty.*` resolver. `prompty.raw` is handled
/// directly by the executor (its content is captured verbatim at parse
/// time) and needs no resolver; the structural tags (`if`/`for`/`switch`/
/// `block`/`extends`) are likewise executed directly rather than through
/// the registry.
pub fn register_resolvers(reg: &ResolverRegistry) {
    reg.must_register("prompty.var", Arc::new(resolvers::VarResolver));
    reg.must_register("prompty.env", Arc::new(resolvers::EnvResolver));
    reg.must_register("prompty.include", Arc::new(resolvers::IncludeResolver));
}

pub fn register_functions(reg: &FunctionRegistry) {
    functions::register_all(reg);
}

pub mod collection;
pub mod datetime;
pub mod string;
pub mod type_ops;
pub mod utility;

use crate::registry::FunctionRegistry;

/// Register every built-in expression function on a fresh registry. Called
/// once per [`crate::engine::EngineBuilder::build`].
pub fn register_all(reg: &FunctionRegistry) {
    string::register(reg);
    collection::register(reg);
    type_ops::register(reg);
    utility::register(reg);
    datetime::register(reg);
}

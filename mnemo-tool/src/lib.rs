#![deny(missing_docs)]
//! The tool schema and executor (C4): dispatches model-emitted tool
//! calls onto the memory context.

pub mod executor;
pub mod schema;

pub use executor::Executor;
pub use schema::tool_schema;

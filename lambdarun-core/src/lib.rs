//! Core types for lambdarun
//!
//! This crate provides the result and error types shared by the invoker and the CLI.

pub mod error;
pub mod invocation_id;
pub mod result;

pub use error::InvokeError;
pub use invocation_id::InvocationId;
pub use result::RunResult;

//! Wire protocol types shared by every Demarch SDK.
//!
//! The only type that matters here is [`ToolError`]: a structured error
//! contract whose JSON form must stay byte-identical across the Go,
//! Python, and Rust SDKs so that agents can branch on failures without
//! parsing message text.

mod toolerror;

pub use toolerror::{ErrorKind, ToolError};

//! Core domain types shared across the crate.

mod exploit;
mod session;
mod target;

pub use exploit::{ExecutionResult, Exploit, ExploitKind, ResultCode};
pub use session::Session;
pub use target::TargetAddr;

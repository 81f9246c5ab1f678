//! scriptcreds - Script-driven HTTP credential cache
//!
//! Keeps a set of HTTP headers and a cookie fresh by running user-supplied
//! shell commands on a renew-interval policy, and publishes private copies
//! into per-request handles just before each outbound request.

pub mod config;
pub mod error;
pub mod scripts;

pub use error::{ScriptCredsError, ScriptCredsResult};
pub use scripts::{RequestHandle, ScriptCache, ScriptKind};

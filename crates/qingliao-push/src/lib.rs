//! # qingliao-push
//!
//! Message intake for the Qingliao push service. Wraps the envelope model
//! from `qingliao-shared` with the rules that depend on who is sending:
//! sender and receiver lookup, group membership, self-messaging, size limits
//! and client retries.

pub mod config;
pub mod directory;
pub mod dispatch;

mod error;

pub use config::PushConfig;
pub use directory::{Directory, MemoryDirectory};
pub use dispatch::{MessageDispatcher, Submission};
pub use error::PushError;

pub mod core;
mod errors;
pub mod message;
pub mod queue;
pub mod reader;
pub mod shutdown;
pub mod writer;

#[cfg(test)]
mod tests;

pub use errors::{failure_message, ConfigError, MsgqError, ALL_FAILURES};
pub use message::{tag_name, Message, MessageTag};
pub use queue::{MessageQueue, PutStatus};

pub const DEFAULT_CAPACITY: u32 = core::DEFAULT_CAPACITY;

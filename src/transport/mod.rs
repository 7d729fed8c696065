//! The Streamable HTTP transport's session bookkeeping: persisted session
//! identity and state, this-process transport handles, and the replay
//! engine that reconciles the two across instances.

pub mod registry;
pub mod replay;
pub mod session;

//! Parley application library: the conversation session driving repeated
//! listen, classify, dispatch, speak cycles.

pub mod session;

pub use session::{
    ConversationEntry, ConversationSession, SessionConfig, SessionContext, SessionStopHandle,
};

pub mod storage;
pub mod types;

pub use storage::ConversationLog;
pub use types::{Message, Role};

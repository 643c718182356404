//! UI components

pub mod debug_panel;
pub mod header;
pub mod input_bar;
pub mod message_list;

pub use debug_panel::DebugPanel;
pub use header::Header;
pub use input_bar::InputBar;
pub use message_list::MessageList;

pub mod adapter;
pub mod allow;
pub mod context;
pub mod error;
pub mod escape;
pub mod handler;
pub mod relay;
pub mod send;
pub mod typing;

pub use adapter::TelegramAdapter;
pub use context::BridgeState;
pub use error::TelegramError;
pub use relay::MessageSink;

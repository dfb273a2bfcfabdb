/// Errors produced by the Telegram side of the bridge.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("teloxide error: {0}")]
    Teloxide(#[from] teloxide::RequestError),

    #[error("message delivery failed: {0}")]
    Delivery(String),
}

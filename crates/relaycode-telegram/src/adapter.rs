//! Telegram adapter.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling event
//! loop until the process exits. Long polling — no public URL required.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use relaycode_core::config::TelegramConfig;

use crate::context::BridgeState;
use crate::handler::handle_message;

/// Long-polling Telegram front end of the bridge.
pub struct TelegramAdapter {
    state: Arc<BridgeState>,
    config: TelegramConfig,
}

impl TelegramAdapter {
    pub fn new(config: &TelegramConfig, state: Arc<BridgeState>) -> Self {
        Self {
            state,
            config: config.clone(),
        }
    }

    /// Connect to Telegram and drive the long-polling loop.
    ///
    /// Never returns — runs for the lifetime of the process.
    pub async fn run(self) {
        let bot = Bot::new(&self.config.bot_token);

        info!("starting long-polling dispatcher");

        let handler = Update::filter_message().endpoint(handle_message);

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![self.state, self.config])
            .default_handler(|_upd| async {})
            .build()
            .dispatch()
            .await;
    }
}

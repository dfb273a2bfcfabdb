//! Shared state handed to the Telegram handler via the dptree dependency map.

use relaycode_agent::AgentInvoker;
use relaycode_sessions::SessionRegistry;

/// Everything the handler needs besides the bot and the incoming message.
pub struct BridgeState {
    pub invoker: AgentInvoker,
    pub sessions: SessionRegistry,
}

impl BridgeState {
    pub fn new(invoker: AgentInvoker) -> Self {
        Self {
            invoker,
            sessions: SessionRegistry::new(),
        }
    }
}

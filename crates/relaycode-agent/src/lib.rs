pub mod error;
pub mod event;
pub mod invoker;

pub use error::AgentError;
pub use event::AgentEvent;
pub use invoker::{
    run_args, session_list_args, AgentInvoker, AgentStream, CommandOutput, SessionInfo, StreamExit,
};

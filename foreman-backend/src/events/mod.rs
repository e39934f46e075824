pub mod bus;
pub mod dispatcher;
pub mod handlers;
pub mod types;

pub use bus::EventBus;
pub use dispatcher::{DispatchSummary, ReactionDispatcher, ReactionOutcome};
pub use handlers::{create_default_handlers, HandlerRegistry, ReactionHandler};
pub use types::{AgentEvent, EventPriority, EventType};

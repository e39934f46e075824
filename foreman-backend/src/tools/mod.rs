pub mod builtin;
pub mod registry;
pub mod types;

pub use registry::{Tool, ToolRegistry};
pub use types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};

use std::sync::Arc;

/// Create a registry with all built-in department tools registered.
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(builtin::OpenDealsTool::new()));
    registry.register(Arc::new(builtin::ClientLookupTool::new()));
    registry.register(Arc::new(builtin::TicketLookupTool::new()));
    registry.register(Arc::new(builtin::ListTicketsTool::new()));
    registry.register(Arc::new(builtin::RecentDeploymentsTool::new()));
    registry.register(Arc::new(builtin::ActivitySummaryTool::new()));

    log::info!("[TOOLS] Registered {} built-in tools", registry.len());
    registry
}

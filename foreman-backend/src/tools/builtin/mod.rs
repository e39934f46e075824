mod activity_summary;
mod client_lookup;
mod list_tickets;
mod open_deals;
mod recent_deployments;
mod ticket_lookup;

pub use activity_summary::ActivitySummaryTool;
pub use client_lookup::ClientLookupTool;
pub use list_tickets::ListTicketsTool;
pub use open_deals::OpenDealsTool;
pub use recent_deployments::RecentDeploymentsTool;
pub use ticket_lookup::TicketLookupTool;

/// Static configuration for one department agent.
#[derive(Debug, Clone, Copy)]
pub struct DepartmentConfig {
    /// Stable key used in requests and audit rows
    pub key: &'static str,
    pub display_name: &'static str,
    /// The agent persona name, used for event routing and attribution
    pub agent_name: &'static str,
    pub system_prompt: &'static str,
    /// Tool names this department's agent may call
    pub tools: &'static [&'static str],
}

pub const DEPARTMENTS: &[DepartmentConfig] = &[
    DepartmentConfig {
        key: "sales",
        display_name: "Sales",
        agent_name: "Sales AI",
        system_prompt: "You are Sales AI, the sales agent for a web agency. You track deals, \
                        follow up with prospects, and keep an eye on client health. Use your \
                        tools to ground every answer in current pipeline data. Be concise and \
                        concrete; quote deal ids and amounts when you have them.",
        tools: &["open_deals", "client_lookup", "activity_summary"],
    },
    DepartmentConfig {
        key: "engineering",
        display_name: "Engineering",
        agent_name: "Engineering AI",
        system_prompt: "You are Engineering AI, the engineering agent for a web agency. You \
                        triage tickets, scope build work, and investigate automation failures. \
                        Use your tools to look up tickets and recent activity before answering. \
                        Be precise; reference ticket ids and platforms.",
        tools: &["ticket_lookup", "list_tickets", "activity_summary"],
    },
    DepartmentConfig {
        key: "delivery",
        display_name: "Delivery",
        agent_name: "Delivery AI",
        system_prompt: "You are Delivery AI, the delivery agent for a web agency. You shepherd \
                        approved work through build and deployment and keep clients informed of \
                        progress. Use your tools to check ticket state and recent deployments. \
                        Report status plainly with dates and ticket ids.",
        tools: &["ticket_lookup", "list_tickets", "recent_deployments", "activity_summary"],
    },
    DepartmentConfig {
        key: "operations",
        display_name: "Operations",
        agent_name: "Operations AI",
        system_prompt: "You are Operations AI, the operations agent for a web agency. You watch \
                        the whole business: pipeline, workload, and client risk. Use your tools \
                        to pull cross-department activity before drawing conclusions. Surface \
                        anything that needs a human decision.",
        tools: &["open_deals", "list_tickets", "recent_deployments", "activity_summary"],
    },
];

/// Look up a department by its stable key.
pub fn get_department(key: &str) -> Option<&'static DepartmentConfig> {
    DEPARTMENTS.iter().find(|d| d.key == key)
}

/// Look up a department by its agent persona name.
pub fn department_for_agent(agent_name: &str) -> Option<&'static DepartmentConfig> {
    DEPARTMENTS.iter().find(|d| d.agent_name == agent_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_departments_resolve_by_key_and_agent_name() {
        for dept in DEPARTMENTS {
            assert_eq!(get_department(dept.key).map(|d| d.key), Some(dept.key));
            assert_eq!(
                department_for_agent(dept.agent_name).map(|d| d.key),
                Some(dept.key)
            );
        }
        assert!(get_department("marketing").is_none());
    }

    #[test]
    fn department_tools_are_all_registered() {
        let registry = crate::tools::create_default_registry();
        for dept in DEPARTMENTS {
            for tool in dept.tools {
                assert!(registry.has_tool(tool), "unregistered tool: {}", tool);
            }
        }
    }
}

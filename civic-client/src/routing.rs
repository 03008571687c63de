//! Post-login navigation

use shared::models::Role;

pub const CITIZEN_DASHBOARD: &str = "/citizen/dashboard";
pub const OFFICER_DASHBOARD: &str = "/officer/dashboard";

/// Landing page for a role
pub fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::GovernmentOfficer => OFFICER_DASHBOARD,
        Role::Citizen | Role::Admin => CITIZEN_DASHBOARD,
    }
}

/// Same as [`dashboard_path`] for a raw role string; unknown roles land on
/// the citizen dashboard
pub fn dashboard_path_for(role: &str) -> &'static str {
    role.parse::<Role>()
        .map(dashboard_path)
        .unwrap_or(CITIZEN_DASHBOARD)
}

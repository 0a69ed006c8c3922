use serde::Serialize;

use crate::models::User;

// ============================================================================
// Role Resolver
// ============================================================================

pub const MANAGER_GROUP: &str = "Manager";
pub const DELIVERY_CREW_GROUP: &str = "Delivery crew";

/// Role used for every authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Manager,
    DeliveryCrew,
    Customer,
}

impl Role {
    /// Manager membership wins over Delivery crew; no membership means Customer.
    pub fn resolve(user: &User) -> Self {
        if user.in_group(MANAGER_GROUP) {
            Role::Manager
        } else if user.in_group(DELIVERY_CREW_GROUP) {
            Role::DeliveryCrew
        } else {
            Role::Customer
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::DeliveryCrew => "delivery_crew",
            Role::Customer => "customer",
        }
    }
}

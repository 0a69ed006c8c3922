use uuid::Uuid;

use crate::domain::role::Role;
use crate::models::{Order, OrderStatus, User};
use super::commands::{OrderCommand, DELIVERY_CREW_FIELD, STATUS_FIELD};
use super::errors::OrderError;

// ============================================================================
// Order Access Policy
// ============================================================================

/// The partition of orders a requester may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    AssignedTo(Uuid),
    OwnedBy(Uuid),
}

impl OrderScope {
    pub fn for_requester(user: &User, role: Role) -> Self {
        match role {
            Role::Manager => OrderScope::All,
            Role::DeliveryCrew => OrderScope::AssignedTo(user.id),
            Role::Customer => OrderScope::OwnedBy(user.id),
        }
    }

    pub fn contains(&self, order: &Order) -> bool {
        match self {
            OrderScope::All => true,
            OrderScope::AssignedTo(crew) => order.delivery_crew == Some(*crew),
            OrderScope::OwnedBy(owner) => order.user == *owner,
        }
    }

    pub fn owner(&self) -> Option<Uuid> {
        match self {
            OrderScope::OwnedBy(owner) => Some(*owner),
            _ => None,
        }
    }

    pub fn assignee(&self) -> Option<Uuid> {
        match self {
            OrderScope::AssignedTo(crew) => Some(*crew),
            _ => None,
        }
    }
}

// ============================================================================
// Order Mutation Policy
// ============================================================================

/// Fields each role may name in a partial update.
pub fn patchable_fields(role: Role) -> &'static [&'static str] {
    match role {
        Role::Manager => &[STATUS_FIELD, DELIVERY_CREW_FIELD],
        Role::DeliveryCrew => &[STATUS_FIELD],
        Role::Customer => &[],
    }
}

/// Decides whether `role` may issue `command` at all. Runs before any lookup
/// or write; a request naming one forbidden field is refused as a whole.
pub fn authorize(role: Role, command: &OrderCommand) -> Result<(), OrderError> {
    match (role, command) {
        (Role::Customer, _) => Err(OrderError::NotAuthorized),

        (Role::Manager, OrderCommand::Replace(_) | OrderCommand::Delete) => Ok(()),
        (Role::DeliveryCrew, OrderCommand::Replace(_) | OrderCommand::Delete) => {
            Err(OrderError::NotAuthorized)
        }

        (_, OrderCommand::Patch(patch)) => {
            let allowed = patchable_fields(role);
            if !patch.fields().iter().all(|field| allowed.contains(field)) {
                return Err(OrderError::NotAuthorized);
            }
            // Delivery crew may not reset an order to pending.
            if role == Role::DeliveryCrew && patch.requested_status() == Some(OrderStatus::Pending) {
                return Err(OrderError::NotAuthorized);
            }
            Ok(())
        }
    }
}

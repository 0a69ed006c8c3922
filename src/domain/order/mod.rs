// ============================================================================
// Order Domain - Checkout, Access and Mutation Policy
// ============================================================================
//
// - Value objects (OrderChanges, OrderDetail)
// - Commands (OrderPatch, OrderReplace, OrderCommand)
// - Errors (OrderError enum)
// - Policy (OrderScope for reads, authorize() for writes)
// - Command Handler (checkout transaction + policy enforcement)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod policy;
pub mod command_handler;

pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use policy::*;
pub use command_handler::*;

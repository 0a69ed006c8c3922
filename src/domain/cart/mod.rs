// ============================================================================
// Cart Domain - Pending line items per user
// ============================================================================

pub mod commands;
pub mod errors;
pub mod command_handler;

pub use commands::*;
pub use errors::*;
pub use command_handler::*;

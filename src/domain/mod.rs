// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with:
// - Value objects
// - Commands
// - Errors
// - Command handler
//
// Role resolution is shared by every policy and lives in `role`.
// Storage is reached only through `crate::store::Store`.
//
// ============================================================================

pub mod role;
pub mod cart;
pub mod order;

// Managers Module
//
// Thread-safe wrappers around single-threaded state.
//
// - CompensationManager: shared compensation context with whole-sequence locking

pub mod compensation_manager;

pub use compensation_manager::CompensationManager;

pub mod manage;
pub mod run;

// Re-export command functions for convenience
pub use manage::{add, list, remove, set_destination, show_destination, toggle, AddParams};
pub use run::run;

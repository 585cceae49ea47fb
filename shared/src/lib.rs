//! Shared types and logic for the inventory tracking system
//!
//! Domain models, the stock ledger and the access policy. Nothing in this
//! crate performs I/O, so the backend and its tests can exercise the rules
//! directly.

pub mod ledger;
pub mod models;
pub mod policy;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use policy::*;
pub use validation::*;

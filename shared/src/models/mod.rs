//! Domain models for the inventory tracking system

mod order;
mod product;
mod supplier;
mod transaction;
mod user;

pub use order::*;
pub use product::*;
pub use supplier::*;
pub use transaction::*;
pub use user::*;

//! HTTP handlers
//!
//! Handlers extract the caller and the request body, build the service
//! and shape the JSON response. Authorization lives in the services.

pub mod auth;
pub mod forecast;
pub mod health;
pub mod notification;
pub mod order;
pub mod product;
pub mod supplier;
pub mod transaction;

pub use auth::*;
pub use forecast::*;
pub use health::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use supplier::*;
pub use transaction::*;

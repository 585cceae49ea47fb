//! Business logic services for the inventory tracking backend

pub mod auth;
pub mod forecast;
pub mod notification;
pub mod order;
pub mod product;
pub mod supplier;
pub mod transaction;

pub use auth::AuthService;
pub use forecast::ForecastService;
pub use notification::NotificationService;
pub use order::OrderService;
pub use product::ProductService;
pub use supplier::SupplierService;
pub use transaction::TransactionService;

use crate::error::{AppError, AppResult};

/// Attach a field name to a shared validation failure
pub(crate) fn check(field: &str, result: Result<(), &'static str>) -> AppResult<()> {
    result.map_err(|message| AppError::validation(field, message))
}

/// Validate a required text field and return it trimmed
pub(crate) fn required(field: &str, value: &str) -> AppResult<String> {
    check(field, shared::validate_required(value))?;
    Ok(value.trim().to_string())
}

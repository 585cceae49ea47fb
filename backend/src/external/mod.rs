//! External API integrations

pub mod dataset;
pub mod forecast;

pub use dataset::DatasetClient;
pub use forecast::ForecastClient;

pub mod aggregate;
pub mod api;
pub mod config;
pub mod model;
pub mod normalize;
pub mod reports;
pub mod store;

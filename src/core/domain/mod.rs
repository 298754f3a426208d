pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod value_object;

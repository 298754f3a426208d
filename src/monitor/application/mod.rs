pub mod context;
pub mod coordinator;
pub mod service;

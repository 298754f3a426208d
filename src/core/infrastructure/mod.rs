pub mod api_client;
pub mod memory_registry;

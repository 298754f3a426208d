pub mod command_service;
pub mod discovery_service;
pub mod poller_service;
pub mod topology_service;

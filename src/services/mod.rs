// Services
// Storage, routing, settings and the return-navigation service itself.

pub mod clock;
pub mod memory_router;
pub mod navigation_service;
pub mod query;
pub mod router;
pub mod session_storage;
pub mod settings_engine;

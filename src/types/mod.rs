// Shared type definitions
// Plain data used across managers and services.

pub mod errors;
pub mod navigation;
pub mod route;
pub mod settings;
pub mod token;

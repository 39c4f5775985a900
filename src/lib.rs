//! returnnav: return-anchor navigation for single-page admin consoles.
//!
//! Pages open children with a return token in the query string (`?rtk=...`);
//! children use it to go back to exactly where they came from, across
//! redirects, multi-page flows and reloads.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod services;
pub mod types;

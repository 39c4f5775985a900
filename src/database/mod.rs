//! Database layer backing session storage.
//!
//! # Usage
//!
//! ```no_run
//! use returnnav::database::Database;
//!
//! let db = Database::open("returnnav.db").expect("failed to open database");
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;

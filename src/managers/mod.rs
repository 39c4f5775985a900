// State managers
// Managers own the navigation state: visited URLs and return tokens.

pub mod history_tracker;
pub mod token_repository;
pub mod token_store;

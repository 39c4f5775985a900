//! App Core.
//!
//! Wires one browser session together: database-backed session storage,
//! settings, the router and the navigation service.

use std::sync::Arc;

use uuid::Uuid;

use crate::database::connection::Database;
use crate::managers::token_repository::SessionTokenRepository;
use crate::managers::token_store::TokenStore;
use crate::services::clock::{Clock, SystemClock};
use crate::services::memory_router::MemoryRouter;
use crate::services::navigation_service::NavigationService;
use crate::services::router::Router;
use crate::services::session_storage::SqliteSessionStorage;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::errors::{AppError, StorageError};
use crate::types::settings::NavigationSettings;

/// The navigation service as wired for a browser session.
pub type SessionNavigationService =
    NavigationService<MemoryRouter, SessionTokenRepository<SqliteSessionStorage>>;

/// One tab of the console, bound to a browser session.
pub struct App {
    pub db: Arc<Database>,
    pub navigation: SessionNavigationService,
    storage: SqliteSessionStorage,
    clock: Arc<dyn Clock>,
    settings: NavigationSettings,
}

impl App {
    /// Opens the database at `db_path`, loads settings from `settings_path`
    /// and starts a new browser session at `initial_url`.
    pub fn new(db_path: &str, settings_path: &str, initial_url: &str) -> Result<Self, AppError> {
        let db = Arc::new(Database::open(db_path)?);

        let mut settings_engine = SettingsEngine::new(settings_path);
        let settings = settings_engine.load()?;

        let session_id = Uuid::new_v4().to_string();
        Self::with_session(db, &session_id, settings, Arc::new(SystemClock), initial_url)
    }

    /// Starts (or joins) `session_id` on an already opened database.
    pub fn with_session(
        db: Arc<Database>,
        session_id: &str,
        settings: NavigationSettings,
        clock: Arc<dyn Clock>,
        initial_url: &str,
    ) -> Result<Self, AppError> {
        let storage = SqliteSessionStorage::open(db.clone(), session_id)?;
        let router = MemoryRouter::new(initial_url)?;
        let navigation = Self::build_navigation(router, &storage, &settings, clock.clone());

        log::info!("Session {} opened at {}", session_id, initial_url);
        Ok(Self {
            db,
            navigation,
            storage,
            clock,
            settings,
        })
    }

    pub fn session_id(&self) -> &str {
        self.storage.session_id()
    }

    /// Reloads the page: the in-memory history is lost, session storage and
    /// the current history entry's state are kept.
    pub fn reload(&mut self) -> Result<(), AppError> {
        let url = self.navigation.router().url();
        let state = self.navigation.router().history_state().cloned();
        let router = MemoryRouter::restore(&url, state)?;
        self.navigation =
            Self::build_navigation(router, &self.storage, &self.settings, self.clock.clone());
        log::info!("Reloaded session {} at {}", self.session_id(), url);
        Ok(())
    }

    /// Ends the browser session, destroying its tokens.
    pub fn end_session(self) -> Result<(), StorageError> {
        self.storage.end_session()
    }

    fn build_navigation(
        router: MemoryRouter,
        storage: &SqliteSessionStorage,
        settings: &NavigationSettings,
        clock: Arc<dyn Clock>,
    ) -> SessionNavigationService {
        let repository = SessionTokenRepository::new(storage.clone(), &settings.storage_key);
        NavigationService::new(router, TokenStore::new(repository, clock), settings.clone())
    }
}

//! End-to-end flows through `App`: SQLite-backed session storage, the
//! memory router and the navigation service wired together.

use std::sync::Arc;

use returnnav::app::App;
use returnnav::database::Database;
use returnnav::managers::history_tracker::HistoryTrackerTrait;
use returnnav::managers::token_store::TokenStoreTrait;
use returnnav::services::clock::ManualClock;
use returnnav::services::navigation_service::ReturnSource;
use returnnav::services::router::Router;
use returnnav::services::session_storage::{SessionStorage, SqliteSessionStorage};
use returnnav::types::navigation::{NavigationExtras, NavigationState};
use returnnav::types::settings::{NavigationSettings, DEFAULT_STORAGE_KEY, DEFAULT_TOKEN_TTL_MS};

const T0: i64 = 1_700_000_000_000;
const HOUR: i64 = 60 * 60 * 1000;

fn setup() -> (Arc<Database>, Arc<ManualClock>) {
    (
        Arc::new(Database::open_in_memory().unwrap()),
        Arc::new(ManualClock::new(T0)),
    )
}

fn open(db: &Arc<Database>, clock: &Arc<ManualClock>, session: &str, url: &str) -> App {
    App::with_session(db.clone(), session, NavigationSettings::default(), clock.clone(), url).unwrap()
}

#[test]
fn test_create_from_list_and_return() {
    let (db, clock) = setup();
    let mut app = open(&db, &clock, "tab", "/list?page=3");

    app.navigation
        .go_with_return(["/create"], NavigationExtras::default())
        .unwrap();
    let route = app.navigation.router().snapshot();
    assert_eq!(route.path, "/create");
    assert!(route.query_param("rtk").is_some());

    let source = app.navigation.back_from_route(&route, ["/"]).unwrap();

    assert_eq!(source, ReturnSource::Token);
    assert_eq!(app.navigation.router().url(), "/list?page=3");
}

#[test]
fn test_token_persisted_in_session_storage() {
    let (db, clock) = setup();
    let mut app = open(&db, &clock, "tab", "/list");
    app.navigation
        .go_with_return(["/create"], NavigationExtras::default())
        .unwrap();
    let token = app.navigation.token_from_current_url().unwrap();

    let storage = SqliteSessionStorage::open(db.clone(), "tab").unwrap();
    let raw = storage.get_item(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let map: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(map[&token]["url"], "/list");
    assert_eq!(map[&token]["ts"], T0);
}

#[test]
fn test_reload_on_child_page_still_returns() {
    let (db, clock) = setup();
    let mut app = open(&db, &clock, "tab", "/list");
    app.navigation
        .go_with_return(["/create"], NavigationExtras::default())
        .unwrap();

    app.reload().unwrap();
    assert_eq!(app.navigation.history().len(), 1);

    let source = app.navigation.go_back_or(["/"], NavigationExtras::default()).unwrap();

    assert_eq!(source, ReturnSource::Token);
    assert_eq!(app.navigation.router().url(), "/list");
}

#[test]
fn test_reload_keeps_legacy_state() {
    let (db, clock) = setup();
    let mut app = open(&db, &clock, "tab", "/list");
    app.navigation
        .router_mut()
        .navigate_by_url(
            "/edit/4",
            &NavigationExtras::default().with_state(NavigationState::with_return_to("/list")),
        )
        .unwrap();
    app.navigation.pump_events();

    app.reload().unwrap();
    let source = app.navigation.go_back_or(["/"], NavigationExtras::default()).unwrap();

    assert_eq!(source, ReturnSource::LegacyState);
    assert_eq!(app.navigation.router().url(), "/list");
}

#[test]
fn test_history_used_without_anchors() {
    let (db, clock) = setup();
    let mut app = open(&db, &clock, "tab", "/list");
    app.navigation
        .router_mut()
        .navigate_by_url("/detail/9", &NavigationExtras::default())
        .unwrap();
    app.navigation.pump_events();

    let source = app.navigation.go_back().unwrap();

    assert_eq!(source, ReturnSource::History);
    assert_eq!(app.navigation.router().url(), "/list");
}

#[test]
fn test_expired_token_falls_back() {
    let (db, clock) = setup();
    let app = open(&db, &clock, "tab", "/list");
    let token = app.navigation.token_store().issue_token("/list");

    clock.advance(DEFAULT_TOKEN_TTL_MS + HOUR);
    let mut app = open(&db, &clock, "tab", &format!("/create?rtk={}", token));

    assert_eq!(app.navigation.token_store().resolve_token(&token), None);
    let source = app
        .navigation
        .go_back_or(["/fallback"], NavigationExtras::default())
        .unwrap();

    assert_eq!(source, ReturnSource::Fallback);
    assert_eq!(app.navigation.router().url(), "/fallback");
}

#[test]
fn test_young_token_survives_startup_purge() {
    let (db, clock) = setup();
    let app = open(&db, &clock, "tab", "/list");
    let token = app.navigation.token_store().issue_token("/list");

    clock.advance(DEFAULT_TOKEN_TTL_MS - HOUR);
    let app = open(&db, &clock, "tab", "/create");

    assert_eq!(
        app.navigation.token_store().resolve_token(&token).as_deref(),
        Some("/list")
    );
}

#[test]
fn test_tabs_of_one_session_share_tokens() {
    let (db, clock) = setup();
    let mut first = open(&db, &clock, "shared", "/list");
    let second = open(&db, &clock, "shared", "/reports");

    first
        .navigation
        .go_with_return(["/create"], NavigationExtras::default())
        .unwrap();
    let token = first.navigation.token_from_current_url().unwrap();

    assert_eq!(
        second.navigation.token_store().resolve_token(&token).as_deref(),
        Some("/list")
    );
}

#[test]
fn test_sessions_are_isolated() {
    let (db, clock) = setup();
    let mut first = open(&db, &clock, "one", "/list");
    let second = open(&db, &clock, "two", "/list");

    first
        .navigation
        .go_with_return(["/create"], NavigationExtras::default())
        .unwrap();
    let token = first.navigation.token_from_current_url().unwrap();

    assert_eq!(second.navigation.token_store().resolve_token(&token), None);
}

#[test]
fn test_end_session_destroys_tokens() {
    let (db, clock) = setup();
    let mut app = open(&db, &clock, "tab", "/list");
    app.navigation
        .go_with_return(["/create"], NavigationExtras::default())
        .unwrap();
    let token = app.navigation.token_from_current_url().unwrap();
    assert_eq!(app.session_id(), "tab");

    app.end_session().unwrap();
    assert!(db.active_sessions().unwrap().is_empty());

    let app = open(&db, &clock, "tab", "/create");
    assert_eq!(app.navigation.token_store().resolve_token(&token), None);
}

#[test]
fn test_app_new_with_files() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("returnnav.db");
    let settings_path = dir.path().join("navigation.json");

    let mut app = App::new(
        db_path.to_str().unwrap(),
        settings_path.to_str().unwrap(),
        "/list",
    )
    .unwrap();

    assert!(!app.session_id().is_empty());
    app.navigation
        .go_with_return(["/create"], NavigationExtras::default())
        .unwrap();
    assert_eq!(app.navigation.go_back().unwrap(), ReturnSource::Token);
    assert_eq!(app.navigation.router().url(), "/list");
}

//! returnnav demo.
//!
//! Walks through the return-navigation flows of the admin console against an
//! in-memory router and session store. Set `RUST_LOG=debug` to see each
//! resolution step.

use std::error::Error;
use std::sync::Arc;

use returnnav::app::App;
use returnnav::database::Database;
use returnnav::managers::history_tracker::HistoryTrackerTrait;
use returnnav::managers::token_store::TokenStoreTrait;
use returnnav::services::clock::ManualClock;
use returnnav::services::router::Router;
use returnnav::types::navigation::NavigationExtras;
use returnnav::types::settings::{NavigationSettings, DEFAULT_TOKEN_TTL_MS};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("returnnav v{} demo", env!("CARGO_PKG_VERSION"));
    println!();

    let db = Arc::new(Database::open_in_memory()?);
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));

    demo_create_and_return(&db, clock.clone())?;
    demo_reload(&db, clock.clone())?;
    demo_expired_token(&db, clock)?;

    println!();
    println!("All scenarios completed.");
    Ok(())
}

fn section(name: &str) {
    println!("---------------------------------------------------------------");
    println!("  {}", name);
    println!("---------------------------------------------------------------");
}

fn demo_create_and_return(db: &Arc<Database>, clock: Arc<ManualClock>) -> Result<(), Box<dyn Error>> {
    section("Create from a list, then return");
    let mut app = App::with_session(db.clone(), "demo-a", NavigationSettings::default(), clock, "/list")?;

    app.navigation.go_with_return(["/create"], NavigationExtras::default())?;
    println!("  Opened child: {}", app.navigation.router().url());

    let route = app.navigation.router().snapshot();
    let source = app.navigation.back_from_route(&route, ["/"])?;
    println!("  Back via {}: {}", source, app.navigation.router().url());
    println!();
    Ok(())
}

fn demo_reload(db: &Arc<Database>, clock: Arc<ManualClock>) -> Result<(), Box<dyn Error>> {
    section("Reload on the child page");
    let mut app = App::with_session(db.clone(), "demo-b", NavigationSettings::default(), clock, "/list")?;

    app.navigation.go_with_return(["/create"], NavigationExtras::default())?;
    app.reload()?;
    println!(
        "  Reloaded at {} with {} history entries",
        app.navigation.router().url(),
        app.navigation.history().entries().len()
    );

    let source = app.navigation.go_back_or(["/"], NavigationExtras::default())?;
    println!("  Back via {}: {}", source, app.navigation.router().url());
    println!();
    Ok(())
}

fn demo_expired_token(db: &Arc<Database>, clock: Arc<ManualClock>) -> Result<(), Box<dyn Error>> {
    section("Expired token");
    let settings = NavigationSettings::default();
    let app = App::with_session(db.clone(), "demo-c", settings.clone(), clock.clone(), "/list")?;
    let token = app.navigation.token_store().issue_token("/list");
    println!("  Issued {} for /list", token);

    clock.advance(DEFAULT_TOKEN_TTL_MS + 60 * 60 * 1000);
    let start = format!("/create?{}={}", settings.query_param, token);
    let mut app = App::with_session(db.clone(), "demo-c", settings, clock, &start)?;
    println!(
        "  25 hours later the token resolves to {:?}",
        app.navigation.token_store().resolve_token(&token)
    );

    // The initial page is the only history entry, so history has nothing to offer.
    let source = app.navigation.go_back_or(["/fallback"], NavigationExtras::default())?;
    println!("  Back via {}: {}", source, app.navigation.router().url());
    app.end_session()?;
    println!();
    Ok(())
}

//! Property-based tests for token lifetime and identity.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use returnnav::managers::token_repository::{SessionTokenRepository, TokenRepository};
use returnnav::managers::token_store::{TokenStore, TokenStoreTrait};
use returnnav::services::clock::ManualClock;
use returnnav::services::session_storage::MemorySessionStorage;
use returnnav::types::settings::{DEFAULT_STORAGE_KEY, DEFAULT_TOKEN_TTL_MS};

const T0: i64 = 1_700_000_000_000;

type Store = TokenStore<SessionTokenRepository<MemorySessionStorage>>;

fn store() -> (Store, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let repository = SessionTokenRepository::new(MemorySessionStorage::new(), DEFAULT_STORAGE_KEY);
    (TokenStore::new(repository, clock.clone()), clock)
}

fn arb_url() -> impl Strategy<Value = String> {
    (
        "/[a-z]{1,8}",
        proptest::option::of("/[a-z0-9]{1,6}"),
        proptest::option::of("[a-z]{1,5}=[a-z0-9]{1,5}"),
    )
        .prop_map(|(path, sub, query)| {
            let mut url = format!("{}{}", path, sub.unwrap_or_default());
            if let Some(query) = query {
                url.push('?');
                url.push_str(&query);
            }
            url
        })
}

// **Property: purge keeps exactly the tokens younger than the TTL**
//
// *For any* set of issue ages, a purge at a fixed instant SHALL remove the
// tokens whose age is at least the TTL and keep the rest resolvable.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn purge_respects_ttl(ages in proptest::collection::vec(0i64..2 * DEFAULT_TOKEN_TTL_MS, 1..12)) {
        let (store, clock) = store();
        let now = T0 + 2 * DEFAULT_TOKEN_TTL_MS;

        let mut issued = Vec::new();
        for (i, age) in ages.iter().enumerate() {
            clock.set(now - age);
            let url = format!("/page/{}", i);
            issued.push((store.issue_token(&url), url, *age));
        }

        clock.set(now);
        store.purge_expired(DEFAULT_TOKEN_TTL_MS);

        for (token, url, age) in &issued {
            let resolved = store.resolve_token(token);
            if *age >= DEFAULT_TOKEN_TTL_MS {
                prop_assert_eq!(resolved, None);
            } else {
                prop_assert_eq!(resolved.as_deref(), Some(url.as_str()));
            }
        }
        let survivors = issued.iter().filter(|(_, _, age)| *age < DEFAULT_TOKEN_TTL_MS).count();
        prop_assert_eq!(store.repository().all().unwrap().len(), survivors);
    }

    #[test]
    fn tokens_are_unique_and_resolve_to_their_anchor(urls in proptest::collection::vec(arb_url(), 1..30)) {
        let (store, _) = store();

        let tokens: Vec<String> = urls.iter().map(|url| store.issue_token(url)).collect();

        let distinct: HashSet<&String> = tokens.iter().collect();
        prop_assert_eq!(distinct.len(), tokens.len());
        for (token, url) in tokens.iter().zip(&urls) {
            prop_assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
            let resolved = store.resolve_token(token);
            prop_assert_eq!(resolved.as_deref(), Some(url.as_str()));
        }
    }

    #[test]
    fn resolution_does_not_consume(url in arb_url(), reads in 1usize..6) {
        let (store, _) = store();
        let token = store.issue_token(&url);

        for _ in 0..reads {
            let resolved = store.resolve_token(&token);
            prop_assert_eq!(resolved.as_deref(), Some(url.as_str()));
        }
    }
}

//! Behavior-driven tests for freshness resolution
//!
//! These tests verify how a live API copy and a stored copy of the same
//! entity are reconciled.

use starlane_core::models::Agent;
use starlane_core::{BackedData, BackingData, Source, Tracked, UtcDateTime};

#[derive(Debug, Clone, PartialEq)]
struct StoredAgent {
    symbol: String,
    credits: i64,
}

impl From<StoredAgent> for Agent {
    fn from(stored: StoredAgent) -> Self {
        Agent {
            account_id: None,
            symbol: stored.symbol,
            headquarters: String::new(),
            credits: stored.credits,
            starting_faction: String::new(),
            ship_count: 0,
        }
    }
}

fn at(value: &str) -> UtcDateTime {
    UtcDateTime::parse(value).expect("valid timestamp")
}

fn live_agent(credits: i64) -> Agent {
    Agent {
        account_id: None,
        symbol: String::from("ALPHA"),
        headquarters: String::from("X1-DF55-20250Z"),
        credits,
        starting_faction: String::from("COSMIC"),
        ship_count: 2,
    }
}

fn stored_agent(credits: i64) -> StoredAgent {
    StoredAgent {
        symbol: String::from("ALPHA"),
        credits,
    }
}

#[test]
fn when_only_cache_holds_data_cache_copy_is_authoritative() {
    // Given: A stored copy and no live copy
    let data: BackedData<Agent, StoredAgent> = BackedData::new().with_db(BackingData::synced_at(
        stored_agent(10),
        at("2024-03-01T00:00:00Z"),
    ));

    // Then: The stored copy is used
    let newest = data.newest().expect("one side present");
    assert_eq!(newest.source(), Source::Db);
    assert_eq!(data.newest_into::<Agent>().map(|agent| agent.credits), Some(10));
}

#[test]
fn when_live_copy_is_fresher_it_overrides_cache() {
    // Given: A stored copy, then a later fetch
    let data = BackedData::new()
        .with_db(BackingData::synced_at(stored_agent(10), at("2024-03-01T00:00:00Z")))
        .with_api(BackingData::synced_at(live_agent(25), at("2024-03-01T00:05:00Z")));

    // Then: The live copy wins
    let newest = data.newest().expect("both present");
    assert_eq!(newest.source(), Source::Api);
    assert_eq!(newest.modified(), Some(at("2024-03-01T00:05:00Z")));
    assert_eq!(data.newest_into::<Agent>().map(|agent| agent.credits), Some(25));
}

#[test]
fn when_cache_was_written_after_fetch_cache_wins() {
    let data = BackedData::new()
        .with_api(BackingData::synced_at(live_agent(25), at("2024-03-01T00:05:00Z")))
        .with_db(BackingData::synced_at(stored_agent(40), at("2024-03-01T00:06:00Z")));

    assert_eq!(data.newest().map(|newest| newest.source()), Some(Source::Db));
    assert_eq!(data.newest_into::<Agent>().map(|agent| agent.credits), Some(40));
}

#[test]
fn when_neither_copy_exists_there_is_no_authority() {
    let data: BackedData<Agent, StoredAgent> = BackedData::new();

    assert!(data.newest().is_none());
    assert!(data.api().is_none());
    assert!(data.db().is_none());
}

#[test]
fn when_tracked_value_is_reassigned_source_and_time_move_with_it() {
    // Given: A manually entered value from the past
    let mut credits = Tracked::at(100_i64, Source::Manual, at("2020-01-01T00:00:00Z"));
    let manual = credits.clone();

    // When: A live observation replaces it
    credits.set(175_000, Source::Api);

    // Then: Value, source and time all belong to the new observation
    assert_eq!(*credits.value(), 175_000);
    assert_eq!(credits.source(), Source::Api);
    assert!(credits.is_newer_than(&manual));
}

//! Provenance and recency wrappers.
//!
//! Values fetched from the API, read back from a local store, or entered by
//! hand are wrapped with where they came from and when. [`BackedData`] holds
//! one API-origin and one store-origin copy of the same entity and decides
//! which is authoritative.

use serde::{Deserialize, Serialize};

use crate::UtcDateTime;

/// Where a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Api,
    Db,
    Manual,
}

/// A value with a synced flag and an optional last-modified time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackingData<T> {
    pub value: T,
    pub synced: bool,
    pub modified: Option<UtcDateTime>,
}

impl<T> BackingData<T> {
    /// Unsynced, never modified.
    pub fn new(value: T) -> Self {
        Self {
            value,
            synced: false,
            modified: None,
        }
    }

    /// Synced copy observed at `modified`.
    pub fn synced_at(value: T, modified: UtcDateTime) -> Self {
        Self {
            value,
            synced: true,
            modified: Some(modified),
        }
    }

    /// Marks the value synced as of now.
    pub fn touch(&mut self) {
        self.synced = true;
        self.modified = Some(UtcDateTime::now());
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// A value tagged with its source and the time it was written.
///
/// Value, source and time are only ever replaced together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracked<T> {
    value: T,
    source: Source,
    updated_at: UtcDateTime,
}

impl<T> Tracked<T> {
    pub fn new(value: T, source: Source) -> Self {
        Self::at(value, source, UtcDateTime::now())
    }

    pub fn at(value: T, source: Source, updated_at: UtcDateTime) -> Self {
        Self {
            value,
            source,
            updated_at,
        }
    }

    /// Replaces value and source, stamping now.
    pub fn set(&mut self, value: T, source: Source) {
        *self = Self::new(value, source);
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub const fn source(&self) -> Source {
        self.source
    }

    pub const fn updated_at(&self) -> UtcDateTime {
        self.updated_at
    }

    pub fn is_newer_than<U>(&self, other: &Tracked<U>) -> bool {
        self.updated_at > other.updated_at
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// A value stamped with the time of its last write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamped<T> {
    value: T,
    written_at: UtcDateTime,
}

impl<T> Timestamped<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            written_at: UtcDateTime::now(),
        }
    }

    pub fn set(&mut self, value: T) {
        *self = Self::new(value);
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub const fn written_at(&self) -> UtcDateTime {
        self.written_at
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// The authoritative side picked by [`BackedData::newest`].
#[derive(Debug, PartialEq)]
pub enum Newest<'a, A, D> {
    Api(&'a BackingData<A>),
    Db(&'a BackingData<D>),
}

impl<A, D> Newest<'_, A, D> {
    pub const fn source(&self) -> Source {
        match self {
            Self::Api(_) => Source::Api,
            Self::Db(_) => Source::Db,
        }
    }

    pub fn modified(&self) -> Option<UtcDateTime> {
        match self {
            Self::Api(data) => data.modified,
            Self::Db(data) => data.modified,
        }
    }
}

/// API-origin and store-origin copies of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackedData<A, D> {
    api: Option<BackingData<A>>,
    db: Option<BackingData<D>>,
}

impl<A, D> Default for BackedData<A, D> {
    fn default() -> Self {
        Self {
            api: None,
            db: None,
        }
    }
}

impl<A, D> BackedData<A, D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the API-origin copy.
    pub fn with_api(self, api: BackingData<A>) -> Self {
        Self {
            api: Some(api),
            ..self
        }
    }

    /// Replaces the store-origin copy.
    pub fn with_db(self, db: BackingData<D>) -> Self {
        Self {
            db: Some(db),
            ..self
        }
    }

    pub fn api(&self) -> Option<&BackingData<A>> {
        self.api.as_ref()
    }

    pub fn db(&self) -> Option<&BackingData<D>> {
        self.db.as_ref()
    }

    /// The authoritative copy.
    ///
    /// A lone copy wins. With both present the store copy wins only when
    /// both carry a time and the store time is strictly later; otherwise the
    /// API copy wins.
    pub fn newest(&self) -> Option<Newest<'_, A, D>> {
        match (&self.api, &self.db) {
            (None, None) => None,
            (Some(api), None) => Some(Newest::Api(api)),
            (None, Some(db)) => Some(Newest::Db(db)),
            (Some(api), Some(db)) => match (api.modified, db.modified) {
                (Some(api_at), Some(db_at)) if db_at > api_at => Some(Newest::Db(db)),
                _ => Some(Newest::Api(api)),
            },
        }
    }

    /// The authoritative copy converted to a common type.
    pub fn newest_into<T>(&self) -> Option<T>
    where
        A: Clone + Into<T>,
        D: Clone + Into<T>,
    {
        self.newest().map(|newest| match newest {
            Newest::Api(data) => data.value.clone().into(),
            Newest::Db(data) => data.value.clone().into(),
        })
    }
}

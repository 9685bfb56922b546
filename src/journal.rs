//! Append-only change journal
//!
//! Each successful mutation of a store leaves one [`Change`]: who did it, when,
//! what kind of transition it was and the content digest of the version it
//! touched. Versions answer "what was true when", the journal answers "who
//! changed it". A hard delete removes the version but its journal entry stays.
//!
//! Entries are hash-chained: every change carries the sha256 of its
//! predecessor's CBOR encoding, so an exported journal can be checked for
//! gaps or edits.
use super::error::{StoreError, StoreResult};
use super::interval::TimeStamp;
use super::record::EntityId;
use serde::Serialize;

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    #[n(0)]
    Created,
    #[n(1)]
    Replaced,
    #[n(2)]
    Superseded,
    #[n(3)]
    Deleted,
    #[n(4)]
    Restored,
}

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone, Serialize)]
pub struct Change {
    #[n(0)]
    pub entity_id: EntityId,
    #[n(1)]
    pub actor: String,
    #[n(2)]
    pub at: TimeStamp,
    #[n(3)]
    pub kind: ChangeKind,
    #[n(4)]
    pub digest: String, // content digest of the version the change produced or removed
    #[n(5)]
    pub prev: Option<String>,
}

impl Change {
    pub fn new(
        entity_id: EntityId,
        actor: impl Into<String>,
        at: TimeStamp,
        kind: ChangeKind,
        digest: String,
    ) -> Self {
        Self {
            entity_id,
            actor: actor.into(),
            at,
            kind,
            digest,
            prev: None,
        }
    }
    /// CBOR encoding of the entry and its sha256 hash.
    pub fn build(&self) -> StoreResult<(String, Vec<u8>)> {
        let cbor = minicbor::to_vec(self).map_err(|e| StoreError::Encoding(e.to_string()))?;
        let hash = sha256::digest(&cbor);

        Ok((hash, cbor))
    }
}

/// A change linked to the journal head, ready to append.
#[derive(Debug)]
pub struct Sealed {
    change: Change,
    hash: String,
}

#[derive(Debug, Default, Clone)]
pub struct Journal {
    entries: Vec<Change>,
    head: Option<String>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }
    /// Links `change` to the current head and hashes it. Nothing is appended,
    /// so a store can seal before it mutates and append after.
    pub fn seal(&self, mut change: Change) -> StoreResult<Sealed> {
        change.prev = self.head.clone();
        let (hash, _) = change.build()?;
        Ok(Sealed { change, hash })
    }
    pub fn append(&mut self, sealed: Sealed) {
        self.head = Some(sealed.hash);
        self.entries.push(sealed.change);
    }
    pub fn entries(&self) -> &[Change] {
        &self.entries
    }
    pub fn for_entity(&self, id: EntityId) -> Vec<Change> {
        self.entries
            .iter()
            .filter(|c| c.entity_id == id)
            .cloned()
            .collect()
    }
}

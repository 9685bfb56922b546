//! Generic temporal version store
//!
//! One [`VersionStore`] per record type. It owns every version of every
//! entity of that type and is the only place that moves validity intervals.
//!
//! Invariants held after every operation:
//!
//! 1. per entity id, at most one version ends at the sentinel (the current one)
//! 2. `valid_from <= valid_to` for every version
//! 3. a closed interval is only reopened by [`VersionStore::delete_and_restore_previous`]
//! 4. versions of one id, ordered by `valid_from`, do not overlap
//!
//! Mutations take the write lock for their whole duration and validate before
//! touching anything, so a failed call leaves the store as it was. Reads take
//! the read lock and hand back clones.
use super::error::{StoreError, StoreResult};
use super::interval::{SharedClock, TimeStamp};
use super::journal::{Change, ChangeKind, Journal};
use super::record::{EntityId, Record, Version};
use mockable::DefaultClock;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

struct StoreState<R> {
    // versions of each id, ordered by valid_from
    entities: BTreeMap<EntityId, Vec<Version<R>>>,
    journal: Journal,
    // latest timestamp issued or present in the data
    last_tick: Option<TimeStamp>,
}

pub struct VersionStore<R: Record> {
    state: RwLock<StoreState<R>>,
    clock: SharedClock,
}

impl<R: Record> VersionStore<R> {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            state: RwLock::new(StoreState {
                entities: BTreeMap::new(),
                journal: Journal::new(),
                last_tick: None,
            }),
            clock,
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(DefaultClock))
    }

    /// Builds a store holding `seed`, refusing data that already breaks the invariants.
    pub fn with_seed(clock: SharedClock, seed: Vec<Version<R>>) -> StoreResult<Self> {
        let mut entities: BTreeMap<EntityId, Vec<Version<R>>> = BTreeMap::new();
        let mut last_tick: Option<TimeStamp> = None;

        for version in seed {
            if !version.interval().is_well_formed() {
                return Err(StoreError::InvalidInterval {
                    from: version.valid_from(),
                    to: version.valid_to(),
                });
            }
            let mut latest = version.valid_from();
            if !version.is_current() {
                latest = latest.max(version.valid_to());
            }
            last_tick = last_tick.max(Some(latest));
            entities.entry(version.id()).or_default().push(version);
        }

        for (id, versions) in entities.iter_mut() {
            versions.sort_by_key(|v| v.valid_from());
            validate_timeline::<R>(*id, versions)?;
        }

        info!(
            kind = R::KIND,
            entities = entities.len(),
            versions = entities.values().map(Vec::len).sum::<usize>(),
            "seeded version store"
        );

        Ok(Self {
            state: RwLock::new(StoreState {
                entities,
                journal: Journal::new(),
                last_tick,
            }),
            clock,
        })
    }

    /// The store clock's reading, without issuing a tick.
    pub fn now(&self) -> TimeStamp {
        TimeStamp::from_clock(self.clock.as_ref())
    }

    /// Inserts `record` as a brand-new entity, current from now.
    pub fn create(&self, record: R, actor: &str) -> StoreResult<Version<R>> {
        let id = record.id();
        let digest = record.content_digest()?;

        let mut guard = self.write()?;
        let state = &mut *guard;

        if let Some(versions) = state.entities.get(&id) {
            if current_position::<R>(id, versions)?.is_some() {
                warn!(kind = R::KIND, id, actor, "create rejected, id already current");
                return Err(StoreError::DuplicateId { kind: R::KIND, id });
            }
        }

        let now = next_tick(&self.clock, &mut state.last_tick);
        let entry = state
            .journal
            .seal(Change::new(id, actor, now, ChangeKind::Created, digest))?;
        let version = Version::open(record, actor, now);
        state
            .entities
            .entry(id)
            .or_default()
            .push(version.clone());
        state.journal.append(entry);

        info!(kind = R::KIND, id, actor, valid_from = %now, "created version");
        Ok(version)
    }

    pub fn get_current(&self, id: EntityId) -> StoreResult<Version<R>> {
        let state = self.read()?;
        let versions = state.entities.get(&id).ok_or_else(|| not_found::<R>(id))?;
        let pos = current_position::<R>(id, versions)?.ok_or_else(|| not_found::<R>(id))?;

        Ok(versions[pos].clone())
    }

    /// Every current version, ordered by id. History is left out.
    pub fn get_all(&self) -> StoreResult<Vec<Version<R>>> {
        let state = self.read()?;
        let mut current = Vec::with_capacity(state.entities.len());

        for (id, versions) in state.entities.iter() {
            if let Some(pos) = current_position::<R>(*id, versions)? {
                current.push(versions[pos].clone());
            }
        }

        Ok(current)
    }

    /// Every version ever kept for `id`, closed and current, oldest first.
    pub fn history(&self, id: EntityId) -> StoreResult<Vec<Version<R>>> {
        let state = self.read()?;
        match state.entities.get(&id) {
            Some(versions) if !versions.is_empty() => Ok(versions.clone()),
            _ => Err(not_found::<R>(id)),
        }
    }

    /// Every version of every entity, grouped by id.
    pub fn all_versions(&self) -> StoreResult<Vec<Version<R>>> {
        let state = self.read()?;
        Ok(state.entities.values().flatten().cloned().collect())
    }

    /// The version of `id` that was authoritative at `at`.
    pub fn as_of(&self, id: EntityId, at: TimeStamp) -> StoreResult<Version<R>> {
        let state = self.read()?;
        state
            .entities
            .get(&id)
            .and_then(|versions| versions.iter().find(|v| v.interval().contains(at)))
            .cloned()
            .ok_or_else(|| not_found::<R>(id))
    }

    /// Plain update: overwrites the current version in place, no history is kept.
    ///
    /// The replacement keeps the overwritten version's `valid_from`. Returns the
    /// overwritten version.
    pub fn replace(&self, record: R, actor: &str) -> StoreResult<Version<R>> {
        let id = record.id();
        let digest = record.content_digest()?;

        let mut guard = self.write()?;
        let state = &mut *guard;

        let versions = state
            .entities
            .get_mut(&id)
            .ok_or_else(|| not_found::<R>(id))?;
        let pos = current_position::<R>(id, versions)?.ok_or_else(|| not_found::<R>(id))?;

        let now = next_tick(&self.clock, &mut state.last_tick);
        let entry = state
            .journal
            .seal(Change::new(id, actor, now, ChangeKind::Replaced, digest))?;
        let replacement = Version::with_interval(record, actor, *versions[pos].interval());
        let prior = std::mem::replace(&mut versions[pos], replacement);
        state.journal.append(entry);

        info!(kind = R::KIND, id, actor, "replaced current version in place");
        Ok(prior)
    }

    /// Closes the current version of `id` at now and opens `record` as its successor.
    ///
    /// `record` takes `id` whatever id it carried. Returns the closed version.
    pub fn update_with_history(&self, id: EntityId, mut record: R, actor: &str) -> StoreResult<Version<R>> {
        if record.id() != id {
            debug!(kind = R::KIND, id, carried = record.id(), "overriding record id");
            record.set_id(id);
        }
        let digest = record.content_digest()?;

        let mut guard = self.write()?;
        let state = &mut *guard;

        let versions = state
            .entities
            .get_mut(&id)
            .ok_or_else(|| not_found::<R>(id))?;
        let pos = current_position::<R>(id, versions)?.ok_or_else(|| not_found::<R>(id))?;

        let now = next_tick(&self.clock, &mut state.last_tick);
        let entry = state
            .journal
            .seal(Change::new(id, actor, now, ChangeKind::Superseded, digest))?;
        versions[pos].interval_mut().close(now);
        let closed = versions[pos].clone();
        versions.push(Version::open(record, actor, now));
        state.journal.append(entry);

        info!(kind = R::KIND, id, actor, closed_at = %now, "superseded current version");
        Ok(closed)
    }

    /// Removes the current version of `id` outright and returns it.
    ///
    /// Closed versions of `id` stay. The journal keeps a `Deleted` entry.
    pub fn delete(&self, id: EntityId, actor: &str) -> StoreResult<Version<R>> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let versions = state
            .entities
            .get_mut(&id)
            .ok_or_else(|| not_found::<R>(id))?;
        let pos = current_position::<R>(id, versions)?.ok_or_else(|| not_found::<R>(id))?;
        let digest = versions[pos].content_digest()?;

        let now = next_tick(&self.clock, &mut state.last_tick);
        let entry = state
            .journal
            .seal(Change::new(id, actor, now, ChangeKind::Deleted, digest))?;
        let removed = versions.remove(pos);
        if versions.is_empty() {
            state.entities.remove(&id);
        }
        state.journal.append(entry);

        info!(kind = R::KIND, id, actor, "deleted current version");
        Ok(removed)
    }

    /// Undoes the latest history-preserving update of `id`.
    ///
    /// Drops the current version and reopens the most recently closed one,
    /// leaving its `valid_from` and `updated_by` untouched.
    pub fn delete_and_restore_previous(&self, id: EntityId, actor: &str) -> StoreResult<Version<R>> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let versions = state
            .entities
            .get_mut(&id)
            .ok_or_else(|| not_found::<R>(id))?;
        let current = current_position::<R>(id, versions)?.ok_or_else(|| not_found::<R>(id))?;
        let restore = most_recently_closed::<R>(id, versions)?
            .ok_or(StoreError::NoHistory { kind: R::KIND, id })?;
        let digest = versions[restore].content_digest()?;

        let now = next_tick(&self.clock, &mut state.last_tick);
        let entry = state
            .journal
            .seal(Change::new(id, actor, now, ChangeKind::Restored, digest))?;
        versions.remove(current);
        let restore = if restore > current { restore - 1 } else { restore };
        versions[restore].interval_mut().reopen();
        let reopened = versions[restore].clone();
        state.journal.append(entry);

        info!(
            kind = R::KIND,
            id,
            actor,
            valid_from = %reopened.valid_from(),
            "restored previous version"
        );
        Ok(reopened)
    }

    pub fn journal(&self, id: EntityId) -> StoreResult<Vec<Change>> {
        Ok(self.read()?.journal.for_entity(id))
    }

    pub fn journal_all(&self) -> StoreResult<Vec<Change>> {
        Ok(self.read()?.journal.entries().to_vec())
    }

    /// Number of versions held, history included.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.entities.values().map(Vec::len).sum())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn current_count(&self) -> StoreResult<usize> {
        Ok(self.get_all()?.len())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState<R>>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned(R::KIND))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState<R>>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned(R::KIND))
    }
}

/// "now" from the clock, bumped past anything already issued so closing times never tie.
fn next_tick(clock: &SharedClock, last_tick: &mut Option<TimeStamp>) -> TimeStamp {
    let now = TimeStamp::from_clock(clock.as_ref());
    let now = match *last_tick {
        Some(last) if now <= last => last.successor(),
        _ => now,
    };
    *last_tick = Some(now);
    now
}

fn not_found<R: Record>(id: EntityId) -> StoreError {
    StoreError::NotFound { kind: R::KIND, id }
}

fn integrity_fault<R: Record>(id: EntityId, detail: impl Into<String>) -> StoreError {
    let detail = detail.into();
    error!(kind = R::KIND, id, %detail, "version integrity fault");
    StoreError::IntegrityFault {
        kind: R::KIND,
        id,
        detail,
    }
}

fn current_position<R: Record>(id: EntityId, versions: &[Version<R>]) -> StoreResult<Option<usize>> {
    let mut found = None;
    for (i, version) in versions.iter().enumerate() {
        if version.is_current() {
            if found.is_some() {
                return Err(integrity_fault::<R>(id, "more than one current version"));
            }
            found = Some(i);
        }
    }
    Ok(found)
}

/// Closed version with the greatest `valid_to`. Two sharing it is a fault.
fn most_recently_closed<R: Record>(id: EntityId, versions: &[Version<R>]) -> StoreResult<Option<usize>> {
    let mut best: Option<(usize, TimeStamp)> = None;
    let mut tied = false;

    for (i, version) in versions.iter().enumerate() {
        if version.is_current() {
            continue;
        }
        let valid_to = version.valid_to();
        match best {
            Some((_, max)) if valid_to < max => {}
            Some((_, max)) if valid_to == max => tied = true,
            _ => {
                best = Some((i, valid_to));
                tied = false;
            }
        }
    }

    if tied {
        return Err(integrity_fault::<R>(
            id,
            "closed versions share the latest valid_to",
        ));
    }
    Ok(best.map(|(i, _)| i))
}

// expects `versions` sorted by valid_from
fn validate_timeline<R: Record>(id: EntityId, versions: &[Version<R>]) -> StoreResult<()> {
    current_position::<R>(id, versions)?;
    for pair in versions.windows(2) {
        if pair[0].valid_to() > pair[1].valid_from() {
            return Err(integrity_fault::<R>(id, "overlapping versions"));
        }
    }
    most_recently_closed::<R>(id, versions)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::ValidityInterval;
    use crate::models::Cashback;
    use crate::test_support::{MutableClock, at};

    fn cashback(percent: u8) -> Cashback {
        Cashback::new(7, 1, "A", "groceries", percent)
    }

    fn store() -> (Arc<MutableClock>, VersionStore<Cashback>) {
        let (clock, shared) = MutableClock::shared(at(2024, 1, 1, 0, 0, 0));
        (clock, VersionStore::new(shared))
    }

    #[test]
    fn create_opens_interval_at_now() {
        let (clock, store) = store();

        let created = store.create(cashback(5), "admin").unwrap();

        assert_eq!(created.valid_from(), clock.now());
        assert!(created.is_current());
        assert_eq!(created.updated_by(), "admin");
        assert_eq!(store.get_current(7).unwrap(), created);
    }

    #[test]
    fn duplicate_create_is_rejected_and_leaves_current_alone() {
        let (_clock, store) = store();
        let first = store.create(cashback(5), "admin").unwrap();

        let err = store.create(cashback(99), "other").unwrap_err();

        assert_eq!(err, StoreError::DuplicateId { kind: "cashback", id: 7 });
        assert_eq!(store.get_current(7).unwrap(), first);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn missing_id_is_not_found() {
        let (_clock, store) = store();

        assert_eq!(
            store.get_current(1).unwrap_err(),
            StoreError::NotFound { kind: "cashback", id: 1 }
        );
        assert!(store.delete(1, "admin").is_err());
        assert!(store.update_with_history(1, cashback(5), "admin").is_err());
        assert!(store.replace(cashback(5), "admin").is_err());
    }

    #[test]
    fn update_with_history_closes_prior_and_abuts() {
        let (clock, store) = store();
        let t0 = clock.now();
        store.create(cashback(5), "admin").unwrap();
        clock.advance_seconds(60);
        let t1 = clock.now();

        let closed = store.update_with_history(7, cashback(10), "bob").unwrap();
        let current = store.get_current(7).unwrap();

        assert_eq!(closed.record().percent, 5);
        assert_eq!(closed.valid_from(), t0);
        assert_eq!(closed.valid_to(), t1);
        assert_eq!(current.record().percent, 10);
        assert_eq!(current.valid_from(), t1);
        assert_eq!(current.updated_by(), "bob");
        assert_eq!(store.history(7).unwrap().len(), 2);
    }

    #[test]
    fn update_with_history_forces_the_target_id() {
        let (_clock, store) = store();
        store.create(cashback(5), "admin").unwrap();

        let mut other = cashback(10);
        other.id = 99;
        store.update_with_history(7, other, "admin").unwrap();

        assert_eq!(store.get_current(7).unwrap().record().percent, 10);
        assert!(store.get_current(99).is_err());
    }

    #[test]
    fn frozen_clock_still_yields_distinct_closing_times() {
        let (_clock, store) = store();
        store.create(cashback(1), "admin").unwrap();
        store.update_with_history(7, cashback(2), "admin").unwrap();
        store.update_with_history(7, cashback(3), "admin").unwrap();

        let history = store.history(7).unwrap();
        assert!(history[0].valid_to() < history[1].valid_to());
        assert_eq!(history[0].valid_to(), history[1].valid_from());

        let restored = store.delete_and_restore_previous(7, "admin").unwrap();
        assert_eq!(restored.record().percent, 2);
    }

    #[test]
    fn replace_overwrites_without_history() {
        let (clock, store) = store();
        let created = store.create(cashback(5), "admin").unwrap();
        clock.advance_seconds(10);

        let prior = store.replace(cashback(8), "bob").unwrap();
        let current = store.get_current(7).unwrap();

        assert_eq!(prior, created);
        assert_eq!(current.record().percent, 8);
        assert_eq!(current.valid_from(), created.valid_from());
        assert_eq!(current.updated_by(), "bob");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn delete_removes_current_but_journals_it() {
        let (_clock, store) = store();
        let created = store.create(cashback(5), "admin").unwrap();

        let removed = store.delete(7, "bob").unwrap();

        assert_eq!(removed, created);
        assert!(store.get_current(7).is_err());
        assert!(store.is_empty().unwrap());

        let journal = store.journal(7).unwrap();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[1].kind, ChangeKind::Deleted);
        assert_eq!(journal[1].actor, "bob");
        assert_eq!(journal[1].digest, created.content_digest().unwrap());
    }

    #[test]
    fn delete_keeps_closed_versions() {
        let (clock, store) = store();
        store.create(cashback(5), "admin").unwrap();
        clock.advance_seconds(1);
        store.update_with_history(7, cashback(10), "admin").unwrap();

        store.delete(7, "admin").unwrap();

        let history = store.history(7).unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_current());
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn recreate_after_delete_is_allowed() {
        let (_clock, store) = store();
        store.create(cashback(5), "admin").unwrap();
        store.delete(7, "admin").unwrap();

        assert!(store.create(cashback(6), "admin").is_ok());
    }

    #[test]
    fn restore_without_history_fails_and_changes_nothing() {
        let (_clock, store) = store();
        let created = store.create(cashback(5), "admin").unwrap();

        let err = store.delete_and_restore_previous(7, "admin").unwrap_err();

        assert_eq!(err, StoreError::NoHistory { kind: "cashback", id: 7 });
        assert_eq!(store.get_current(7).unwrap(), created);
        assert_eq!(store.journal(7).unwrap().len(), 1);
    }

    #[test]
    fn restore_without_current_is_not_found() {
        let (_clock, store) = store();
        store.create(cashback(5), "admin").unwrap();
        store.update_with_history(7, cashback(6), "admin").unwrap();
        store.delete(7, "admin").unwrap();

        let err = store.delete_and_restore_previous(7, "admin").unwrap_err();
        assert_eq!(err, StoreError::NotFound { kind: "cashback", id: 7 });
    }

    #[test]
    fn as_of_finds_the_version_in_effect() {
        let (clock, store) = store();
        let t0 = clock.now();
        store.create(cashback(5), "admin").unwrap();
        clock.advance_seconds(100);
        store.update_with_history(7, cashback(10), "admin").unwrap();

        assert_eq!(store.as_of(7, t0).unwrap().record().percent, 5);
        assert_eq!(store.as_of(7, clock.now()).unwrap().record().percent, 10);
        assert!(store.as_of(7, at(2023, 1, 1, 0, 0, 0)).is_err());
    }

    #[test]
    fn seed_with_two_current_versions_is_an_integrity_fault() {
        let (_clock, shared) = MutableClock::shared(at(2024, 1, 1, 0, 0, 0));
        let seed = vec![
            Version::open(cashback(5), "admin", at(2023, 1, 1, 0, 0, 0)),
            Version::open(cashback(6), "admin", at(2023, 6, 1, 0, 0, 0)),
        ];

        let err = VersionStore::with_seed(shared, seed).err().unwrap();
        assert!(matches!(err, StoreError::IntegrityFault { id: 7, .. }));
    }

    #[test]
    fn seed_with_tied_closing_times_is_an_integrity_fault() {
        let (_clock, shared) = MutableClock::shared(at(2024, 1, 1, 0, 0, 0));
        let t = at(2023, 6, 1, 0, 0, 0);
        let seed = vec![
            Version::with_interval(
                cashback(5),
                "admin",
                ValidityInterval::new(at(2023, 1, 1, 0, 0, 0), t).unwrap(),
            ),
            Version::with_interval(cashback(6), "admin", ValidityInterval::new(t, t).unwrap()),
            Version::open(cashback(7), "admin", t),
        ];

        let err = VersionStore::with_seed(shared, seed).err().unwrap();
        assert!(matches!(err, StoreError::IntegrityFault { .. }));
    }

    #[test]
    fn seed_in_the_future_keeps_intervals_ordered() {
        let (_clock, shared) = MutableClock::shared(at(2024, 1, 1, 0, 0, 0));
        let future = at(2030, 1, 1, 0, 0, 0);
        let store =
            VersionStore::with_seed(shared, vec![Version::open(cashback(5), "seed", future)]).unwrap();

        let closed = store.update_with_history(7, cashback(6), "admin").unwrap();

        assert!(closed.valid_to() > future);
        assert!(closed.interval().is_well_formed());
    }

    #[test]
    fn system_clock_store_stamps_real_time() {
        let store = VersionStore::<Cashback>::with_system_clock();
        let before = TimeStamp::new();

        let created = store.create(cashback(5), "admin").unwrap();

        assert!(created.valid_from() >= before);
        assert_eq!(store.current_count().unwrap(), 1);
    }

    #[test]
    fn journal_is_hash_chained_across_operations() {
        let (clock, store) = store();
        store.create(cashback(5), "admin").unwrap();
        clock.advance_seconds(1);
        store.update_with_history(7, cashback(6), "bob").unwrap();
        store.replace(cashback(8), "bob").unwrap();
        store.delete_and_restore_previous(7, "admin").unwrap();
        store.delete(7, "admin").unwrap();

        let journal = store.journal_all().unwrap();
        assert_eq!(journal.len(), 5);
        assert!(journal[0].prev.is_none());
        for pair in journal.windows(2) {
            let (hash, _) = pair[0].build().unwrap();
            assert_eq!(pair[1].prev, Some(hash));
        }
    }

    #[test]
    fn failed_mutation_leaves_the_chain_untouched() {
        let (_clock, store) = store();
        store.create(cashback(5), "admin").unwrap();

        assert!(store.create(cashback(6), "admin").is_err());
        store.update_with_history(7, cashback(6), "admin").unwrap();

        let journal = store.journal_all().unwrap();
        let (first, _) = journal[0].build().unwrap();
        assert_eq!(journal[1].prev, Some(first));
    }
}

//! Read-only predicate filters over a store
//!
//! Comparison rules follow the service layer these stores back: amount ranges
//! are inclusive, "below"/"above" are strict, and date ranges exclude both
//! ends. A date range ending at the sentinel runs up to the store's "now". A
//! query sees current versions only unless asked for history.
use super::error::StoreResult;
use super::interval::TimeStamp;
use super::record::{EntityId, Record, Version};
use super::store::VersionStore;

/// Fields a record may expose to the filters. Absent fields never match.
pub trait Filterable: Record {
    fn amount(&self) -> Option<i64> {
        None
    }
    fn category(&self) -> Option<&str> {
        None
    }
    fn account_id(&self) -> Option<EntityId> {
        None
    }
    /// Free-text name: expense title, cashback bank.
    fn name(&self) -> Option<&str> {
        None
    }
    fn effective_date(&self) -> Option<TimeStamp> {
        None
    }
    fn is_recurring(&self) -> Option<bool> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    AmountBetween { min: i64, max: i64 },
    AmountBelow(i64),
    AmountAbove(i64),
    Category(String),
    Account(EntityId),
    Name(String),
    /// On the record's own date field.
    DateBetween { start: TimeStamp, end: TimeStamp },
    /// On the version's `valid_from`, i.e. when the snapshot was taken.
    ActualFromBetween { start: TimeStamp, end: TimeStamp },
    Recurring(bool),
}

impl Predicate {
    /// `now` replaces a sentinel `end` in the date ranges.
    pub fn matches<R: Filterable>(&self, version: &Version<R>, now: TimeStamp) -> bool {
        let record = version.record();
        match self {
            Predicate::AmountBetween { min, max } => {
                record.amount().is_some_and(|a| *min <= a && a <= *max)
            }
            Predicate::AmountBelow(limit) => record.amount().is_some_and(|a| a < *limit),
            Predicate::AmountAbove(limit) => record.amount().is_some_and(|a| a > *limit),
            Predicate::Category(category) => record.category() == Some(category.as_str()),
            Predicate::Account(id) => record.account_id() == Some(*id),
            Predicate::Name(name) => record.name() == Some(name.as_str()),
            Predicate::DateBetween { start, end } => record
                .effective_date()
                .is_some_and(|d| strictly_between(d, *start, *end, now)),
            Predicate::ActualFromBetween { start, end } => {
                strictly_between(version.valid_from(), *start, *end, now)
            }
            Predicate::Recurring(flag) => record.is_recurring() == Some(*flag),
        }
    }
}

fn strictly_between(t: TimeStamp, start: TimeStamp, end: TimeStamp, now: TimeStamp) -> bool {
    let end = if end.is_sentinel() { now } else { end };
    start < t && t < end
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    predicates: Vec<Predicate>,
    include_history: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn amount_between(self, min: i64, max: i64) -> Self {
        self.with(Predicate::AmountBetween { min, max })
    }
    pub fn amount_below(self, limit: i64) -> Self {
        self.with(Predicate::AmountBelow(limit))
    }
    pub fn amount_above(self, limit: i64) -> Self {
        self.with(Predicate::AmountAbove(limit))
    }
    pub fn category(self, category: impl Into<String>) -> Self {
        self.with(Predicate::Category(category.into()))
    }
    pub fn account(self, id: EntityId) -> Self {
        self.with(Predicate::Account(id))
    }
    pub fn name(self, name: impl Into<String>) -> Self {
        self.with(Predicate::Name(name.into()))
    }
    /// An open-ended `end` (the sentinel) is read as "up to now".
    pub fn date_between(self, start: TimeStamp, end: TimeStamp) -> Self {
        self.with(Predicate::DateBetween { start, end })
    }
    /// Versions that took effect strictly inside `(start, end)`. Balance
    /// snapshots are dated this way.
    pub fn actual_from_between(self, start: TimeStamp, end: TimeStamp) -> Self {
        self.with(Predicate::ActualFromBetween { start, end })
    }
    pub fn recurring(self, flag: bool) -> Self {
        self.with(Predicate::Recurring(flag))
    }
    /// Widens the query from current versions to every version ever kept.
    pub fn include_history(mut self) -> Self {
        self.include_history = true;
        self
    }
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }
    pub fn matches<R: Filterable>(&self, version: &Version<R>, now: TimeStamp) -> bool {
        self.predicates.iter().all(|p| p.matches(version, now))
    }
    pub fn run<R: Filterable>(&self, store: &VersionStore<R>) -> StoreResult<Vec<Version<R>>> {
        let now = store.now();
        let candidates = if self.include_history {
            store.all_versions()?
        } else {
            store.get_all()?
        };

        Ok(candidates
            .into_iter()
            .filter(|v| self.matches(v, now))
            .collect())
    }
}

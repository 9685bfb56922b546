//! Record adapter trait and the version envelope the stores keep
use super::error::{StoreError, StoreResult};
use super::interval::{TimeStamp, ValidityInterval};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;

/// Stable logical id of an entity. Never changes across versions.
pub type EntityId = i64;

/// Per record type glue: identity, field encoding and transport shape.
///
/// Carries no versioning rules, those live in [`crate::store::VersionStore`].
pub trait Record:
    Clone + Debug + PartialEq + Send + Sync + Serialize + DeserializeOwned + minicbor::Encode<()> + 'static
{
    /// Short name used in errors and log fields.
    const KIND: &'static str;

    fn id(&self) -> EntityId;
    fn set_id(&mut self, id: EntityId);

    /// sha256 over the CBOR encoding of the field data, interval excluded.
    fn content_digest(&self) -> StoreResult<String> {
        let contents = minicbor::to_vec(self).map_err(|e| StoreError::Encoding(e.to_string()))?;
        Ok(sha256::digest(&contents))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "R: Serialize", deserialize = "R: DeserializeOwned"))]
pub struct Version<R> {
    #[serde(flatten)]
    record: R,
    #[serde(rename = "upd_by")]
    updated_by: String,
    #[serde(flatten)]
    interval: ValidityInterval,
}

impl<R: Record> Version<R> {
    /// A version that is current from `valid_from` onwards.
    pub fn open(record: R, updated_by: impl Into<String>, valid_from: TimeStamp) -> Self {
        Self {
            record,
            updated_by: updated_by.into(),
            interval: ValidityInterval::open(valid_from),
        }
    }
    pub fn with_interval(record: R, updated_by: impl Into<String>, interval: ValidityInterval) -> Self {
        Self {
            record,
            updated_by: updated_by.into(),
            interval,
        }
    }
    pub fn id(&self) -> EntityId {
        self.record.id()
    }
    pub fn record(&self) -> &R {
        &self.record
    }
    pub fn updated_by(&self) -> &str {
        &self.updated_by
    }
    pub fn interval(&self) -> &ValidityInterval {
        &self.interval
    }
    pub fn valid_from(&self) -> TimeStamp {
        self.interval.valid_from()
    }
    pub fn valid_to(&self) -> TimeStamp {
        self.interval.valid_to()
    }
    pub fn is_current(&self) -> bool {
        self.interval.is_current()
    }
    pub fn set_valid_from(&mut self, at: TimeStamp) {
        self.interval.set_valid_from(at);
    }
    pub fn set_valid_to(&mut self, at: TimeStamp) {
        self.interval.set_valid_to(at);
    }
    pub fn set_updated_by(&mut self, actor: impl Into<String>) {
        self.updated_by = actor.into();
    }
    pub fn content_digest(&self) -> StoreResult<String> {
        self.record.content_digest()
    }
    pub fn to_transport(&self) -> StoreResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
    pub fn from_transport(value: serde_json::Value) -> StoreResult<Self> {
        let version: Self = serde_json::from_value(value)?;
        if !version.interval.is_well_formed() {
            return Err(StoreError::InvalidInterval {
                from: version.valid_from(),
                to: version.valid_to(),
            });
        }
        Ok(version)
    }

    pub(crate) fn interval_mut(&mut self) -> &mut ValidityInterval {
        &mut self.interval
    }
}

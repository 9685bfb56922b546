use crate::filter::Filterable;
use crate::record::{EntityId, Record};
use serde::{Deserialize, Serialize};

/// Account balance snapshot and the operation that last moved it.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    #[n(0)]
    #[serde(rename = "id_remains")]
    pub id: EntityId,
    #[n(1)]
    #[serde(rename = "id_accaunt")]
    pub account_id: EntityId,
    #[n(2)]
    pub amount: i64,
    #[n(3)]
    pub last_update_amount: i64,
    #[n(4)]
    pub last_update_id: EntityId,
    #[n(5)]
    pub last_update_group: String,
}

impl Balance {
    pub fn new(id: EntityId, account_id: EntityId, amount: i64) -> Self {
        Self {
            id,
            account_id,
            amount,
            last_update_amount: 0,
            last_update_id: 0,
            last_update_group: String::new(),
        }
    }
    /// Records an operation of `delta` minor units against the balance.
    /// The amount saturates at the `i64` bounds.
    pub fn apply(mut self, operation_id: EntityId, group: impl Into<String>, delta: i64) -> Self {
        self.amount = self.amount.saturating_add(delta);
        self.last_update_amount = delta;
        self.last_update_id = operation_id;
        self.last_update_group = group.into();
        self
    }
}

impl Record for Balance {
    const KIND: &'static str = "balance";

    fn id(&self) -> EntityId {
        self.id
    }
    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

impl Filterable for Balance {
    fn amount(&self) -> Option<i64> {
        Some(self.amount)
    }
    fn account_id(&self) -> Option<EntityId> {
        Some(self.account_id)
    }
    fn category(&self) -> Option<&str> {
        Some(&self.last_update_group)
    }
}

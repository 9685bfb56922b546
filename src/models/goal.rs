use crate::filter::Filterable;
use crate::interval::TimeStamp;
use crate::record::{EntityId, Record};
use serde::{Deserialize, Serialize};

/// Savings target to reach by a deadline. `amount` is in minor units.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    #[n(0)]
    #[serde(rename = "id_goal")]
    pub id: EntityId,
    #[n(1)]
    #[serde(rename = "id_accaunt")]
    pub account_id: EntityId,
    #[n(2)]
    pub amount: i64,
    #[n(3)]
    #[serde(rename = "date")]
    pub deadline: TimeStamp,
}

impl Goal {
    pub fn new(id: EntityId, account_id: EntityId, amount: i64, deadline: TimeStamp) -> Self {
        Self {
            id,
            account_id,
            amount,
            deadline,
        }
    }
    pub fn set_amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }
}

impl Record for Goal {
    const KIND: &'static str = "goal";

    fn id(&self) -> EntityId {
        self.id
    }
    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

impl Filterable for Goal {
    fn amount(&self) -> Option<i64> {
        Some(self.amount)
    }
    fn account_id(&self) -> Option<EntityId> {
        Some(self.account_id)
    }
    fn effective_date(&self) -> Option<TimeStamp> {
        Some(self.deadline)
    }
}

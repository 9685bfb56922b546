use crate::filter::Filterable;
use crate::record::{EntityId, Record};
use serde::{Deserialize, Serialize};

/// Cashback rate a bank pays on one spending category.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cashback {
    #[n(0)]
    #[serde(rename = "id_cashback")]
    pub id: EntityId,
    #[n(1)]
    #[serde(rename = "id_accaunt")]
    pub account_id: EntityId,
    #[n(2)]
    pub bank_name: String,
    #[n(3)]
    pub category: String,
    #[n(4)]
    pub percent: u8,
}

impl Cashback {
    pub fn new(
        id: EntityId,
        account_id: EntityId,
        bank_name: impl Into<String>,
        category: impl Into<String>,
        percent: u8,
    ) -> Self {
        Self {
            id,
            account_id,
            bank_name: bank_name.into(),
            category: category.into(),
            percent,
        }
    }
    pub fn set_percent(mut self, percent: u8) -> Self {
        self.percent = percent;
        self
    }
    pub fn set_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

impl Record for Cashback {
    const KIND: &'static str = "cashback";

    fn id(&self) -> EntityId {
        self.id
    }
    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

impl Filterable for Cashback {
    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }
    fn account_id(&self) -> Option<EntityId> {
        Some(self.account_id)
    }
    fn name(&self) -> Option<&str> {
        Some(&self.bank_name)
    }
}

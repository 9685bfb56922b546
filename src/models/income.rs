use crate::filter::Filterable;
use crate::record::{EntityId, Record};
use serde::{Deserialize, Serialize};

/// Income actually received, linked to the expected income it settles.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Income {
    #[n(0)]
    #[serde(rename = "id_income")]
    pub id: EntityId,
    #[n(1)]
    #[serde(rename = "id_accaunt")]
    pub account_id: EntityId,
    #[n(2)]
    #[serde(rename = "id_income_expected")]
    pub expected_income_id: EntityId,
    #[n(3)]
    pub amount: i64,
    #[n(4)]
    pub expected_amount: i64,
    #[n(5)]
    #[serde(rename = "type_income")]
    pub income_type: String,
    #[n(6)]
    #[serde(rename = "income_month_month")]
    pub month: u8,
    #[n(7)]
    #[serde(rename = "income_month_date")]
    pub day_of_month: u8,
}

impl Income {
    pub fn new(id: EntityId, account_id: EntityId, income_type: impl Into<String>) -> Self {
        Self {
            id,
            account_id,
            expected_income_id: 0,
            amount: 0,
            expected_amount: 0,
            income_type: income_type.into(),
            month: 1,
            day_of_month: 1,
        }
    }
    pub fn set_expected(mut self, expected_income_id: EntityId, expected_amount: i64) -> Self {
        self.expected_income_id = expected_income_id;
        self.expected_amount = expected_amount;
        self
    }
    pub fn set_amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }
    pub fn set_received_on(mut self, month: u8, day_of_month: u8) -> Self {
        self.month = month;
        self.day_of_month = day_of_month;
        self
    }
    /// How far the received amount falls short of the expected one. Negative on overpayment.
    pub fn shortfall(&self) -> i64 {
        self.expected_amount - self.amount
    }
}

impl Record for Income {
    const KIND: &'static str = "income";

    fn id(&self) -> EntityId {
        self.id
    }
    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

impl Filterable for Income {
    fn amount(&self) -> Option<i64> {
        Some(self.amount)
    }
    fn category(&self) -> Option<&str> {
        Some(&self.income_type)
    }
    fn account_id(&self) -> Option<EntityId> {
        Some(self.account_id)
    }
}

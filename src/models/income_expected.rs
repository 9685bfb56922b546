use crate::filter::Filterable;
use crate::record::{EntityId, Record};
use serde::{Deserialize, Serialize};

/// Income an account expects every month, e.g. a salary.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedIncome {
    #[n(0)]
    #[serde(rename = "id_income_ex")]
    pub id: EntityId,
    #[n(1)]
    #[serde(rename = "id_accaunt")]
    pub account_id: EntityId,
    #[n(2)]
    pub amount: i64,
    #[n(3)]
    #[serde(rename = "type_income")]
    pub income_type: String,
    // 1-31
    #[n(4)]
    #[serde(rename = "income_month_date")]
    pub day_of_month: u8,
}

impl ExpectedIncome {
    pub fn new(
        id: EntityId,
        account_id: EntityId,
        amount: i64,
        income_type: impl Into<String>,
        day_of_month: u8,
    ) -> Self {
        Self {
            id,
            account_id,
            amount,
            income_type: income_type.into(),
            day_of_month,
        }
    }
    pub fn set_amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }
}

impl Record for ExpectedIncome {
    const KIND: &'static str = "income_expected";

    fn id(&self) -> EntityId {
        self.id
    }
    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

impl Filterable for ExpectedIncome {
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

use crate::filter::Filterable;
use crate::interval::TimeStamp;
use crate::record::{EntityId, Record};
use serde::{Deserialize, Serialize};

/// One-off or monthly expense. `date` is when a one-off purchase happened.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    #[n(0)]
    #[serde(rename = "id_expence")]
    pub id: EntityId,
    #[n(1)]
    #[serde(rename = "group_expence")]
    pub group: String,
    #[n(2)]
    #[serde(rename = "title_expence")]
    pub title: String,
    #[n(3)]
    #[serde(rename = "description_expence")]
    pub description: String,
    #[n(4)]
    #[serde(rename = "repeat", with = "repeat_flag")]
    pub recurring: bool,
    #[n(5)]
    pub amount: i64,
    #[n(6)]
    pub date: TimeStamp,
}

impl Expense {
    pub fn new(id: EntityId, group: impl Into<String>, title: impl Into<String>, amount: i64, date: TimeStamp) -> Self {
        Self {
            id,
            group: group.into(),
            title: title.into(),
            description: String::new(),
            recurring: false,
            amount,
            date,
        }
    }
    pub fn set_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
    pub fn set_recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }
    pub fn set_amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }
}

// the transport carries the flag as 0/1
mod repeat_flag {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(D::Error::custom(format!("repeat must be 0 or 1, got {other}"))),
        }
    }
}

impl Record for Expense {
    const KIND: &'static str = "expense";

    fn id(&self) -> EntityId {
        self.id
    }
    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

impl Filterable for Expense {
    fn amount(&self) -> Option<i64> {
        Some(self.amount)
    }
    fn category(&self) -> Option<&str> {
        Some(&self.group)
    }
    fn name(&self) -> Option<&str> {
        Some(&self.title)
    }
    fn effective_date(&self) -> Option<TimeStamp> {
        Some(self.date)
    }
    fn is_recurring(&self) -> Option<bool> {
        Some(self.recurring)
    }
}

use crate::interval::TimeStamp;
use crate::record::EntityId;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} has no current version")]
    NotFound { kind: &'static str, id: EntityId },
    #[error("{kind} {id} already has a current version")]
    DuplicateId { kind: &'static str, id: EntityId },
    #[error("{kind} {id} has no closed version to restore")]
    NoHistory { kind: &'static str, id: EntityId },
    #[error("integrity fault on {kind} {id}: {detail}")]
    IntegrityFault {
        kind: &'static str,
        id: EntityId,
        detail: String,
    },
    #[error("valid_from {from} is after valid_to {to}")]
    InvalidInterval { from: TimeStamp, to: TimeStamp },
    #[error("cannot parse timestamp {0:?}")]
    InvalidTimestamp(String),
    #[error("transport conversion failed: {0}")]
    Transport(String),
    #[error("cbor encoding failed: {0}")]
    Encoding(String),
    #[error("{0} store lock was poisoned")]
    LockPoisoned(&'static str),
}

impl StoreError {
    /// Status code the HTTP layer answers with for this failure.
    pub fn http_status(&self) -> u16 {
        match self {
            StoreError::NotFound { .. } | StoreError::NoHistory { .. } => 404,
            StoreError::DuplicateId { .. } => 409,
            StoreError::InvalidTimestamp(_) | StoreError::Transport(_) => 400,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Transport(value.to_string())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid yaml config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid json config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format {0:?}, use .yaml, .yml or .json")]
    UnsupportedFormat(String),
    #[error("failed to initialise logging: {0}")]
    Telemetry(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_map_to_client_statuses() {
        let not_found = StoreError::NotFound { kind: "cashback", id: 7 };
        let duplicate = StoreError::DuplicateId { kind: "cashback", id: 7 };
        let no_history = StoreError::NoHistory { kind: "cashback", id: 7 };

        assert_eq!(not_found.http_status(), 404);
        assert_eq!(duplicate.http_status(), 409);
        assert_eq!(no_history.http_status(), 404);
    }

    #[test]
    fn integrity_fault_is_a_server_error() {
        let fault = StoreError::IntegrityFault {
            kind: "goal",
            id: 1,
            detail: "two current versions".into(),
        };

        assert_eq!(fault.http_status(), 500);
        assert_eq!(
            fault.to_string(),
            "integrity fault on goal 1: two current versions"
        );
    }
}

use core::time::Duration;

use thiserror::Error;

use crate::{cluster::Verb, key::ObjectKey};

pub type Result<T, E = Error> = ::core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} {key} not found")]
    NotFound { kind: String, key: ObjectKey },
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: String, key: ObjectKey },
    #[error("{kind} {key} was modified concurrently")]
    Conflict { kind: String, key: ObjectKey },
    #[error("{kind} {key} disappeared while converging")]
    Vanished { kind: String, key: ObjectKey },
    #[error("timed out after {timeout:?} on {verb} {kind} {key}")]
    Timeout {
        verb: Verb,
        kind: String,
        key: ObjectKey,
        timeout: Duration,
    },
    #[error("{kind} {name:?} has no {field}")]
    MissingMetadata {
        kind: String,
        name: String,
        field: &'static str,
    },
    #[error("failed to {verb} {kind} {key}: {source}")]
    Api {
        verb: Verb,
        kind: String,
        key: ObjectKey,
        #[source]
        source: ::kube::Error,
    },
}

impl Error {
    pub(crate) fn from_kube(source: ::kube::Error, verb: Verb, kind: String, key: ObjectKey) -> Self {
        match &source {
            ::kube::Error::Api(response) if response.code == 404 => Self::NotFound { kind, key },
            ::kube::Error::Api(response)
                if response.code == 409 && response.reason == "AlreadyExists" =>
            {
                Self::AlreadyExists { kind, key }
            }
            ::kube::Error::Api(response) if response.code == 409 => Self::Conflict { kind, key },
            _ => Self::Api {
                verb,
                kind,
                key,
                source,
            },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Whether a later pass with fresh reads may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::MissingMetadata { .. })
    }
}

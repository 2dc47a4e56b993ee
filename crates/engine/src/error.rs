use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{operation} failed")]
    Store {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("malformed {collection} document")]
    Decode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Logs a store failure with its request context and wraps it. Never retried.
pub(crate) fn store_failure(operation: String, source: anyhow::Error) -> ServiceError {
    error!("{} failed: {:?}", operation, source);
    ServiceError::Store { operation, source }
}

pub(crate) fn decode_failure(collection: &'static str, source: serde_json::Error) -> ServiceError {
    error!("Decoding {} document failed: {}", collection, source);
    ServiceError::Decode { collection, source }
}

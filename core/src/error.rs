//! Error types for the HashiCups API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." All other non-200 responses land in `Http` with the raw status
//! code and body for debugging.
//!
//! The custom order flow wraps read failures in `CatalogFetch` and
//! `IngredientFetch` so the caller can tell which step failed. A coffee ID
//! missing from the catalog is an `IngredientFetch` with a `NotFound` source.
//! Rejected customization requests are `Validation`, raised before anything is
//! written for that item.

use thiserror::Error;

/// Errors returned by `HashicupsClient` parse methods and `Session` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-200 status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The transport could not execute the request.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A custom order item was rejected before any write for it.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server answered 200 with a body that is not the expected
    /// confirmation. The message is the body verbatim.
    #[error("{0}")]
    Remote(String),

    /// The coffee catalog could not be read.
    #[error("failed to fetch coffee catalog: {0}")]
    CatalogFetch(#[source] Box<ApiError>),

    /// The canonical ingredients of a coffee could not be read.
    #[error("failed to fetch ingredients of coffee {coffee_id}: {source}")]
    IngredientFetch {
        coffee_id: i64,
        #[source]
        source: Box<ApiError>,
    },
}

/// Reasons a customization request is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("coffee {coffee_id} must have a name")]
    MissingName { coffee_id: i64 },

    #[error("coffee {name:?} must differ from original name")]
    SameName { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_body_verbatim() {
        let err = ApiError::Remote("order 9 is being prepared".to_string());
        assert_eq!(err.to_string(), "order 9 is being prepared");
    }

    #[test]
    fn validation_error_is_transparent() {
        let err: ApiError = ValidationError::MissingName { coffee_id: 3 }.into();
        assert_eq!(err.to_string(), "coffee 3 must have a name");
    }

    #[test]
    fn ingredient_fetch_names_the_coffee() {
        let err = ApiError::IngredientFetch {
            coffee_id: 5,
            source: Box::new(ApiError::NotFound),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch ingredients of coffee 5: resource not found"
        );
    }
}

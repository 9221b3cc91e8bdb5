use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::store::StoreError;

/// First offending search parameter. Display text is the 400 body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid lat")]
    Lat,
    #[error("Invalid lng")]
    Lng,
    #[error("Invalid radius_km")]
    RadiusKm,
    #[error("Invalid dropoff")]
    MissingDropoff,
    #[error("Invalid dropoff datetime format. Use ISO format")]
    MalformedDropoff,
    #[error("Invalid pickup")]
    MissingPickup,
    #[error("Invalid pickup datetime format. Use ISO format")]
    MalformedPickup,
    #[error("pickup must be after dropoff")]
    PickupNotAfterDropoff,
    #[error("Invalid bag_count")]
    BagCount,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Store failures are not echoed to clients.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::Store(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(e) => tracing::debug!("rejected search: {e}"),
            ApiError::Store(e) => tracing::error!("store error during search: {e}"),
        }
        (self.status_code(), self.user_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::from(ValidationError::Lat);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "Invalid lat");
    }

    #[test]
    fn store_error_is_internal_and_opaque() {
        let err = ApiError::from(StoreError::NotFound(Ulid::new()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Internal server error");
    }
}

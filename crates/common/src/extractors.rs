//! Validating axum extractors
//!
//! Request bodies and query strings are deserialised and validated at the
//! boundary, before handlers build typed requests from them.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::Error;

/// JSON extractor that validates the deserialized value automatically.
///
/// All input errors (deserialization + validation) return 400.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

/// Query-string extractor with the same validation contract as `ValidatedJson`.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

/// Rejection for the validating extractors; always a 400.
#[derive(Debug)]
pub enum ValidationRejection {
    Json(JsonRejection),
    Query(QueryRejection),
    Invalid(Error),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        match self {
            ValidationRejection::Json(e) => Error::Validation(e.body_text()).into_response(),
            ValidationRejection::Query(e) => Error::Validation(e.body_text()).into_response(),
            ValidationRejection::Invalid(e) => e.into_response(),
        }
    }
}

fn validate<T: Validate>(value: &T) -> Result<(), ValidationRejection> {
    value.validate().map_err(|e| {
        ValidationRejection::Invalid(Error::Validation(format!("Validation failed: {}", e)))
    })
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        validate(&value)?;
        Ok(ValidatedJson(value))
    }
}

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Query)?;
        validate(&value)?;
        Ok(ValidatedQuery(value))
    }
}

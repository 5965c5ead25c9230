//! `Authorization` header parsing
//!
//! Both schemes share one shape: exactly two space-separated parts, the
//! first being the case-insensitive scheme name.

use axum::http::HeaderValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::AuthError;

/// Split `<scheme> <payload>` and check the scheme name.
fn split_scheme<'a>(header: &'a str, scheme: &str) -> Result<&'a str, AuthError> {
    let parts: Vec<&str> = header.split(' ').collect();
    let [name, payload] = parts.as_slice() else {
        return Err(AuthError::BadFormat);
    };

    if !name.eq_ignore_ascii_case(scheme) || payload.is_empty() {
        return Err(AuthError::BadFormat);
    }

    Ok(*payload)
}

/// Parse `Basic base64(identifier:secret)` into its two fields.
pub fn parse_basic(header: &str) -> Result<(String, String), AuthError> {
    let payload = split_scheme(header, "basic")?;

    let decoded = STANDARD.decode(payload).map_err(|_| AuthError::BadFormat)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::BadFormat)?;

    let fields: Vec<&str> = decoded.split(':').collect();
    match fields.as_slice() {
        [identifier, secret] => Ok((identifier.to_string(), secret.to_string())),
        _ => Err(AuthError::BadFormat),
    }
}

/// Parse `Bearer <token>` and return the raw token.
pub fn parse_bearer(header: &str) -> Result<String, AuthError> {
    split_scheme(header, "bearer").map(str::to_string)
}

pub(crate) fn header_str(header: &HeaderValue) -> Result<&str, AuthError> {
    header.to_str().map_err(|_| AuthError::BadFormat)
}

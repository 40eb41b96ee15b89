use crate::error::Error;
use crate::store::Store;
use crate::types::User;

#[derive(Debug, PartialEq, Eq)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    InternalError,
}

/// Extracts a bearer token from the Authorization header.
/// Returns None if no auth header is present.
/// Returns Err if the header uses another scheme or carries no token.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> Result<Option<String>, TokenValidationError> {
    let Some(header) = auth_header else {
        return Ok(None);
    };

    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(TokenValidationError::InvalidScheme)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(TokenValidationError::InvalidScheme);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(TokenValidationError::InvalidToken);
    }
    Ok(Some(token.to_string()))
}

/// Resolves a raw token to its user through the store.
pub fn validate_token(store: &dyn Store, raw_token: &str) -> Result<User, TokenValidationError> {
    store.resolve_session(raw_token).map_err(|e| match e {
        Error::Unauthorized => TokenValidationError::InvalidToken,
        other => {
            tracing::warn!("Session lookup failed: {other}");
            TokenValidationError::InternalError
        }
    })
}

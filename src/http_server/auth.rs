//! Caller identity for HTTP requests
//!
//! Token validation belongs to the authentication layer in front of this
//! server. Here a bearer token is accepted when it is the caller's user id,
//! either in the `Authorization` header or, for `EventSource` clients that
//! cannot set headers, in a `token` query parameter.

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::realtime::{Principal, RealtimeError, RealtimeResult};

/// Resolve the calling principal from headers or a query token
pub fn principal_from(headers: &HeaderMap, query_token: Option<&str>) -> RealtimeResult<Principal> {
    let header_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let token = header_token
        .or(query_token)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(RealtimeError::AuthenticationRequired)?;

    Uuid::parse_str(token)
        .map(Principal::new)
        .map_err(|_| RealtimeError::AuthenticationRequired)
}

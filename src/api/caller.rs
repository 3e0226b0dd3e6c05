use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::gateway::records::CallerIdentity;

pub const CALLER_ID_HEADER: &str = "x-caller-id";
pub const CALLER_EMAIL_HEADER: &str = "x-caller-email";
pub const CALLER_NAME_HEADER: &str = "x-caller-name";
pub const CALLER_AVATAR_HEADER: &str = "x-caller-avatar";

/// Identity forwarded by the auth proxy in front of the gateway. Every
/// field is optional; handlers decide what they need.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub CallerIdentity);

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(CallerIdentity {
            id: header(parts, CALLER_ID_HEADER),
            email: header(parts, CALLER_EMAIL_HEADER),
            name: header(parts, CALLER_NAME_HEADER),
            avatar_url: header(parts, CALLER_AVATAR_HEADER),
        }))
    }
}

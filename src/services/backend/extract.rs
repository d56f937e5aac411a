use super::accounts::Session;
use super::error::ApiError;
use super::BackendState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;

/// Bearer authentication. Handlers list it ahead of any body extractor so an
/// anonymous request is a 401 whatever its body looks like.
#[axum::async_trait]
impl FromRequestParts<BackendState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &BackendState,
    ) -> Result<Self, Self::Rejection> {
        state.lock().accounts.authenticate(&parts.headers)
    }
}

/// `Json<T>` whose rejections come back as [`ApiError`] bodies.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => data_error(&e.body_text()),
            JsonRejection::JsonSyntaxError(e) => Self::detail(
                StatusCode::BAD_REQUEST,
                format!("JSON parse error - {}", reason(&e.body_text())),
            ),
            JsonRejection::MissingJsonContentType(_) => Self::detail(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported media type in request; expected application/json.",
            ),
            other => Self::detail(other.status(), other.body_text()),
        }
    }
}

/// Drops axum's "Failed to ... target type: " preamble.
fn reason(text: &str) -> &str {
    text.split_once(": ").map_or(text, |(_, rest)| rest)
}

/// `"<path>: <message>"` becomes `{"<top-level field>": ["<message>"]}`; errors
/// with no field path (a missing field, a non-object body) go under
/// `non_field_errors`.
fn data_error(text: &str) -> ApiError {
    let reason = reason(text);
    match reason.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(' ') => {
            let field = path.split(['.', '[']).next().unwrap_or(path);
            ApiError::field(field, message)
        }
        _ => ApiError::field("non_field_errors", reason),
    }
}

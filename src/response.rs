use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::AppError;

/// `{code, status, data}` envelope returned on every path.
#[derive(Debug, Serialize)]
pub struct WebResponse<T> {
    pub code: u16,
    pub status: String,
    pub data: T,
}

/// Uppercased canonical reason, e.g. `BAD REQUEST`.
pub fn status_tag(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
}

impl<T: Serialize> WebResponse<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self {
            code: status.as_u16(),
            status: status_tag(status),
            data,
        }
    }

    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Self {
        Self::new(StatusCode::CREATED, data)
    }
}

impl<T: Serialize> IntoResponse for WebResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// `Json` whose rejection is rendered in the envelope instead of axum's plain text.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(AppError::Validation(rejection_message(rejection))),
        }
    }
}

fn rejection_message(rejection: JsonRejection) -> String {
    rejection.body_text()
}

/// `Path` whose rejection is rendered in the envelope. The parser's own text
/// is logged, not returned.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => {
                debug!(uri = %parts.uri, reason = %rejection.body_text(), "path rejected");
                Err(AppError::validation("invalid path parameter"))
            }
        }
    }
}

/// Fallback for unmatched routes.
pub async fn route_not_found() -> AppError {
    AppError::not_found("route not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tags_match_envelope_vocabulary() {
        assert_eq!(status_tag(StatusCode::OK), "OK");
        assert_eq!(status_tag(StatusCode::BAD_REQUEST), "BAD REQUEST");
        assert_eq!(status_tag(StatusCode::UNAUTHORIZED), "UNAUTHORIZED");
        assert_eq!(
            status_tag(StatusCode::INTERNAL_SERVER_ERROR),
            "INTERNAL SERVER ERROR"
        );
    }

    #[test]
    fn envelope_serializes_code_status_data() {
        let body = serde_json::to_value(WebResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(body["code"], 200);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["data"], serde_json::json!([1, 2]));
    }
}

//! axum glue: JSON error bodies, plus JSON and query extractors that report
//! rejections in the same shape

use axum::Json;
use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ErrorKind, HttpError, UpstreamError};

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

/// Build an error response for `kind` with a client-facing message
pub fn error_response(kind: ErrorKind, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: message.into(),
        kind: kind.as_str(),
    };

    (kind.status_code(), Json(body)).into_response()
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.client_message())
    }
}

/// `Json<T>` that turns every rejection into an `InvalidInput` response
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: http::Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_response(&rejection)),
        }
    }
}

/// `Query<T>` that turns a malformed query string into an `InvalidInput` response
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection_response(&rejection)),
        }
    }
}

fn query_rejection_response(rejection: &QueryRejection) -> Response {
    let message = rejection.body_text();

    tracing::debug!(error = %message, "rejected query string");
    error_response(ErrorKind::InvalidInput, message)
}

fn rejection_response(rejection: &JsonRejection) -> Response {
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => "expected Content-Type: application/json".to_owned(),
        other => other.body_text(),
    };

    tracing::debug!(error = %message, "rejected request body");
    error_response(ErrorKind::InvalidInput, message)
}

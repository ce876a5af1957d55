// Extractors that report malformed requests as API errors
use crate::domain::error::Operation;
use crate::infrastructure::http_response::ApiError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{
        FromRequest, FromRequestParts, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// A body or path that did not have the expected shape. Handlers attach the
/// operation with [`ShapeRejection::during`].
#[derive(Debug)]
pub struct ShapeRejection(String);

impl ShapeRejection {
    pub fn during(self, operation: Operation) -> ApiError {
        ApiError::Shape {
            operation,
            message: self.0,
        }
    }
}

impl From<JsonRejection> for ShapeRejection {
    fn from(rejection: JsonRejection) -> Self {
        ShapeRejection(rejection.body_text())
    }
}

impl From<PathRejection> for ShapeRejection {
    fn from(rejection: PathRejection) -> Self {
        ShapeRejection(rejection.body_text())
    }
}

impl IntoResponse for ShapeRejection {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.0).into_response()
    }
}

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ShapeRejection))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ShapeRejection))]
pub struct ApiPath<T>(pub T);

/// JSON body that may be left out entirely. An empty body yields
/// `T::default()`; anything else must decode.
#[derive(Debug)]
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ShapeRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ShapeRejection(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(OptionalJson)
            .map_err(|e| ShapeRejection(format!("Failed to parse the request body as JSON: {}", e)))
    }
}

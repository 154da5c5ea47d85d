/// HTTP middleware utilities for engagement-service
///
/// Authentication happens upstream: the gateway forwards the authenticated user
/// in the `X-User-Id` header. These extractors turn that header into a viewer
/// identity for handlers.
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// Authenticated caller; rejects the request with 401 when absent.
#[derive(Debug, Clone, Copy)]
pub struct ViewerId(pub Uuid);

/// Caller identity when present. Anonymous reads are allowed.
#[derive(Debug, Clone, Copy)]
pub struct OptionalViewerId(pub Option<Uuid>);

fn viewer_from_header(req: &HttpRequest) -> Result<Option<Uuid>, AppError> {
    match req.headers().get(USER_ID_HEADER) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(Some)
            .ok_or_else(|| AppError::Unauthorized("Invalid user ID".to_string())),
    }
}

impl FromRequest for ViewerId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(viewer_from_header(req).and_then(|viewer| {
            viewer
                .map(ViewerId)
                .ok_or_else(|| AppError::Unauthorized("User ID missing".to_string()))
        }))
    }
}

impl FromRequest for OptionalViewerId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(viewer_from_header(req).map(OptionalViewerId))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_viewer_header_parsing() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .to_http_request();
        let viewer = ViewerId::extract(&req).await.unwrap();
        assert_eq!(viewer.0, id);

        let req = TestRequest::default().to_http_request();
        assert!(ViewerId::extract(&req).await.is_err());
        assert!(OptionalViewerId::extract(&req).await.unwrap().0.is_none());

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .to_http_request();
        assert!(OptionalViewerId::extract(&req).await.is_err());
    }
}

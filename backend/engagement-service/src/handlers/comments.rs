use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::ViewerId;
use crate::models::Target;
use crate::services::EngagementService;

/// Exactly one of `post_id` / `comment_id` must be set
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub text: String,
}

pub async fn create_comment(
    viewer: ViewerId,
    body: web::Json<CreateCommentRequest>,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    let target = Target::from_parts(body.post_id, body.comment_id)?;
    let comment = service.add_comment(viewer.0, target, &body.text).await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn delete_comment(
    comment_id: web::Path<Uuid>,
    viewer: ViewerId,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    service
        .delete_comment(viewer.0, comment_id.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn retract_comment_votes(
    comment_id: web::Path<Uuid>,
    viewer: ViewerId,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    let retracted = service
        .retract_votes_as_author(viewer.0, Target::Comment(comment_id.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "retracted": retracted })))
}

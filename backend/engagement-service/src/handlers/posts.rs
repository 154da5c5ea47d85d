use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::{OptionalViewerId, ViewerId};
use crate::models::{PostEdit, Target};
use crate::services::EngagementService;

/// Post detail with the full discussion tree
pub async fn get_post(
    post_id: web::Path<Uuid>,
    viewer: OptionalViewerId,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    let view = service
        .get_post_detail(viewer.0, post_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn edit_post(
    post_id: web::Path<Uuid>,
    viewer: ViewerId,
    body: web::Json<PostEdit>,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    let post = service
        .edit_post(viewer.0, post_id.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    post_id: web::Path<Uuid>,
    viewer: ViewerId,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    service.delete_post(viewer.0, post_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_post_revisions(
    post_id: web::Path<Uuid>,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    let revisions = service.post_revisions(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(revisions))
}

pub async fn retract_post_votes(
    post_id: web::Path<Uuid>,
    viewer: ViewerId,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    let retracted = service
        .retract_votes_as_author(viewer.0, Target::Post(post_id.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "retracted": retracted })))
}

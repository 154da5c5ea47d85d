use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::OptionalViewerId;
use crate::services::{EngagementService, FeedQuery, SortMode};

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    #[serde(default = "default_page")]
    pub page: usize,
    pub size: Option<usize>,
    pub sort: Option<String>,
}

fn default_page() -> usize {
    1
}

impl FeedQueryParams {
    pub(crate) fn to_query(&self) -> FeedQuery {
        FeedQuery {
            page: self.page,
            size: self.size,
            sort: SortMode::parse(self.sort.as_deref()),
        }
    }
}

pub async fn get_feed(
    query: web::Query<FeedQueryParams>,
    viewer: OptionalViewerId,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    debug!(
        "Feed request: viewer={:?} page={} size={:?} sort={:?}",
        viewer.0, query.page, query.size, query.sort
    );

    let page = service.get_feed(viewer.0, query.to_query()).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_author_feed(
    author_id: web::Path<Uuid>,
    query: web::Query<FeedQueryParams>,
    viewer: OptionalViewerId,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    let page = service
        .get_author_feed(author_id.into_inner(), viewer.0, query.to_query())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_dashboard(service: web::Data<EngagementService>) -> Result<HttpResponse> {
    let summary = service.get_dashboard_summary().await?;
    Ok(HttpResponse::Ok().json(summary))
}

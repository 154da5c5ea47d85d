/// HTTP handlers for engagement endpoints
///
/// This module contains handlers for:
/// - Feed: ranked global and per-author feeds, dashboard
/// - Posts: detail view, edit with revision history, soft delete
/// - Votes: cast and retract
/// - Comments: create and soft delete
pub mod comments;
pub mod feed;
pub mod posts;
pub mod votes;

use actix_web::web;

// Re-export handler functions at module level
pub use comments::{create_comment, delete_comment, retract_comment_votes};
pub use feed::{get_author_feed, get_dashboard, get_feed};
pub use posts::{delete_post, edit_post, get_post, get_post_revisions, retract_post_votes};
pub use votes::cast_vote;

/// Register the `/api/v1` engagement routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/feed", web::get().to(get_feed))
            .route("/dashboard", web::get().to(get_dashboard))
            .route("/authors/{author_id}/posts", web::get().to(get_author_feed))
            .route("/votes", web::post().to(cast_vote))
            .route("/comments", web::post().to(create_comment))
            .service(
                web::resource("/comments/{comment_id}")
                    .route(web::delete().to(delete_comment)),
            )
            .route(
                "/comments/{comment_id}/votes",
                web::delete().to(retract_comment_votes),
            )
            .service(
                web::resource("/posts/{post_id}")
                    .route(web::get().to(get_post))
                    .route(web::patch().to(edit_post))
                    .route(web::delete().to(delete_post)),
            )
            .route("/posts/{post_id}/votes", web::delete().to(retract_post_votes))
            .route(
                "/posts/{post_id}/revisions",
                web::get().to(get_post_revisions),
            ),
    );
}

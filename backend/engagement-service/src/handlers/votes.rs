use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::ViewerId;
use crate::models::{Target, VoteKind};
use crate::services::EngagementService;

/// Vote kind as sent by clients: a numeric code or a name
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VoteKindInput {
    Code(i16),
    Name(String),
}

impl TryFrom<&VoteKindInput> for VoteKind {
    type Error = AppError;

    fn try_from(input: &VoteKindInput) -> Result<Self> {
        match input {
            VoteKindInput::Code(code) => VoteKind::try_from(*code),
            VoteKindInput::Name(name) => name.parse(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub kind: VoteKindInput,
}

pub async fn cast_vote(
    viewer: ViewerId,
    body: web::Json<CastVoteRequest>,
    service: web::Data<EngagementService>,
) -> Result<HttpResponse> {
    let target = Target::from_parts(body.post_id, body.comment_id)?;
    let kind = VoteKind::try_from(&body.kind)?;
    let vote = service.cast_vote(viewer.0, target, kind).await?;
    Ok(HttpResponse::Created().json(vote))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_kind_input() {
        let body: CastVoteRequest =
            serde_json::from_str(r#"{"post_id":"00000000-0000-0000-0000-000000000000","kind":2}"#)
                .unwrap();
        assert_eq!(VoteKind::try_from(&body.kind).unwrap(), VoteKind::Down);

        let body: CastVoteRequest = serde_json::from_str(
            r#"{"comment_id":"00000000-0000-0000-0000-000000000000","kind":"Up"}"#,
        )
        .unwrap();
        assert_eq!(VoteKind::try_from(&body.kind).unwrap(), VoteKind::Up);
        assert!(body.post_id.is_none());
    }
}

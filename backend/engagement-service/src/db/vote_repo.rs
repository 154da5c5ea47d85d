use crate::models::{Target, Vote, VoteKind};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Neutral rows are bookkeeping and never take part in exclusivity
const NEUTRAL_CODE: i16 = 3;

/// Find active votes. Every `None` argument leaves that column unconstrained.
pub async fn find_active_votes(
    pool: &PgPool,
    target: Option<Target>,
    voter_id: Option<Uuid>,
    kind: Option<VoteKind>,
) -> Result<Vec<Vote>, sqlx::Error> {
    let rows = sqlx::query_as::<_, VoteRow>(
        r#"
        SELECT id, kind, post_id, comment_id, voter_id, is_active, created_at
        FROM votes
        WHERE is_active
          AND ($1::uuid IS NULL OR post_id = $1)
          AND ($2::uuid IS NULL OR comment_id = $2)
          AND ($3::uuid IS NULL OR voter_id = $3)
          AND ($4::smallint IS NULL OR kind = $4)
        ORDER BY seq
        "#,
    )
    .bind(target.and_then(|t| t.post_id()))
    .bind(target.and_then(|t| t.comment_id()))
    .bind(voter_id)
    .bind(kind.map(|k| k.code()))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Vote::try_from).collect()
}

/// Serialize writers on one (voter, target) pair for the rest of the transaction
pub async fn lock_pair(
    conn: &mut PgConnection,
    voter_id: Uuid,
    target: Target,
) -> Result<(), sqlx::Error> {
    let key = format!("vote:{}:{}", voter_id, target);
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(key)
        .execute(conn)
        .await?;

    Ok(())
}

/// Deactivate the voter's active counted votes on a target
pub async fn deactivate_voter_votes(
    conn: &mut PgConnection,
    voter_id: Uuid,
    target: Target,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE votes
        SET is_active = FALSE
        WHERE voter_id = $1
          AND post_id IS NOT DISTINCT FROM $2
          AND comment_id IS NOT DISTINCT FROM $3
          AND kind <> $4
          AND is_active
        "#,
    )
    .bind(voter_id)
    .bind(target.post_id())
    .bind(target.comment_id())
    .bind(NEUTRAL_CODE)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn insert_vote(conn: &mut PgConnection, vote: &Vote) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO votes (id, kind, post_id, comment_id, voter_id, is_active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(vote.id)
    .bind(vote.kind.code())
    .bind(vote.target.post_id())
    .bind(vote.target.comment_id())
    .bind(vote.voter_id)
    .bind(vote.is_active)
    .bind(vote.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Deactivate every active vote on a target, whoever cast it
pub async fn deactivate_target_votes(pool: &PgPool, target: Target) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE votes
        SET is_active = FALSE
        WHERE post_id IS NOT DISTINCT FROM $1
          AND comment_id IS NOT DISTINCT FROM $2
          AND is_active
        "#,
    )
    .bind(target.post_id())
    .bind(target.comment_id())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    id: Uuid,
    kind: i16,
    post_id: Option<Uuid>,
    comment_id: Option<Uuid>,
    voter_id: Uuid,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<VoteRow> for Vote {
    type Error = sqlx::Error;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        let target = Target::from_parts(row.post_id, row.comment_id)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let kind = VoteKind::try_from(row.kind).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Vote {
            id: row.id,
            kind,
            target,
            voter_id: row.voter_id,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

use crate::models::{Comment, Target};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Find active comments.
///
/// With `targets == None` every active comment is returned, otherwise only those
/// attached to one of the given posts or parent comments.
pub async fn find_active_comments(
    pool: &PgPool,
    targets: Option<(Vec<Uuid>, Vec<Uuid>)>,
) -> Result<Vec<Comment>, sqlx::Error> {
    let unfiltered = targets.is_none();
    let (post_ids, parent_ids) = targets.unwrap_or_default();

    let rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT id, post_id, parent_comment_id, text, author_id, is_active, created_at, edited_at
        FROM comments
        WHERE is_active
          AND ($1 OR post_id = ANY($2) OR parent_comment_id = ANY($3))
        ORDER BY seq
        "#,
    )
    .bind(unfiltered)
    .bind(&post_ids)
    .bind(&parent_ids)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Comment::try_from).collect()
}

/// Get a single comment by ID, including soft-deleted ones
pub async fn get_comment_by_id(
    pool: &PgPool,
    comment_id: Uuid,
) -> Result<Option<Comment>, sqlx::Error> {
    let row = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT id, post_id, parent_comment_id, text, author_id, is_active, created_at, edited_at
        FROM comments
        WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;

    row.map(Comment::try_from).transpose()
}

pub async fn insert_comment(pool: &PgPool, comment: &Comment) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO comments (id, post_id, parent_comment_id, text, author_id, is_active, created_at, edited_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(comment.id)
    .bind(comment.target.post_id())
    .bind(comment.target.comment_id())
    .bind(&comment.text)
    .bind(comment.author_id)
    .bind(comment.is_active)
    .bind(comment.created_at)
    .bind(comment.edited_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist text and lifecycle columns. The parent columns are never written.
pub async fn update_comment(
    conn: &mut PgConnection,
    comment: &Comment,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE comments
        SET text = $2, is_active = $3, edited_at = $4
        WHERE id = $1
          AND post_id IS NOT DISTINCT FROM $5
          AND parent_comment_id IS NOT DISTINCT FROM $6
        "#,
    )
    .bind(comment.id)
    .bind(&comment.text)
    .bind(comment.is_active)
    .bind(comment.edited_at)
    .bind(comment.target.post_id())
    .bind(comment.target.comment_id())
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Option<Uuid>,
    parent_comment_id: Option<Uuid>,
    text: String,
    author_id: Uuid,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    edited_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = sqlx::Error;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let target = Target::from_parts(row.post_id, row.parent_comment_id)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Comment {
            id: row.id,
            target,
            text: row.text,
            author_id: row.author_id,
            is_active: row.is_active,
            created_at: row.created_at,
            edited_at: row.edited_at,
        })
    }
}

use crate::models::{AuthorSummary, Post, Revision};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const POST_COLUMNS: &str = "id, title, body, location, reaction, author_id, created_at, \
                            edited_at, deleted_at, is_active, images";

/// Find active posts, optionally restricted to one author.
/// Ordered by insertion so callers get a stable base order.
pub async fn find_active_posts(
    pool: &PgPool,
    author_id: Option<Uuid>,
) -> Result<Vec<Post>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM posts
        WHERE is_active
          AND ($1::uuid IS NULL OR author_id = $1)
        ORDER BY seq
        "#
    );
    let posts = sqlx::query_as::<_, PostRow>(&sql)
        .bind(author_id)
        .fetch_all(pool)
        .await?;

    Ok(posts.into_iter().map(Post::from).collect())
}

/// Find a post by ID, including soft-deleted ones
pub async fn find_post_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
    let post = sqlx::query_as::<_, PostRow>(&sql)
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

    Ok(post.map(Post::from))
}

/// Persist the mutable columns of a post
pub async fn update_post(conn: &mut PgConnection, post: &Post) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET title = $2,
            body = $3,
            location = $4,
            reaction = $5,
            edited_at = $6,
            deleted_at = $7,
            is_active = $8,
            images = $9
        WHERE id = $1
        "#,
    )
    .bind(post.id)
    .bind(&post.title)
    .bind(&post.body)
    .bind(&post.location)
    .bind(&post.reaction)
    .bind(post.edited_at)
    .bind(post.deleted_at)
    .bind(post.is_active)
    .bind(&post.images)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Append a pre-edit snapshot
pub async fn insert_revision(
    conn: &mut PgConnection,
    revision: &Revision,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO post_revisions (id, post_id, title, body, location, reaction, created_at, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(revision.id)
    .bind(revision.post_id)
    .bind(&revision.title)
    .bind(&revision.body)
    .bind(&revision.location)
    .bind(&revision.reaction)
    .bind(revision.created_at)
    .bind(revision.created_by)
    .execute(conn)
    .await?;

    Ok(())
}

/// Revision history of a post, oldest first
pub async fn find_revisions(pool: &PgPool, post_id: Uuid) -> Result<Vec<Revision>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RevisionRow>(
        r#"
        SELECT id, post_id, title, body, location, reaction, created_at, created_by
        FROM post_revisions
        WHERE post_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Revision::from).collect())
}

/// Resolve a user's display projection
pub async fn find_author(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<AuthorSummary>, sqlx::Error> {
    let row = sqlx::query_as::<_, (Uuid, String, String)>(
        "SELECT id, display_name, avatar FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, display_name, avatar)| AuthorSummary {
        id,
        display_name,
        avatar,
    }))
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    body: String,
    location: String,
    reaction: String,
    author_id: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    edited_at: Option<chrono::DateTime<chrono::Utc>>,
    deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    is_active: bool,
    images: Vec<String>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            body: row.body,
            location: row.location,
            reaction: row.reaction,
            author_id: row.author_id,
            created_at: row.created_at,
            edited_at: row.edited_at,
            deleted_at: row.deleted_at,
            is_active: row.is_active,
            images: row.images,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RevisionRow {
    id: Uuid,
    post_id: Uuid,
    title: String,
    body: String,
    location: String,
    reaction: String,
    created_at: chrono::DateTime<chrono::Utc>,
    created_by: Uuid,
}

impl From<RevisionRow> for Revision {
    fn from(row: RevisionRow) -> Self {
        Revision {
            id: row.id,
            post_id: row.post_id,
            title: row.title,
            body: row.body,
            location: row.location,
            reaction: row.reaction,
            created_at: row.created_at,
            created_by: row.created_by,
        }
    }
}

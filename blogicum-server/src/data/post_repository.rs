use crate::domain::policy::PostFilter;
use crate::domain::post::PostDraft;
use crate::domain::{Category, DomainError, Location, Post, PostView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, author_id: i64, draft: &PostDraft) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError>;
    async fn find_view(&self, id: i64) -> Result<PostView, DomainError>;
    async fn update(&self, id: i64, draft: &PostDraft) -> Result<Post, DomainError>;
    /// Deletes the post together with its comments.
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn count(&self, filter: &PostFilter, now: DateTime<Utc>) -> Result<i64, DomainError>;
    /// Matching posts, newest `pub_date` first, ties in id order.
    async fn list(
        &self,
        filter: &PostFilter,
        now: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, DomainError>;
}

const POST_COLUMNS: &str =
    "id, title, text, author_id, category_id, location_id, pub_date, is_published, created_at";

const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.author_id, p.category_id, p.location_id,
           p.pub_date, p.is_published, p.created_at,
           u.username AS author_username,
           c.title AS category_title,
           c.description AS category_description,
           c.slug AS category_slug,
           c.is_published AS category_is_published,
           l.name AS location_name,
           l.is_published AS location_is_published,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

// $1 viewer id (NULL for anonymous), $2 now, $3 category id, $4 author id
const FILTER_WHERE: &str = r#"
    WHERE (p.author_id = $1 OR (p.is_published AND p.pub_date <= $2 AND c.is_published))
      AND ($3::BIGINT IS NULL OR p.category_id = $3)
      AND ($4::BIGINT IS NULL OR p.author_id = $4)
"#;

fn post_from_row(row: &PgRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        author_id: row.try_get("author_id")?,
        category_id: row.try_get("category_id")?,
        location_id: row.try_get("location_id")?,
        pub_date: row.try_get("pub_date")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
    })
}

fn post_view_from_row(row: &PgRow) -> Result<PostView, DomainError> {
    let post = post_from_row(row)?;

    let category = Category {
        id: post.category_id,
        title: row.try_get("category_title")?,
        description: row.try_get("category_description")?,
        slug: row.try_get("category_slug")?,
        is_published: row.try_get("category_is_published")?,
    };

    let location = match post.location_id {
        Some(id) => Some(Location {
            id,
            name: row.try_get("location_name")?,
            is_published: row.try_get("location_is_published")?,
        }),
        None => None,
    };

    Ok(PostView {
        author: row.try_get("author_username")?,
        comment_count: row.try_get("comment_count")?,
        category,
        location,
        post,
    })
}

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, author_id: i64, draft: &PostDraft) -> Result<Post, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO posts (title, text, author_id, category_id, location_id, pub_date, is_published, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&draft.title)
            .bind(&draft.text)
            .bind(author_id)
            .bind(draft.category_id)
            .bind(draft.location_id)
            .bind(draft.pub_date)
            .bind(draft.is_published)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create post: {}", e);
                DomainError::DatabaseError(e.to_string())
            })?;

        post_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn find_view(&self, id: i64) -> Result<PostView, DomainError> {
        let sql = format!("{POST_VIEW_SELECT} WHERE p.id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_view_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn update(&self, id: i64, draft: &PostDraft) -> Result<Post, DomainError> {
        let sql = format!(
            r#"
            UPDATE posts
            SET
                title = $1,
                text = $2,
                category_id = $3,
                location_id = $4,
                pub_date = $5,
                is_published = $6
            WHERE id = $7
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&draft.title)
            .bind(&draft.text)
            .bind(draft.category_id)
            .bind(draft.location_id)
            .bind(draft.pub_date)
            .bind(draft.is_published)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        // comments go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn count(&self, filter: &PostFilter, now: DateTime<Utc>) -> Result<i64, DomainError> {
        let sql = format!(
            r#"
            SELECT COUNT(*) AS count
            FROM posts p
            JOIN categories c ON c.id = p.category_id
            {FILTER_WHERE}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(filter.audience.viewer_id())
            .bind(now)
            .bind(filter.category_id)
            .bind(filter.author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        Ok(row.try_get("count")?)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        now: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, DomainError> {
        tracing::debug!(?filter, limit, offset, "Listing posts");

        let sql = format!(
            r#"
            {POST_VIEW_SELECT}
            {FILTER_WHERE}
            ORDER BY p.pub_date DESC, p.id ASC
            LIMIT $5 OFFSET $6
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(filter.audience.viewer_id())
            .bind(now)
            .bind(filter.category_id)
            .bind(filter.author_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter().map(post_view_from_row).collect()
    }
}

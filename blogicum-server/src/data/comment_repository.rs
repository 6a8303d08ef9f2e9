use crate::domain::comment::CommentForm;
use crate::domain::{Comment, CommentView, DomainError};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        form: &CommentForm,
    ) -> Result<Comment, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError>;
    /// Comments of a post in the order they were written.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>, DomainError>;
    async fn update(&self, id: i64, form: &CommentForm) -> Result<Comment, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

fn comment_from_row(row: &PgRow) -> Result<Comment, DomainError> {
    Ok(Comment {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        author_id: row.try_get("author_id")?,
        post_id: row.try_get("post_id")?,
        created_at: row.try_get("created_at")?,
    })
}

pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        form: &CommentForm,
    ) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO comments (text, author_id, post_id, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, text, author_id, post_id, created_at
            "#,
        )
        .bind(&form.text)
        .bind(author_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create comment: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        comment_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, text, author_id, post_id, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => comment_from_row(&row),
            None => Err(DomainError::CommentNotFound),
        }
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT cm.id, cm.text, cm.author_id, cm.post_id, cm.created_at,
                   u.username AS author_username
            FROM comments cm
            JOIN users u ON u.id = cm.author_id
            WHERE cm.post_id = $1
            ORDER BY cm.created_at ASC, cm.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(CommentView {
                    comment: comment_from_row(row)?,
                    author: row.try_get("author_username")?,
                })
            })
            .collect()
    }

    async fn update(&self, id: i64, form: &CommentForm) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE comments
            SET text = $1
            WHERE id = $2
            RETURNING id, text, author_id, post_id, created_at
            "#,
        )
        .bind(&form.text)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => comment_from_row(&row),
            None => Err(DomainError::CommentNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::CommentNotFound)
        } else {
            Ok(())
        }
    }
}

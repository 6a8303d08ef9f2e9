use crate::domain::{Category, DomainError, Location};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

/// Categories are maintained by administrators; the blog only reads them.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError>;
    /// Only published categories resolve; anything else is not found.
    async fn find_published_by_slug(&self, slug: &str) -> Result<Category, DomainError>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Location, DomainError>;
}

fn category_from_row(row: &PgRow) -> Result<Category, DomainError> {
    Ok(Category {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        slug: row.try_get("slug")?,
        is_published: row.try_get("is_published")?,
    })
}

pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, slug, is_published
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => category_from_row(&row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn find_published_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, slug, is_published
            FROM categories
            WHERE slug = $1 AND is_published
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => category_from_row(&row),
            None => {
                tracing::debug!("No published category with slug {}", slug);
                Err(DomainError::CategoryNotFound)
            }
        }
    }
}

pub struct PostgresLocationRepository {
    pool: PgPool,
}

impl PostgresLocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn find_by_id(&self, id: i64) -> Result<Location, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, is_published
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => Ok(Location {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                is_published: row.try_get("is_published")?,
            }),
            None => Err(DomainError::LocationNotFound),
        }
    }
}

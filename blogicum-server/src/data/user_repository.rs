use crate::domain::user::ProfileForm;
use crate::domain::{DomainError, User};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Accounts are created by the external auth service; the blog reads them
/// and lets a user edit their own profile fields.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<User, DomainError>;
    async fn find_by_username(&self, username: &str) -> Result<User, DomainError>;
    async fn update_profile(&self, id: i64, form: &ProfileForm) -> Result<User, DomainError>;
}

fn user_from_row(row: &PgRow) -> Result<User, DomainError> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        date_joined: row.try_get("date_joined")?,
    })
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, first_name, last_name, email, date_joined
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(DomainError::UserNotFound),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, first_name, last_name, email, date_joined
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(DomainError::UserNotFound),
        }
    }

    async fn update_profile(&self, id: i64, form: &ProfileForm) -> Result<User, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET username = $1, first_name = $2, last_name = $3, email = $4
            WHERE id = $5
            RETURNING id, username, first_name, last_name, email, date_joined
            "#,
        )
        .bind(&form.username)
        .bind(&form.first_name)
        .bind(&form.last_name)
        .bind(form.email_or_blank())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DomainError::invalid("username", USERNAME_TAKEN)
            }
            e => {
                tracing::error!("Failed to update user {}: {}", id, e);
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(DomainError::UserNotFound),
        }
    }
}

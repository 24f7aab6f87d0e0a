//! SQLite-backed credential store

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

use crate::domain::{CredentialRecord, UserRecord};
use crate::infra::{CredentialStore, Result, StoreError};

/// Users, roles and role assignments over SQLite.
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn roles_for(&self, user_id: i64) -> Result<Vec<String>> {
        let roles = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<CredentialRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, username, password_hash FROM users WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let roles = self.roles_for(row.id).await?;
                Ok(Some(CredentialRecord {
                    id: row.id,
                    username: row.username,
                    password_hash: row.password_hash,
                    roles,
                }))
            }
            None => Ok(None),
        }
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<UserRecord> {
        let mut tx = self.pool.begin().await?;

        let role_id: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM roles WHERE name = ?"#)
            .bind(role)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(role_id) = role_id else {
            return Err(StoreError::RoleNotFound(role.to_string()));
        };

        let result = sqlx::query(r#"INSERT INTO users (username, password_hash) VALUES (?, ?)"#)
            .bind(username)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;
        let user_id = result.last_insert_rowid();

        sqlx::query(r#"INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)"#)
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(UserRecord {
            id: user_id,
            username: username.to_string(),
            roles: vec![role.to_string()],
        })
    }

    async fn grant_role(&self, username: &str, role: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_roles (user_id, role_id)
            SELECT u.id, r.id FROM users u JOIN roles r ON r.name = ?
            WHERE u.username = ?
            "#,
        )
        .bind(role)
        .bind(username)
        .execute(&self.pool)
        .await?;

        // Distinguish "already granted" from "no such user/role"
        if result.rows_affected() == 0 {
            let user_exists: Option<i64> =
                sqlx::query_scalar(r#"SELECT id FROM users WHERE username = ?"#)
                    .bind(username)
                    .fetch_optional(&self.pool)
                    .await?;
            if user_exists.is_none() {
                return Err(StoreError::UserNotFound(username.to_string()));
            }

            let role_exists: Option<i64> =
                sqlx::query_scalar(r#"SELECT id FROM roles WHERE name = ?"#)
                    .bind(role)
                    .fetch_optional(&self.pool)
                    .await?;
            if role_exists.is_none() {
                return Err(StoreError::RoleNotFound(role.to_string()));
            }
        }

        Ok(())
    }

    async fn ensure_role(&self, name: &str) -> Result<()> {
        sqlx::query(r#"INSERT OR IGNORE INTO roles (name) VALUES (?)"#)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, username, password_hash FROM users ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let roles = self.roles_for(row.id).await?;
            users.push(UserRecord {
                id: row.id,
                username: row.username,
                roles,
            });
        }
        Ok(users)
    }
}

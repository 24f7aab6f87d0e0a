//! SQLite-backed pet store

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

use crate::domain::{NewPet, Pet, PetUpdate};
use crate::infra::{PetStore, Result, StoreError};

/// Pet records over SQLite. Owner usernames are resolved via a join.
pub struct SqlitePetStore {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct PetRow {
    id: i64,
    name: String,
    kind: String,
    age: i64,
    owner_username: String,
}

impl From<PetRow> for Pet {
    fn from(row: PetRow) -> Self {
        Pet {
            id: row.id,
            name: row.name,
            kind: row.kind,
            age: row.age,
            owner_username: row.owner_username,
        }
    }
}

const SELECT_PET: &str = r#"
    SELECT p.id, p.name, p.kind, p.age, u.username AS owner_username
    FROM pets p
    JOIN users u ON u.id = p.owner_id
"#;

impl SqlitePetStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: i64) -> Result<Pet> {
        self.get(id).await?.ok_or(StoreError::PetNotFound(id))
    }
}

#[async_trait]
impl PetStore for SqlitePetStore {
    async fn insert(&self, new_pet: NewPet) -> Result<Pet> {
        let owner_id: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM users WHERE username = ?"#)
            .bind(&new_pet.owner_username)
            .fetch_optional(&self.pool)
            .await?;
        let Some(owner_id) = owner_id else {
            return Err(StoreError::UserNotFound(new_pet.owner_username));
        };

        let result =
            sqlx::query(r#"INSERT INTO pets (name, kind, age, owner_id) VALUES (?, ?, ?, ?)"#)
                .bind(&new_pet.name)
                .bind(&new_pet.kind)
                .bind(new_pet.age)
                .bind(owner_id)
                .execute(&self.pool)
                .await?;

        self.fetch(result.last_insert_rowid()).await
    }

    async fn get(&self, id: i64) -> Result<Option<Pet>> {
        let row = sqlx::query_as::<_, PetRow>(&format!("{SELECT_PET} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_by_owner(&self, owner_username: &str) -> Result<Vec<Pet>> {
        let rows =
            sqlx::query_as::<_, PetRow>(&format!("{SELECT_PET} WHERE u.username = ? ORDER BY p.id"))
                .bind(owner_username)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_all(&self) -> Result<Vec<Pet>> {
        let rows = sqlx::query_as::<_, PetRow>(&format!("{SELECT_PET} ORDER BY p.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: i64, update: PetUpdate) -> Result<Pet> {
        let result = sqlx::query(r#"UPDATE pets SET name = ?, kind = ?, age = ? WHERE id = ?"#)
            .bind(&update.name)
            .bind(&update.kind)
            .bind(update.age)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PetNotFound(id));
        }

        self.fetch(id).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM pets WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PetNotFound(id));
        }
        Ok(())
    }
}

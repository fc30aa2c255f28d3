// src/db/note_repo.rs

use sqlx::PgPool;

use crate::{common::error::AppError, models::notes::Note};

#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Note>, AppError> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, color, created_at, user_id
            FROM notes
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notes)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Note>, AppError> {
        let note = sqlx::query_as::<_, Note>(
            "SELECT id, title, content, color, created_at, user_id FROM notes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(note)
    }

    pub async fn create(
        &self,
        user_id: i32,
        title: &str,
        content: Option<&str>,
        color: &str,
    ) -> Result<Note, AppError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (title, content, color, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, color, created_at, user_id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(color)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(note)
    }

    pub async fn update(
        &self,
        id: i32,
        title: &str,
        content: Option<&str>,
        color: &str,
    ) -> Result<Note, AppError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes SET title = $2, content = $3, color = $4
            WHERE id = $1
            RETURNING id, title, content, color, created_at, user_id
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(color)
        .fetch_one(&self.pool)
        .await?;
        Ok(note)
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

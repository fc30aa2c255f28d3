// src/services/note_service.rs

use crate::{
    common::error::AppError,
    db::NoteRepository,
    models::{
        auth::User,
        notes::{Note, NotePayload, NoteView, DEFAULT_NOTE_COLOR},
    },
};

#[derive(Clone)]
pub struct NoteService {
    repo: NoteRepository,
}

impl NoteService {
    pub fn new(repo: NoteRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, user: &User) -> Result<Vec<NoteView>, AppError> {
        let notes = self.repo.list_for_user(user.id).await?;
        Ok(notes.into_iter().map(NoteView::from).collect())
    }

    pub async fn get(&self, user: &User, id: i32) -> Result<NoteView, AppError> {
        Ok(self.find_owned(user, id).await?.into())
    }

    pub async fn create(&self, user: &User, payload: &NotePayload) -> Result<NoteView, AppError> {
        let note = self
            .repo
            .create(
                user.id,
                payload.title.trim(),
                payload.content.as_deref(),
                color_or_default(payload.color.as_deref()),
            )
            .await?;
        Ok(note.into())
    }

    pub async fn update(
        &self,
        user: &User,
        id: i32,
        payload: &NotePayload,
    ) -> Result<NoteView, AppError> {
        let current = self.find_owned(user, id).await?;
        // Sem cor no formulário, mantém a atual
        let color = payload
            .color
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&current.color);

        let note = self
            .repo
            .update(id, payload.title.trim(), payload.content.as_deref(), color)
            .await?;
        Ok(note.into())
    }

    pub async fn delete(&self, user: &User, id: i32) -> Result<(), AppError> {
        self.find_owned(user, id).await?;
        self.repo.delete(id).await
    }

    async fn find_owned(&self, user: &User, id: i32) -> Result<Note, AppError> {
        let note = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Anotação {}", id)))?;

        if note.user_id != user.id {
            return Err(AppError::Forbidden);
        }
        Ok(note)
    }
}

fn color_or_default(color: Option<&str>) -> &str {
    match color.map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ => DEFAULT_NOTE_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_color_uses_default() {
        assert_eq!(color_or_default(None), "#212529");
        assert_eq!(color_or_default(Some("  ")), "#212529");
        assert_eq!(color_or_default(Some("#FFEB3B")), "#FFEB3B");
    }
}

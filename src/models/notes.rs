// src/models/notes.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const DEFAULT_NOTE_COLOR: &str = "#212529";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i32,
    pub title: String,
    pub content: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i32,
}

// Anotação com a cor de texto já calculada para o fundo escolhido
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    #[serde(flatten)]
    pub note: Note,
    pub text_color: &'static str,
}

impl From<Note> for NoteView {
    fn from(note: Note) -> Self {
        Self {
            text_color: text_color_for_background(&note.color),
            note,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    #[validate(length(min = 1, max = 120, message = "O título da anotação é obrigatório."))]
    pub title: String,
    pub content: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Cor inválida."))]
    pub color: Option<String>,
}

/// Texto preto ou branco conforme o brilho percebido do fundo (#RRGGBB).
pub fn text_color_for_background(hex_color: &str) -> &'static str {
    const BLACK: &str = "#000000";
    const WHITE: &str = "#FFFFFF";

    let hex = hex_color.trim_start_matches('#');
    let channel = |i: usize| hex.get(i..i + 2).and_then(|c| u8::from_str_radix(c, 16).ok());

    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => {
            let brightness =
                (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) as f64 / 1000.0;
            if brightness > 149.0 { BLACK } else { WHITE }
        }
        _ => WHITE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_backgrounds_get_black_text() {
        assert_eq!(text_color_for_background("#FFFFFF"), "#000000");
        assert_eq!(text_color_for_background("ffeb3b"), "#000000");
    }

    #[test]
    fn dark_backgrounds_get_white_text() {
        assert_eq!(text_color_for_background(DEFAULT_NOTE_COLOR), "#FFFFFF");
        assert_eq!(text_color_for_background("#000000"), "#FFFFFF");
    }

    #[test]
    fn threshold_is_strictly_above_149() {
        // cinza 149 -> brilho exatamente 149
        assert_eq!(text_color_for_background("#959595"), "#FFFFFF");
        assert_eq!(text_color_for_background("#969696"), "#000000");
    }

    #[test]
    fn invalid_colors_fall_back_to_white() {
        assert_eq!(text_color_for_background("azul"), "#FFFFFF");
        assert_eq!(text_color_for_background("#12"), "#FFFFFF");
        assert_eq!(text_color_for_background(""), "#FFFFFF");
    }
}

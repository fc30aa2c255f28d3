use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Usuário já existe")]
    UsernameAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    // Regras de negócio violadas (ex: orçamento sem equipamentos)
    #[error("Regra de negócio: {0}")]
    BusinessRule(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Erro já traduzido, pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            AppError::UsernameAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro interno na resposta pública, no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let en = locale.is_english();
        let status = self.status_code();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let message = e
                                .message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string());
                            Value::String(message)
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                let error = if en {
                    "One or more fields are invalid."
                } else {
                    "Um ou mais campos são inválidos."
                };
                (error.to_string(), Some(Value::Object(details)))
            }
            AppError::UsernameAlreadyExists => (
                pick(en, "This username is already taken.", "Este nome de usuário já está em uso."),
                None,
            ),
            AppError::InvalidCredentials => (
                pick(en, "Invalid username or password.", "Usuário ou senha inválidos."),
                None,
            ),
            AppError::InvalidToken => (
                pick(
                    en,
                    "Missing or invalid authentication token.",
                    "Token de autenticação inválido ou ausente.",
                ),
                None,
            ),
            AppError::UserNotFound => (pick(en, "User not found.", "Usuário não encontrado."), None),
            AppError::Forbidden => (
                pick(
                    en,
                    "You are not allowed to perform this action.",
                    "Você não tem permissão para realizar esta ação.",
                ),
                None,
            ),
            AppError::ResourceNotFound(what) => {
                let prefix = pick(en, "Not found", "Não encontrado");
                (format!("{}: {}", prefix, what), None)
            }
            AppError::DatabaseError(sqlx::Error::RowNotFound) => (
                pick(en, "Resource not found.", "Registro não encontrado."),
                None,
            ),
            // Mensagens de regra de negócio já nascem em português
            AppError::BusinessRule(message) => (message.clone(), None),

            // Todos os outros erros viram 500. O detalhe fica só no log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    pick(en, "An unexpected error occurred.", "Ocorreu um erro inesperado."),
                    None,
                )
            }
        };

        ApiError { status, error, details }
    }
}

fn pick(en: bool, english: &str, portuguese: &str) -> String {
    if en { english } else { portuguese }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "O título é obrigatório."))]
        title: String,
    }

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn domain_errors_map_to_expected_status() {
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::UsernameAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::ResourceNotFound("Demanda 3".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BusinessRule("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let errors = Sample { title: String::new() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&pt());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "Um ou mais campos são inválidos.");
        let details = api.details.expect("details");
        assert_eq!(details["title"][0], "O título é obrigatório.");
    }

    #[test]
    fn messages_follow_locale() {
        let en = AppError::InvalidCredentials.to_api_error(&Locale("en".to_string()));
        let pt = AppError::InvalidCredentials.to_api_error(&pt());
        assert_eq!(en.error, "Invalid username or password.");
        assert_eq!(pt.error, "Usuário ou senha inválidos.");
    }

    #[test]
    fn internal_errors_hide_details() {
        let api = AppError::InternalServerError(anyhow::anyhow!("segredo do banco")).to_api_error(&pt());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("segredo"));
    }
}

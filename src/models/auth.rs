// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    Gerente,
    Supervisor,
    #[sqlx(rename = "Técnico")]
    #[serde(rename = "Técnico")]
    Tecnico,
}

impl UserRole {
    /// Gerentes e supervisores enxergam os dados de toda a equipe.
    pub fn is_supervisor(self) -> bool {
        matches!(self, UserRole::Gerente | UserRole::Supervisor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Gerente => "Gerente",
            UserRole::Supervisor => "Supervisor",
            UserRole::Tecnico => "Técnico",
        }
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_supervisor(&self) -> bool {
        self.role.is_supervisor()
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "O usuário é obrigatório."))]
    pub username: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Cadastro de usuário feito por um supervisor
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserPayload {
    #[validate(length(min = 2, max = 80, message = "O usuário deve ter entre 2 e 80 caracteres."))]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub role: UserRole,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // ID do usuário
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_managers_and_supervisors_are_supervisors() {
        assert!(UserRole::Gerente.is_supervisor());
        assert!(UserRole::Supervisor.is_supervisor());
        assert!(!UserRole::Tecnico.is_supervisor());
    }

    #[test]
    fn roles_use_portuguese_labels_on_the_wire() {
        assert_eq!(serde_json::to_string(&UserRole::Tecnico).unwrap(), "\"Técnico\"");
        let role: UserRole = serde_json::from_str("\"Gerente\"").unwrap();
        assert_eq!(role, UserRole::Gerente);
        assert_eq!(UserRole::Tecnico.as_str(), "Técnico");
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            username: "ana".into(),
            password_hash: "$2b$12$segredo".into(),
            role: UserRole::Tecnico,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["username"], "ana");
    }
}

// src/config.rs

use std::env;

use anyhow::Context;
use sqlx::PgPool;

use crate::{
    db::{CommissionRepository, DashboardRepository, DemandRepository, NoteRepository, UserRepository},
    services::{AuthService, CommissionService, DashboardService, DemandService, NoteService},
};

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub addr: String,
    pub max_connections: u32,
    /// Primeiro Gerente, criado só com a tabela de usuários vazia.
    pub bootstrap_admin: Option<(String, String)>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let addr = env::var("APP_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: '{}'", value))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_USERNAME"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some((username, password))
            }
            _ => None,
        };

        Ok(Self { database_url, jwt_secret, addr, max_connections, bootstrap_admin })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub demand_service: DemandService,
    pub commission_service: CommissionService,
    pub note_service: NoteService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    // Monta o gráfico de dependências a partir do pool
    pub fn new(db_pool: PgPool, jwt_secret: String) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let demand_repo = DemandRepository::new(db_pool.clone());
        let commission_repo = CommissionRepository::new(db_pool.clone());
        let note_repo = NoteRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret, db_pool.clone());
        let demand_service = DemandService::new(demand_repo, user_repo.clone(), db_pool.clone());
        let commission_service =
            CommissionService::new(commission_repo, user_repo.clone(), db_pool);
        let note_service = NoteService::new(note_repo);
        let dashboard_service = DashboardService::new(
            dashboard_repo,
            user_repo,
            demand_service.clone(),
            commission_service.clone(),
        );

        Self {
            auth_service,
            demand_service,
            commission_service,
            note_service,
            dashboard_service,
        }
    }
}

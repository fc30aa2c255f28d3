// src/models/dashboard.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{
    auth::User,
    commission::ServiceType,
    demands::{DemandStatus, DemandView},
};

// Contagem bruta vinda de um GROUP BY status
#[derive(Debug, FromRow)]
pub struct DemandStatusCountRow {
    pub status: DemandStatus,
    pub total: i64,
}

// Contagem bruta vinda de um GROUP BY service_type
#[derive(Debug, FromRow)]
pub struct TaskTypeCountRow {
    #[sqlx(try_from = "String")]
    pub service_type: ServiceType,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: DemandStatus,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTypeCount {
    pub service_type: ServiceType,
    pub total: i64,
}

// Números de um usuário escolhido no painel do supervisor
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBreakdown {
    pub user: User,
    pub demand_counts: Vec<StatusCount>,
    pub total_demands: i64,
    pub task_counts: Vec<TaskTypeCount>,
    pub total_difficulty: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorHome {
    pub demand_status_counts: Vec<StatusCount>,
    pub total_demands: i64,
    pub task_type_counts: Vec<TaskTypeCount>,
    pub users: Vec<User>,
    pub selected_user: Option<UserBreakdown>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianHome {
    pub pending_demands: Vec<DemandView>,
}

// A tela inicial muda conforme o papel de quem acessa
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum HomeView {
    Supervisor(SupervisorHome),
    Technician(TechnicianHome),
}

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    #[serde(default, deserialize_with = "crate::common::query::empty_string_as_none")]
    pub user_id: Option<i32>,
}

// src/models/demands.rs

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::common::query::{empty_string_as_none, AssigneeFilter};

// --- Enums ---

// Fluxo de status das demandas (CREATE TYPE demand_status)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "demand_status")]
pub enum DemandStatus {
    #[sqlx(rename = "Não Visto")]
    #[serde(rename = "Não Visto")]
    NaoVisto,
    #[sqlx(rename = "Em Andamento")]
    #[serde(rename = "Em Andamento")]
    EmAndamento,
    #[sqlx(rename = "AG. ADM")]
    #[serde(rename = "AG. ADM")]
    AgAdm,
    #[sqlx(rename = "AG. EVANDRO")]
    #[serde(rename = "AG. EVANDRO")]
    AgEvandro,
    #[sqlx(rename = "AG. COMERCIAL")]
    #[serde(rename = "AG. COMERCIAL")]
    AgComercial,
    #[sqlx(rename = "PARADO")]
    #[serde(rename = "PARADO")]
    Parado,
    #[sqlx(rename = "CONCLUIDO")]
    #[serde(rename = "CONCLUIDO")]
    Concluido,
}

impl DemandStatus {
    /// Ordem do fluxo, usada nos painéis.
    pub const ALL: [DemandStatus; 7] = [
        DemandStatus::NaoVisto,
        DemandStatus::EmAndamento,
        DemandStatus::AgAdm,
        DemandStatus::AgEvandro,
        DemandStatus::AgComercial,
        DemandStatus::Parado,
        DemandStatus::Concluido,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DemandStatus::NaoVisto => "Não Visto",
            DemandStatus::EmAndamento => "Em Andamento",
            DemandStatus::AgAdm => "AG. ADM",
            DemandStatus::AgEvandro => "AG. EVANDRO",
            DemandStatus::AgComercial => "AG. COMERCIAL",
            DemandStatus::Parado => "PARADO",
            DemandStatus::Concluido => "CONCLUIDO",
        }
    }

    pub fn is_completed(self) -> bool {
        self == DemandStatus::Concluido
    }
}

impl FromStr for DemandStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DemandStatus::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| format!("status desconhecido: '{}'", s))
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Demand {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: DemandStatus,
    pub created_at: DateTime<Utc>,
    pub requester_id: i32,
    pub assigned_to_id: Option<i32>,
}

impl Demand {
    /// Número de exibição: D0001, D0042...
    pub fn demand_number(&self) -> String {
        format!("D{:04}", self.id)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DemandLog {
    pub id: i32,
    pub demand_id: i32,
    pub user_id: i32,
    pub username: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

// Demanda como aparece nas listagens
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandView {
    #[serde(flatten)]
    pub demand: Demand,
    pub demand_number: String,
}

impl From<Demand> for DemandView {
    fn from(demand: Demand) -> Self {
        Self {
            demand_number: demand.demand_number(),
            demand,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandDetail {
    #[serde(flatten)]
    pub demand: DemandView,
    pub logs: Vec<DemandLog>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DemandPayload {
    #[validate(length(min = 1, max = 120, message = "O título é obrigatório (até 120 caracteres)."))]
    pub title: String,

    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub description: String,

    #[validate(length(min = 1, max = 20, message = "A prioridade é obrigatória."))]
    pub priority: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: DemandStatus,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDemandPayload {
    pub user_id: i32,
}

// Filtros das listagens (query string)
#[derive(Debug, Default, Deserialize)]
pub struct DemandFilters {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<DemandStatus>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub assigned_to_id: Option<AssigneeFilter>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub end_date: Option<NaiveDate>,
}

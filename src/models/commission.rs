// src/models/commission.rs

use std::{convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    common::query::empty_string_as_none,
    services::scoring::{self, WeightedTask},
};

// --- Enums ---

/// Tipo de lançamento de comissão.
///
/// A coluna no banco é texto livre; valores fora dos três conhecidos caem em
/// `Unrecognized` e continuam carregando (com peso zero).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceType {
    Servico,
    Orcamento,
    Venda,
    Unrecognized(String),
}

impl ServiceType {
    pub const KNOWN: [ServiceType; 3] = [ServiceType::Servico, ServiceType::Orcamento, ServiceType::Venda];

    pub fn from_label(label: &str) -> Self {
        match label {
            "Serviço" => ServiceType::Servico,
            "Orçamento" => ServiceType::Orcamento,
            "Venda" => ServiceType::Venda,
            other => ServiceType::Unrecognized(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ServiceType::Servico => "Serviço",
            ServiceType::Orcamento => "Orçamento",
            ServiceType::Venda => "Venda",
            ServiceType::Unrecognized(label) => label,
        }
    }

    /// "Orçamento" -> "orcamento" (usado como classe/identificador no front)
    pub fn slug(&self) -> String {
        self.label().to_lowercase().replace('ç', "c")
    }

    pub fn display_name(&self) -> String {
        self.label().to_uppercase()
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for ServiceType {
    fn from(value: String) -> Self {
        ServiceType::from_label(&value)
    }
}

impl From<ServiceType> for String {
    fn from(value: ServiceType) -> Self {
        value.label().to_string()
    }
}

impl FromStr for ServiceType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ServiceType::from_label(s))
    }
}

// --- Catálogo ---

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PredefinedService {
    pub id: i32,
    pub name: String,
    pub weight: i32,
}

// Serviço do catálogo já ligado a uma tarefa (carregamento em lote)
#[derive(Debug, Clone, FromRow)]
pub struct LinkedService {
    pub commission_task_id: i32,
    #[sqlx(flatten)]
    pub service: PredefinedService,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomServiceItem {
    pub id: i32,
    pub name: String,
    pub weight: i32,
    pub commission_task_id: i32,
}

// --- Tarefas ---

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommissionTask {
    pub id: i32,
    pub external_os_number: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub service_type: ServiceType,
    pub technician_id: i32,
    pub technician_username: String,
    pub commission_value: Option<Decimal>,
    pub status: String,
    pub date_completed: DateTime<Utc>,
}

// Tarefa com os serviços associados já carregados
#[derive(Debug, Clone)]
pub struct CommissionTaskDetail {
    pub task: CommissionTask,
    pub services: Vec<PredefinedService>,
    pub custom_services: Vec<CustomServiceItem>,
}

impl WeightedTask for CommissionTaskDetail {
    fn service_type(&self) -> &ServiceType {
        &self.task.service_type
    }

    fn description(&self) -> Option<&str> {
        self.task.description.as_deref()
    }

    fn commission_value(&self) -> Option<Decimal> {
        self.task.commission_value
    }

    fn predefined_services(&self) -> &[PredefinedService] {
        &self.services
    }

    fn custom_services(&self) -> &[CustomServiceItem] {
        &self.custom_services
    }
}

/// Resposta da API: o peso é sempre recalculado na leitura, nunca gravado.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionTaskView {
    #[serde(flatten)]
    pub task: CommissionTask,
    pub services: Vec<PredefinedService>,
    pub custom_services: Vec<CustomServiceItem>,
    pub total_weight: i64,
    pub display_description: String,
    pub service_type_slug: String,
    pub display_service_name: String,
}

impl From<CommissionTaskDetail> for CommissionTaskView {
    fn from(detail: CommissionTaskDetail) -> Self {
        let total_weight = scoring::total_weight(&detail);
        let display_description = scoring::display_description(&detail);
        let CommissionTaskDetail { task, services, custom_services } = detail;

        Self {
            service_type_slug: task.service_type.slug(),
            display_service_name: task.service_type.display_name(),
            task,
            services,
            custom_services,
            total_weight,
            display_description,
        }
    }
}

// --- Conteúdo tipado de um lançamento ---

/// O que cada tipo de lançamento carrega, já validado.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskContent {
    Service {
        predefined_service_ids: Vec<i32>,
        custom_services: Vec<NewCustomService>,
        description: Option<String>,
    },
    Budget {
        equipment: Vec<String>,
        notes: Option<String>,
    },
    Sale {
        items: Vec<String>,
        notes: Option<String>,
        commission_value: Decimal,
    },
}

impl TaskContent {
    pub fn service_type(&self) -> ServiceType {
        match self {
            TaskContent::Service { .. } => ServiceType::Servico,
            TaskContent::Budget { .. } => ServiceType::Orcamento,
            TaskContent::Sale { .. } => ServiceType::Venda,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomService {
    #[validate(length(min = 1, max = 100, message = "O nome do serviço é obrigatório."))]
    pub name: String,
    #[validate(range(min = 1, message = "O peso deve ser maior que zero."))]
    pub weight: i32,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommissionTaskPayload {
    #[validate(length(min = 1, max = 50, message = "O Nº OS é obrigatório."))]
    pub external_os_number: String,

    pub technician_id: i32,

    pub service_type: ServiceType,

    // Serviço
    pub description: Option<String>,
    #[serde(default)]
    pub predefined_service_ids: Vec<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub custom_services: Vec<NewCustomService>,

    // Orçamento
    #[serde(default)]
    pub budget_equipment: Vec<String>,
    pub budget_notes: Option<String>,

    // Venda
    #[serde(default)]
    pub sale_items: Vec<String>,
    pub sale_notes: Option<String>,
    pub commission_value: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommissionTaskFilters {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub technician_id: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub service_type: Option<ServiceType>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(service_type: &str, description: Option<&str>) -> CommissionTask {
        CommissionTask {
            id: 1,
            external_os_number: "OS-100".into(),
            description: description.map(str::to_string),
            service_type: ServiceType::from_label(service_type),
            technician_id: 2,
            technician_username: "carlos".into(),
            commission_value: None,
            status: "A Pagar".into(),
            date_completed: Utc::now(),
        }
    }

    #[test]
    fn labels_map_to_variants_and_back() {
        for known in ServiceType::KNOWN {
            assert!(!matches!(known, ServiceType::Unrecognized(_)));
            assert_eq!(ServiceType::from_label(known.label()), known);
        }
        let legacy = ServiceType::from_label("Garantia");
        assert_eq!(legacy, ServiceType::Unrecognized("Garantia".into()));
        assert_eq!(legacy.label(), "Garantia");
    }

    #[test]
    fn matching_is_accent_sensitive() {
        assert!(matches!(ServiceType::from_label("Servico"), ServiceType::Unrecognized(_)));
        assert!(matches!(ServiceType::from_label("orçamento"), ServiceType::Unrecognized(_)));
    }

    #[test]
    fn slug_and_display_name() {
        assert_eq!(ServiceType::Servico.slug(), "servico");
        assert_eq!(ServiceType::Orcamento.slug(), "orcamento");
        assert_eq!(ServiceType::Venda.slug(), "venda");
        assert_eq!(ServiceType::Orcamento.display_name(), "ORÇAMENTO");
    }

    #[test]
    fn service_type_serializes_as_label() {
        assert_eq!(serde_json::to_string(&ServiceType::Servico).unwrap(), "\"Serviço\"");
        let parsed: ServiceType = serde_json::from_str("\"Venda\"").unwrap();
        assert_eq!(parsed, ServiceType::Venda);
    }

    #[test]
    fn view_recomputes_weight_and_display_fields() {
        let detail = CommissionTaskDetail {
            task: task("Serviço", Some("cliente levou o carregador")),
            services: vec![PredefinedService { id: 1, name: "Formatação".into(), weight: 3 }],
            custom_services: vec![CustomServiceItem {
                id: 9,
                name: "Troca de cooler".into(),
                weight: 2,
                commission_task_id: 1,
            }],
        };

        let view = CommissionTaskView::from(detail);
        assert_eq!(view.total_weight, 5);
        assert_eq!(view.display_description, "Formatação, Troca de cooler");
        assert_eq!(view.service_type_slug, "servico");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["serviceType"], "Serviço");
        assert_eq!(json["externalOsNumber"], "OS-100");
        assert_eq!(json["totalWeight"], 5);
    }

    #[test]
    fn payload_nested_custom_services_are_validated() {
        let payload: CommissionTaskPayload = serde_json::from_value(serde_json::json!({
            "externalOsNumber": "OS-1",
            "technicianId": 1,
            "serviceType": "Serviço",
            "customServices": [{ "name": "Solda", "weight": 0 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }
}

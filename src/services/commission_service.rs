// src/services/commission_service.rs

use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::{
        error::AppError,
        pagination::{normalize_page, Page},
        query::{end_of_day, start_of_day},
    },
    db::{
        commission_repo::{TaskListQuery, TaskRecord},
        CommissionRepository, UserRepository,
    },
    models::{
        auth::User,
        commission::{
            CommissionTask, CommissionTaskDetail, CommissionTaskFilters, CommissionTaskPayload,
            CommissionTaskView, PredefinedService, ServiceType, TaskContent,
        },
    },
    services::scoring,
};

#[derive(Clone)]
pub struct CommissionService {
    commission_repo: CommissionRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl CommissionService {
    pub fn new(commission_repo: CommissionRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { commission_repo, user_repo, pool }
    }

    pub async fn catalog(&self) -> Result<Vec<PredefinedService>, AppError> {
        self.commission_repo.list_catalog().await
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list(
        &self,
        user: &User,
        filters: CommissionTaskFilters,
    ) -> Result<Page<CommissionTaskView>, AppError> {
        let page = normalize_page(filters.page);
        let query = TaskListQuery {
            // Técnico só vê os próprios lançamentos, qualquer que seja o filtro
            technician_id: if user.is_supervisor() { filters.technician_id } else { Some(user.id) },
            service_type: filters.service_type,
            completed_from: filters.start_date.map(start_of_day),
            completed_until: filters.end_date.map(end_of_day),
        };

        let (tasks, total) = self.commission_repo.list_tasks(&query, page).await?;
        let details = self.load_details(tasks).await?;

        Ok(Page::new(details, page, total).map(CommissionTaskView::from))
    }

    pub async fn detail(&self, user: &User, id: i32) -> Result<CommissionTaskView, AppError> {
        let task = self.find_task(id).await?;
        if !user.is_supervisor() && task.technician_id != user.id {
            return Err(AppError::Forbidden);
        }
        self.build_view(task).await
    }

    /// Pontuação de dificuldade de um técnico: soma dos pesos de todos os
    /// lançamentos dele.
    pub async fn difficulty_for(&self, technician_id: i32) -> Result<i64, AppError> {
        let tasks = self.commission_repo.list_tasks_for_technician(technician_id).await?;
        let details = self.load_details(tasks).await?;
        Ok(scoring::difficulty_score(details.iter()))
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn create(
        &self,
        user: &User,
        payload: &CommissionTaskPayload,
    ) -> Result<CommissionTaskView, AppError> {
        if !user.is_supervisor() && payload.technician_id != user.id {
            return Err(AppError::Forbidden);
        }

        let content = task_content(payload)?;
        self.ensure_technician(payload.technician_id).await?;
        self.ensure_catalog_ids(&content).await?;

        let service_type = content.service_type();
        let description = stored_description(&content);
        let record = task_record(payload, &service_type, description.as_deref(), &content);

        let mut tx = self.pool.begin().await?;
        let id = self.commission_repo.create_task(&mut *tx, &record).await?;
        self.write_services(&mut tx, id, &content).await?;
        tx.commit().await?;

        tracing::info!(
            "💰 Lançamento {} ({}) registrado para o técnico {}",
            payload.external_os_number,
            service_type,
            payload.technician_id
        );

        let task = self.find_task(id).await?;
        self.build_view(task).await
    }

    /// Regrava o lançamento inteiro: vínculos do catálogo são substituídos e os
    /// serviços avulsos apagados e recriados.
    pub async fn update(
        &self,
        id: i32,
        payload: &CommissionTaskPayload,
    ) -> Result<CommissionTaskView, AppError> {
        let content = task_content(payload)?;
        self.ensure_technician(payload.technician_id).await?;
        self.ensure_catalog_ids(&content).await?;

        let service_type = content.service_type();
        let description = stored_description(&content);
        let record = task_record(payload, &service_type, description.as_deref(), &content);

        let mut tx = self.pool.begin().await?;
        if !self.commission_repo.update_task(&mut *tx, id, &record).await? {
            return Err(not_found(id));
        }
        self.commission_repo.unlink_services(&mut *tx, id).await?;
        self.commission_repo.delete_custom_services(&mut *tx, id).await?;
        self.write_services(&mut tx, id, &content).await?;
        tx.commit().await?;

        let task = self.find_task(id).await?;
        self.build_view(task).await
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        if !self.commission_repo.delete_task(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("🗑️ Lançamento {} excluído", id);
        Ok(())
    }

    // =========================================================================
    //  AUXILIARES
    // =========================================================================

    async fn write_services(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        task_id: i32,
        content: &TaskContent,
    ) -> Result<(), AppError> {
        if let TaskContent::Service { predefined_service_ids, custom_services, .. } = content {
            if !predefined_service_ids.is_empty() {
                self.commission_repo
                    .link_services(&mut **tx, task_id, predefined_service_ids)
                    .await?;
            }
            if !custom_services.is_empty() {
                self.commission_repo
                    .insert_custom_services(&mut **tx, task_id, custom_services)
                    .await?;
            }
        }
        Ok(())
    }

    async fn find_task(&self, id: i32) -> Result<CommissionTask, AppError> {
        self.commission_repo
            .find_task(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn build_view(&self, task: CommissionTask) -> Result<CommissionTaskView, AppError> {
        let mut details = self.load_details(vec![task]).await?;
        details
            .pop()
            .map(CommissionTaskView::from)
            .ok_or_else(|| anyhow::anyhow!("lançamento sumiu durante o carregamento").into())
    }

    async fn ensure_technician(&self, technician_id: i32) -> Result<(), AppError> {
        self.user_repo
            .find_by_id(technician_id)
            .await?
            .map(|_| ())
            .ok_or(AppError::UserNotFound)
    }

    async fn ensure_catalog_ids(&self, content: &TaskContent) -> Result<(), AppError> {
        let TaskContent::Service { predefined_service_ids, .. } = content else {
            return Ok(());
        };
        if predefined_service_ids.is_empty() {
            return Ok(());
        }
        let found = self
            .commission_repo
            .find_services_by_ids(predefined_service_ids)
            .await?;
        if found.len() != predefined_service_ids.len() {
            return Err(AppError::BusinessRule(
                "Um ou mais serviços selecionados não existem.".into(),
            ));
        }
        Ok(())
    }

    /// Anexa em lote (duas consultas) os serviços de cada tarefa.
    async fn load_details(
        &self,
        tasks: Vec<CommissionTask>,
    ) -> Result<Vec<CommissionTaskDetail>, AppError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = tasks.iter().map(|t| t.id).collect();

        let mut linked: HashMap<i32, Vec<PredefinedService>> = HashMap::new();
        for row in self.commission_repo.linked_services(&ids).await? {
            linked.entry(row.commission_task_id).or_default().push(row.service);
        }

        let mut custom: HashMap<i32, Vec<_>> = HashMap::new();
        for item in self.commission_repo.custom_services(&ids).await? {
            custom.entry(item.commission_task_id).or_default().push(item);
        }

        Ok(tasks
            .into_iter()
            .map(|task| CommissionTaskDetail {
                services: linked.remove(&task.id).unwrap_or_default(),
                custom_services: custom.remove(&task.id).unwrap_or_default(),
                task,
            })
            .collect())
    }
}

fn not_found(id: i32) -> AppError {
    AppError::ResourceNotFound(format!("Lançamento {}", id))
}

// Maior valor que cabe em NUMERIC(10, 2)
fn max_commission_value() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Converte o formulário no conteúdo tipado do lançamento, aplicando as
/// regras de cada tipo.
pub fn task_content(payload: &CommissionTaskPayload) -> Result<TaskContent, AppError> {
    match &payload.service_type {
        ServiceType::Servico => {
            let predefined_service_ids: Vec<i32> = payload
                .predefined_service_ids
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            if predefined_service_ids.is_empty() && payload.custom_services.is_empty() {
                return Err(AppError::BusinessRule(
                    "Selecione ao menos um serviço pré-definido ou adicione um serviço avulso."
                        .into(),
                ));
            }
            Ok(TaskContent::Service {
                predefined_service_ids,
                custom_services: payload.custom_services.clone(),
                description: non_blank(payload.description.as_deref()),
            })
        }
        ServiceType::Orcamento => {
            let equipment = clean_list(&payload.budget_equipment);
            if equipment.is_empty() {
                return Err(AppError::BusinessRule(
                    "Informe ao menos um equipamento orçado.".into(),
                ));
            }
            Ok(TaskContent::Budget {
                equipment,
                notes: non_blank(payload.budget_notes.as_deref()),
            })
        }
        ServiceType::Venda => {
            let items = clean_list(&payload.sale_items);
            if items.is_empty() {
                return Err(AppError::BusinessRule("Informe ao menos um item vendido.".into()));
            }
            let commission_value = payload
                .commission_value
                .filter(|v| *v > Decimal::ZERO)
                .ok_or_else(|| {
                    AppError::BusinessRule("O valor da venda deve ser maior que zero.".into())
                })?;
            if commission_value > max_commission_value() {
                return Err(AppError::BusinessRule(format!(
                    "O valor da venda não pode passar de {}.",
                    max_commission_value()
                )));
            }
            Ok(TaskContent::Sale {
                items,
                notes: non_blank(payload.sale_notes.as_deref()),
                commission_value,
            })
        }
        ServiceType::Unrecognized(label) => Err(AppError::BusinessRule(format!(
            "Tipo de serviço inválido: '{}'.",
            label
        ))),
    }
}

/// Texto gravado na coluna `description` para cada tipo.
pub fn stored_description(content: &TaskContent) -> Option<String> {
    match content {
        TaskContent::Service { description, .. } => description.clone(),
        TaskContent::Budget { equipment, notes } => {
            Some(scoring::budget_description(equipment, notes.as_deref()))
        }
        TaskContent::Sale { items, notes, .. } => {
            Some(scoring::sale_description(items, notes.as_deref()))
        }
    }
}

fn task_record<'a>(
    payload: &'a CommissionTaskPayload,
    service_type: &'a ServiceType,
    description: Option<&'a str>,
    content: &TaskContent,
) -> TaskRecord<'a> {
    let commission_value = match content {
        TaskContent::Sale { commission_value, .. } => Some(*commission_value),
        _ => None,
    };
    TaskRecord {
        external_os_number: payload.external_os_number.trim(),
        description,
        service_type,
        technician_id: payload.technician_id,
        commission_value,
    }
}

// Itens com vírgula viram vários itens (a lista é gravada separada por vírgulas)
fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| item.split(','))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

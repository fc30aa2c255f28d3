// src/services/demand_service.rs

use sqlx::PgPool;

use crate::{
    common::{
        error::AppError,
        pagination::{normalize_page, Page},
        query::{end_of_day, start_of_day},
    },
    db::{demand_repo::DemandListQuery, DemandRepository, UserRepository},
    models::{
        auth::User,
        demands::{Demand, DemandDetail, DemandFilters, DemandPayload, DemandStatus, DemandView},
    },
};

pub const CREATED_ACTION: &str = "Demanda criada.";
pub const EDITED_ACTION: &str =
    "Demanda editada: Título, descrição ou prioridade foram alterados.";

#[derive(Clone)]
pub struct DemandService {
    demand_repo: DemandRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl DemandService {
    pub fn new(demand_repo: DemandRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { demand_repo, user_repo, pool }
    }

    // =========================================================================
    //  LISTAGENS
    // =========================================================================

    pub async fn list_active(
        &self,
        user: &User,
        filters: DemandFilters,
    ) -> Result<Page<DemandView>, AppError> {
        self.list(user, filters, false).await
    }

    /// Concluídas: o filtro de status não se aplica.
    pub async fn list_completed(
        &self,
        user: &User,
        filters: DemandFilters,
    ) -> Result<Page<DemandView>, AppError> {
        self.list(user, filters, true).await
    }

    async fn list(
        &self,
        user: &User,
        filters: DemandFilters,
        completed: bool,
    ) -> Result<Page<DemandView>, AppError> {
        let page = normalize_page(filters.page);
        let query = list_query(user, &filters, completed);
        let (demands, total) = self.demand_repo.list(&query, page).await?;
        Ok(Page::new(demands, page, total).map(DemandView::from))
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    pub async fn create(&self, user: &User, payload: &DemandPayload) -> Result<DemandView, AppError> {
        let mut tx = self.pool.begin().await?;

        let demand = self
            .demand_repo
            .create(&mut *tx, &payload.title, &payload.description, &payload.priority, user.id)
            .await?;
        self.demand_repo
            .insert_log(&mut *tx, demand.id, user.id, CREATED_ACTION)
            .await?;

        tx.commit().await?;

        tracing::info!("📋 Demanda {} criada por '{}'", demand.demand_number(), user.username);
        Ok(demand.into())
    }

    pub async fn detail(&self, user: &User, id: i32) -> Result<DemandDetail, AppError> {
        let demand = self.find_visible(user, id).await?;
        let logs = self.demand_repo.list_logs(demand.id).await?;
        Ok(DemandDetail { demand: demand.into(), logs })
    }

    pub async fn update(
        &self,
        user: &User,
        id: i32,
        payload: &DemandPayload,
    ) -> Result<DemandView, AppError> {
        let mut tx = self.pool.begin().await?;

        self.demand_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;

        let demand = self
            .demand_repo
            .update_fields(&mut *tx, id, &payload.title, &payload.description, &payload.priority)
            .await?;
        self.demand_repo.insert_log(&mut *tx, id, user.id, EDITED_ACTION).await?;

        tx.commit().await?;
        Ok(demand.into())
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        if !self.demand_repo.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("🗑️ Demanda {} excluída", id);
        Ok(())
    }

    // =========================================================================
    //  FLUXO
    // =========================================================================

    /// Só grava (e registra no histórico) quando o status realmente muda.
    pub async fn change_status(
        &self,
        user: &User,
        id: i32,
        new_status: DemandStatus,
        note: Option<&str>,
    ) -> Result<DemandView, AppError> {
        let mut tx = self.pool.begin().await?;

        // Trava a linha: mudanças simultâneas leem o status já gravado
        let demand = self
            .demand_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        if !can_view(user, &demand) {
            return Err(AppError::Forbidden);
        }
        if demand.status == new_status {
            tx.commit().await?;
            return Ok(demand.into());
        }

        let action = status_change_action(demand.status, new_status, note);
        self.demand_repo.update_status(&mut *tx, id, new_status).await?;
        self.demand_repo.insert_log(&mut *tx, id, user.id, &action).await?;
        let updated = self
            .demand_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await?;

        if new_status.is_completed() {
            tracing::info!("✅ Demanda {} concluída por '{}'", updated.demand_number(), user.username);
        }
        Ok(updated.into())
    }

    pub async fn assign(
        &self,
        user: &User,
        id: i32,
        assignee_id: i32,
    ) -> Result<DemandView, AppError> {
        let assignee = self
            .user_repo
            .find_by_id(assignee_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let mut tx = self.pool.begin().await?;
        self.demand_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;

        self.demand_repo.assign(&mut *tx, id, assignee.id).await?;
        self.demand_repo
            .insert_log(&mut *tx, id, user.id, &assignment_action(&assignee.username))
            .await?;
        let updated = self
            .demand_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await?;

        Ok(updated.into())
    }

    /// Remove uma entrada do histórico; devolve o id da demanda dona.
    pub async fn delete_log(&self, log_id: i32) -> Result<i32, AppError> {
        self.demand_repo
            .delete_log(log_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Histórico {}", log_id)))
    }

    // =========================================================================
    //  PAINEL
    // =========================================================================

    pub async fn pending_for(&self, user_id: i32) -> Result<Vec<DemandView>, AppError> {
        let demands = self.demand_repo.list_pending_for_user(user_id).await?;
        Ok(demands.into_iter().map(DemandView::from).collect())
    }

    async fn find_visible(&self, user: &User, id: i32) -> Result<Demand, AppError> {
        let demand = self
            .demand_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| not_found(id))?;

        if !can_view(user, &demand) {
            return Err(AppError::Forbidden);
        }
        Ok(demand)
    }
}

fn not_found(id: i32) -> AppError {
    AppError::ResourceNotFound(format!("Demanda {}", id))
}

// Técnicos só enxergam as demandas atribuídas a eles
pub fn can_view(user: &User, demand: &Demand) -> bool {
    user.is_supervisor() || demand.assigned_to_id == Some(user.id)
}

fn list_query(user: &User, filters: &DemandFilters, completed: bool) -> DemandListQuery {
    DemandListQuery {
        completed,
        status: if completed { None } else { filters.status },
        assignee: filters.assigned_to_id,
        visible_to: (!user.is_supervisor()).then_some(user.id),
        created_from: filters.start_date.map(start_of_day),
        created_until: filters.end_date.map(end_of_day),
    }
}

pub fn status_change_action(old: DemandStatus, new: DemandStatus, note: Option<&str>) -> String {
    let mut action = format!("Status alterado de '{}' para '{}'.", old.label(), new.label());
    if let Some(note) = note.filter(|n| !n.is_empty()) {
        action.push_str(" Nota: ");
        action.push_str(note);
    }
    action
}

pub fn assignment_action(username: &str) -> String {
    format!("Demanda atribuída a {}.", capitalize(username))
}

// "maria" -> "Maria", "JOÃO" -> "João"
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::query::AssigneeFilter, models::auth::UserRole};
    use chrono::{NaiveDate, Timelike, Utc};

    fn user(id: i32, role: UserRole) -> User {
        User {
            id,
            username: format!("user{}", id),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
        }
    }

    fn demand(assigned_to_id: Option<i32>) -> Demand {
        Demand {
            id: 1,
            title: "Impressora travando".into(),
            description: "Setor financeiro".into(),
            priority: "Normal".into(),
            status: DemandStatus::NaoVisto,
            created_at: Utc::now(),
            requester_id: 1,
            assigned_to_id,
        }
    }

    #[test]
    fn status_change_message_without_note() {
        assert_eq!(
            status_change_action(DemandStatus::NaoVisto, DemandStatus::EmAndamento, None),
            "Status alterado de 'Não Visto' para 'Em Andamento'."
        );
        assert_eq!(
            status_change_action(DemandStatus::Parado, DemandStatus::Concluido, Some("")),
            "Status alterado de 'PARADO' para 'CONCLUIDO'."
        );
    }

    #[test]
    fn status_change_message_appends_note() {
        assert_eq!(
            status_change_action(DemandStatus::EmAndamento, DemandStatus::AgAdm, Some("aguardando nota fiscal")),
            "Status alterado de 'Em Andamento' para 'AG. ADM'. Nota: aguardando nota fiscal"
        );
    }

    #[test]
    fn assignment_message_capitalizes_username() {
        assert_eq!(assignment_action("maria"), "Demanda atribuída a Maria.");
        assert_eq!(assignment_action("JOÃO"), "Demanda atribuída a João.");
        assert_eq!(assignment_action(""), "Demanda atribuída a .");
    }

    #[test]
    fn technicians_only_view_their_demands() {
        let tech = user(5, UserRole::Tecnico);
        assert!(can_view(&tech, &demand(Some(5))));
        assert!(!can_view(&tech, &demand(Some(6))));
        assert!(!can_view(&tech, &demand(None)));

        let boss = user(1, UserRole::Gerente);
        assert!(can_view(&boss, &demand(None)));
        assert!(can_view(&user(2, UserRole::Supervisor), &demand(Some(5))));
    }

    #[test]
    fn list_query_scopes_technicians_and_expands_dates() {
        let filters = DemandFilters {
            page: None,
            status: Some(DemandStatus::Parado),
            assigned_to_id: Some(AssigneeFilter::Unassigned),
            start_date: NaiveDate::from_ymd_opt(2025, 8, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 8, 31),
        };

        let query = list_query(&user(5, UserRole::Tecnico), &filters, false);
        assert_eq!(query.visible_to, Some(5));
        assert_eq!(query.status, Some(DemandStatus::Parado));
        assert_eq!(query.assignee, Some(AssigneeFilter::Unassigned));
        assert_eq!(query.created_until.map(|d| d.hour()), Some(23));

        let query = list_query(&user(1, UserRole::Supervisor), &filters, true);
        assert_eq!(query.visible_to, None);
        assert_eq!(query.status, None);
        assert!(query.completed);
    }

    #[sqlx::test]
    async fn concurrent_status_changes_log_once(pool: PgPool) {
        let users = UserRepository::new(pool.clone());
        let boss = users
            .create_user(&pool, "supervisor", "hash", UserRole::Supervisor)
            .await
            .unwrap();
        let tech = users
            .create_user(&pool, "tecnico", "hash", UserRole::Tecnico)
            .await
            .unwrap();
        let service = DemandService::new(DemandRepository::new(pool.clone()), users, pool.clone());

        let payload = DemandPayload {
            title: "Impressora travando".into(),
            description: "Setor financeiro".into(),
            priority: "Normal".into(),
        };
        let created = service.create(&boss, &payload).await.unwrap();

        let (a, b) = tokio::join!(
            service.change_status(&boss, created.demand.id, DemandStatus::EmAndamento, None),
            service.change_status(&boss, created.demand.id, DemandStatus::EmAndamento, Some("já vi")),
        );
        assert_eq!(a.unwrap().demand.status, DemandStatus::EmAndamento);
        assert_eq!(b.unwrap().demand.status, DemandStatus::EmAndamento);

        let repo = DemandRepository::new(pool.clone());
        assert_eq!(repo.list_logs(created.demand.id).await.unwrap().len(), 2);

        // Repetir o status atual não grava nada
        service
            .change_status(&boss, created.demand.id, DemandStatus::EmAndamento, None)
            .await
            .unwrap();
        assert_eq!(repo.list_logs(created.demand.id).await.unwrap().len(), 2);

        let err = service
            .change_status(&tech, created.demand.id, DemandStatus::Parado, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert_eq!(repo.list_logs(created.demand.id).await.unwrap().len(), 2);
    }
}

// src/services/dashboard_service.rs

use crate::{
    common::error::AppError,
    db::{DashboardRepository, UserRepository},
    models::{
        auth::User,
        commission::ServiceType,
        dashboard::{
            DemandStatusCountRow, HomeView, StatusCount, SupervisorHome, TaskTypeCount,
            TaskTypeCountRow, TechnicianHome, UserBreakdown,
        },
        demands::DemandStatus,
    },
    services::{CommissionService, DemandService},
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    user_repo: UserRepository,
    demand_service: DemandService,
    commission_service: CommissionService,
}

impl DashboardService {
    pub fn new(
        repo: DashboardRepository,
        user_repo: UserRepository,
        demand_service: DemandService,
        commission_service: CommissionService,
    ) -> Self {
        Self { repo, user_repo, demand_service, commission_service }
    }

    /// Tela inicial: painel geral para supervisão, pendências para o técnico.
    pub async fn home(&self, user: &User, selected_user_id: Option<i32>) -> Result<HomeView, AppError> {
        if !user.is_supervisor() {
            let pending_demands = self.demand_service.pending_for(user.id).await?;
            return Ok(HomeView::Technician(TechnicianHome { pending_demands }));
        }

        let demand_status_counts = zero_filled_status_counts(self.repo.demand_status_counts(None).await?);
        let task_type_counts = zero_filled_task_counts(self.repo.task_type_counts(None).await?);
        let users = self.user_repo.list_all().await?;

        // Usuário inexistente no filtro é simplesmente ignorado
        let selected = selected_user_id.and_then(|id| users.iter().find(|u| u.id == id).cloned());
        let selected_user = match selected {
            Some(selected) => Some(self.breakdown(selected).await?),
            None => None,
        };

        Ok(HomeView::Supervisor(SupervisorHome {
            total_demands: total(&demand_status_counts, |c| c.total),
            demand_status_counts,
            task_type_counts,
            users,
            selected_user,
        }))
    }

    async fn breakdown(&self, user: User) -> Result<UserBreakdown, AppError> {
        let demand_counts = zero_filled_status_counts(self.repo.demand_status_counts(Some(user.id)).await?);
        let task_counts = zero_filled_task_counts(self.repo.task_type_counts(Some(user.id)).await?);
        let total_difficulty = self.commission_service.difficulty_for(user.id).await?;

        Ok(UserBreakdown {
            total_demands: total(&demand_counts, |c| c.total),
            user,
            demand_counts,
            task_counts,
            total_difficulty,
        })
    }
}

/// Uma entrada por status do fluxo, na ordem do fluxo, com zero onde não há nada.
pub fn zero_filled_status_counts(rows: Vec<DemandStatusCountRow>) -> Vec<StatusCount> {
    DemandStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            total: rows.iter().filter(|r| r.status == status).map(|r| r.total).sum(),
        })
        .collect()
}

/// Uma entrada por tipo conhecido; tipos legados ficam de fora.
pub fn zero_filled_task_counts(rows: Vec<TaskTypeCountRow>) -> Vec<TaskTypeCount> {
    ServiceType::KNOWN
        .into_iter()
        .map(|service_type| TaskTypeCount {
            total: rows
                .iter()
                .filter(|r| r.service_type == service_type)
                .map(|r| r.total)
                .sum(),
            service_type,
        })
        .collect()
}

fn total<T>(counts: &[T], value: impl Fn(&T) -> i64) -> i64 {
    counts.iter().map(value).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_counts_cover_whole_workflow() {
        let counts = zero_filled_status_counts(vec![
            DemandStatusCountRow { status: DemandStatus::Parado, total: 2 },
            DemandStatusCountRow { status: DemandStatus::NaoVisto, total: 5 },
        ]);

        assert_eq!(counts.len(), 7);
        assert_eq!(counts[0], StatusCount { status: DemandStatus::NaoVisto, total: 5 });
        assert_eq!(counts[5], StatusCount { status: DemandStatus::Parado, total: 2 });
        assert_eq!(counts[6].total, 0);
        assert_eq!(total(&counts, |c| c.total), 7);
    }

    #[test]
    fn task_counts_ignore_legacy_types() {
        let counts = zero_filled_task_counts(vec![
            TaskTypeCountRow { service_type: ServiceType::Venda, total: 4 },
            TaskTypeCountRow { service_type: ServiceType::from_label("Garantia"), total: 9 },
        ]);

        assert_eq!(
            counts,
            vec![
                TaskTypeCount { service_type: ServiceType::Servico, total: 0 },
                TaskTypeCount { service_type: ServiceType::Orcamento, total: 0 },
                TaskTypeCount { service_type: ServiceType::Venda, total: 4 },
            ]
        );
    }

    #[test]
    fn empty_rows_are_all_zero() {
        assert!(zero_filled_status_counts(vec![]).iter().all(|c| c.total == 0));
        assert_eq!(total(&zero_filled_task_counts(vec![]), |c| c.total), 0);
    }
}

// src/db/dashboard_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::dashboard::{DemandStatusCountRow, TaskTypeCountRow},
};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Demandas por status (de todos, ou só as atribuídas a um usuário)
    pub async fn demand_status_counts(
        &self,
        assigned_to: Option<i32>,
    ) -> Result<Vec<DemandStatusCountRow>, AppError> {
        let rows = sqlx::query_as::<_, DemandStatusCountRow>(
            r#"
            SELECT status, COUNT(*) AS total
            FROM demands
            WHERE ($1::int IS NULL OR assigned_to_id = $1)
            GROUP BY status
            "#,
        )
        .bind(assigned_to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Lançamentos por tipo (de todos, ou só de um técnico)
    pub async fn task_type_counts(
        &self,
        technician_id: Option<i32>,
    ) -> Result<Vec<TaskTypeCountRow>, AppError> {
        let rows = sqlx::query_as::<_, TaskTypeCountRow>(
            r#"
            SELECT service_type, COUNT(*) AS total
            FROM commission_tasks
            WHERE ($1::int IS NULL OR technician_id = $1)
            GROUP BY service_type
            "#,
        )
        .bind(technician_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

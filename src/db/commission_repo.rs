// src/db/commission_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        error::AppError,
        pagination::{offset_for, PAGINATION_ITEMS},
    },
    models::commission::{
        CommissionTask, CustomServiceItem, LinkedService, NewCustomService, PredefinedService,
        ServiceType,
    },
};

const TASK_SELECT: &str = r#"
    SELECT
        t.id, t.external_os_number, t.description, t.service_type,
        t.technician_id, u.username AS technician_username,
        t.commission_value, t.status, t.date_completed
    FROM commission_tasks t
    JOIN users u ON u.id = t.technician_id
"#;

/// Critérios da listagem de lançamentos.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub technician_id: Option<i32>,
    pub service_type: Option<ServiceType>,
    pub completed_from: Option<DateTime<Utc>>,
    pub completed_until: Option<DateTime<Utc>>,
}

// Colunas gravadas de um lançamento (create e update usam o mesmo molde)
#[derive(Debug, Clone)]
pub struct TaskRecord<'a> {
    pub external_os_number: &'a str,
    pub description: Option<&'a str>,
    pub service_type: &'a ServiceType,
    pub technician_id: i32,
    pub commission_value: Option<Decimal>,
}

#[derive(Clone)]
pub struct CommissionRepository {
    pool: PgPool,
}

impl CommissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CATÁLOGO
    // =========================================================================

    pub async fn list_catalog(&self) -> Result<Vec<PredefinedService>, AppError> {
        let services = sqlx::query_as::<_, PredefinedService>(
            "SELECT id, name, weight FROM predefined_services ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    pub async fn find_services_by_ids(&self, ids: &[i32]) -> Result<Vec<PredefinedService>, AppError> {
        let services = sqlx::query_as::<_, PredefinedService>(
            "SELECT id, name, weight FROM predefined_services WHERE id = ANY($1) ORDER BY name",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    // =========================================================================
    //  LANÇAMENTOS
    // =========================================================================

    pub async fn create_task<'e, E>(&self, executor: E, record: &TaskRecord<'_>) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO commission_tasks (
                external_os_number, description, service_type, technician_id, commission_value
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(record.external_os_number)
        .bind(record.description)
        .bind(record.service_type.label())
        .bind(record.technician_id)
        .bind(record.commission_value)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn update_task<'e, E>(
        &self,
        executor: E,
        id: i32,
        record: &TaskRecord<'_>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE commission_tasks
            SET external_os_number = $2, description = $3, service_type = $4,
                technician_id = $5, commission_value = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(record.external_os_number)
        .bind(record.description)
        .bind(record.service_type.label())
        .bind(record.technician_id)
        .bind(record.commission_value)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apaga o lançamento; vínculos e serviços avulsos vão junto (CASCADE).
    pub async fn delete_task(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM commission_tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_task(&self, id: i32) -> Result<Option<CommissionTask>, AppError> {
        let sql = format!("{TASK_SELECT} WHERE t.id = $1");
        let task = sqlx::query_as::<_, CommissionTask>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    pub async fn list_tasks(
        &self,
        query: &TaskListQuery,
        page: i64,
    ) -> Result<(Vec<CommissionTask>, i64), AppError> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM commission_tasks t WHERE 1 = 1");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("{TASK_SELECT} WHERE 1 = 1"));
        push_filters(&mut select, query);
        select
            .push(" ORDER BY t.date_completed DESC, t.id DESC LIMIT ")
            .push_bind(PAGINATION_ITEMS)
            .push(" OFFSET ")
            .push_bind(offset_for(page));

        let tasks = select
            .build_query_as::<CommissionTask>()
            .fetch_all(&self.pool)
            .await?;

        Ok((tasks, total))
    }

    // Todos os lançamentos de um técnico (pontuação de dificuldade)
    pub async fn list_tasks_for_technician(
        &self,
        technician_id: i32,
    ) -> Result<Vec<CommissionTask>, AppError> {
        let sql = format!("{TASK_SELECT} WHERE t.technician_id = $1 ORDER BY t.date_completed DESC");
        let tasks = sqlx::query_as::<_, CommissionTask>(&sql)
            .bind(technician_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    // =========================================================================
    //  SERVIÇOS ASSOCIADOS
    // =========================================================================

    // Carrega em lote os serviços do catálogo ligados às tarefas
    pub async fn linked_services(&self, task_ids: &[i32]) -> Result<Vec<LinkedService>, AppError> {
        let rows = sqlx::query_as::<_, LinkedService>(
            r#"
            SELECT a.commission_task_id, s.id, s.name, s.weight
            FROM task_services_association a
            JOIN predefined_services s ON s.id = a.predefined_service_id
            WHERE a.commission_task_id = ANY($1)
            ORDER BY s.name
            "#,
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn custom_services(&self, task_ids: &[i32]) -> Result<Vec<CustomServiceItem>, AppError> {
        let rows = sqlx::query_as::<_, CustomServiceItem>(
            r#"
            SELECT id, name, weight, commission_task_id
            FROM custom_service_items
            WHERE commission_task_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn link_services<'e, E>(
        &self,
        executor: E,
        task_id: i32,
        service_ids: &[i32],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO task_services_association (commission_task_id, predefined_service_id)
            SELECT $1, service_id FROM UNNEST($2::int[]) AS service_id
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(service_ids)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn unlink_services<'e, E>(&self, executor: E, task_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM task_services_association WHERE commission_task_id = $1")
            .bind(task_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert_custom_services<'e, E>(
        &self,
        executor: E,
        task_id: i32,
        items: &[NewCustomService],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        let weights: Vec<i32> = items.iter().map(|i| i.weight).collect();

        sqlx::query(
            r#"
            INSERT INTO custom_service_items (name, weight, commission_task_id)
            SELECT name, weight, $3
            FROM UNNEST($1::text[], $2::int[]) AS item(name, weight)
            "#,
        )
        .bind(&names)
        .bind(&weights)
        .bind(task_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_custom_services<'e, E>(&self, executor: E, task_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM custom_service_items WHERE commission_task_id = $1")
            .bind(task_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &TaskListQuery) {
    if let Some(technician_id) = query.technician_id {
        builder.push(" AND t.technician_id = ").push_bind(technician_id);
    }
    if let Some(service_type) = &query.service_type {
        builder
            .push(" AND t.service_type = ")
            .push_bind(service_type.label().to_string());
    }
    if let Some(from) = query.completed_from {
        builder.push(" AND t.date_completed >= ").push_bind(from);
    }
    if let Some(until) = query.completed_until {
        builder.push(" AND t.date_completed <= ").push_bind(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_use_task_alias() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM commission_tasks t WHERE 1 = 1");
        push_filters(
            &mut builder,
            &TaskListQuery {
                technician_id: Some(3),
                service_type: Some(ServiceType::Orcamento),
                completed_from: None,
                completed_until: Some(Utc::now()),
            },
        );
        let sql = builder.sql();
        assert!(sql.contains("t.technician_id = $1"));
        assert!(sql.contains("t.service_type = $2"));
        assert!(sql.contains("t.date_completed <= $3"));
        assert!(!sql.contains(">="));
    }

    #[test]
    fn no_filters_leave_query_untouched() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM commission_tasks t WHERE 1 = 1");
        push_filters(&mut builder, &TaskListQuery::default());
        assert_eq!(builder.sql(), "SELECT 1 FROM commission_tasks t WHERE 1 = 1");
    }
}

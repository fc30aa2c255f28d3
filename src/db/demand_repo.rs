// src/db/demand_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        error::AppError,
        pagination::{offset_for, PAGINATION_ITEMS},
        query::AssigneeFilter,
    },
    models::demands::{Demand, DemandLog, DemandStatus},
};

const DEMAND_COLUMNS: &str =
    "id, title, description, priority, status, created_at, requester_id, assigned_to_id";

/// Critérios de uma listagem de demandas, já resolvidos pelo serviço.
#[derive(Debug, Clone, Default)]
pub struct DemandListQuery {
    /// `true` lista só CONCLUIDO; `false` lista as ativas.
    pub completed: bool,
    pub status: Option<DemandStatus>,
    pub assignee: Option<AssigneeFilter>,
    /// Técnicos só enxergam o que está atribuído a eles.
    pub visible_to: Option<i32>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_until: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct DemandRepository {
    pool: PgPool,
}

impl DemandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  DEMANDAS
    // =========================================================================

    pub async fn create<'e, E>(
        &self,
        executor: E,
        title: &str,
        description: &str,
        priority: &str,
        requester_id: i32,
    ) -> Result<Demand, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO demands (title, description, priority, requester_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {DEMAND_COLUMNS}
            "#
        );
        let demand = sqlx::query_as::<_, Demand>(&sql)
            .bind(title)
            .bind(description)
            .bind(priority)
            .bind(requester_id)
            .fetch_one(executor)
            .await?;
        Ok(demand)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<Demand>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {DEMAND_COLUMNS} FROM demands WHERE id = $1");
        let demand = sqlx::query_as::<_, Demand>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(demand)
    }

    /// Igual a `find_by_id`, mas trava a linha até o fim da transação.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: i32,
    ) -> Result<Option<Demand>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {DEMAND_COLUMNS} FROM demands WHERE id = $1 FOR UPDATE");
        let demand = sqlx::query_as::<_, Demand>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(demand)
    }

    pub async fn update_fields<'e, E>(
        &self,
        executor: E,
        id: i32,
        title: &str,
        description: &str,
        priority: &str,
    ) -> Result<Demand, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE demands SET title = $2, description = $3, priority = $4
            WHERE id = $1
            RETURNING {DEMAND_COLUMNS}
            "#
        );
        let demand = sqlx::query_as::<_, Demand>(&sql)
            .bind(id)
            .bind(title)
            .bind(description)
            .bind(priority)
            .fetch_one(executor)
            .await?;
        Ok(demand)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: i32,
        status: DemandStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE demands SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn assign<'e, E>(&self, executor: E, id: i32, user_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE demands SET assigned_to_id = $2 WHERE id = $1")
            .bind(id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Apaga a demanda; o histórico vai junto (ON DELETE CASCADE).
    pub async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM demands WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        &self,
        query: &DemandListQuery,
        page: i64,
    ) -> Result<(Vec<Demand>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM demands WHERE 1 = 1");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {DEMAND_COLUMNS} FROM demands WHERE 1 = 1"
        ));
        push_filters(&mut select, query);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(PAGINATION_ITEMS)
            .push(" OFFSET ")
            .push_bind(offset_for(page));

        let demands = select
            .build_query_as::<Demand>()
            .fetch_all(&self.pool)
            .await?;

        Ok((demands, total))
    }

    // Pendências de um técnico (tudo que não está CONCLUIDO)
    pub async fn list_pending_for_user(&self, user_id: i32) -> Result<Vec<Demand>, AppError> {
        let sql = format!(
            r#"
            SELECT {DEMAND_COLUMNS} FROM demands
            WHERE assigned_to_id = $1 AND status <> 'CONCLUIDO'
            ORDER BY created_at DESC
            "#
        );
        let demands = sqlx::query_as::<_, Demand>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(demands)
    }

    // =========================================================================
    //  HISTÓRICO
    // =========================================================================

    pub async fn insert_log<'e, E>(
        &self,
        executor: E,
        demand_id: i32,
        user_id: i32,
        action: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO demand_logs (demand_id, user_id, action) VALUES ($1, $2, $3)")
            .bind(demand_id)
            .bind(user_id)
            .bind(action)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn list_logs(&self, demand_id: i32) -> Result<Vec<DemandLog>, AppError> {
        let logs = sqlx::query_as::<_, DemandLog>(
            r#"
            SELECT l.id, l.demand_id, l.user_id, u.username, l.action, l.timestamp
            FROM demand_logs l
            JOIN users u ON u.id = l.user_id
            WHERE l.demand_id = $1
            ORDER BY l.timestamp DESC, l.id DESC
            "#,
        )
        .bind(demand_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    /// Remove uma entrada do histórico e devolve a demanda a que pertencia.
    pub async fn delete_log(&self, log_id: i32) -> Result<Option<i32>, AppError> {
        let demand_id: Option<i32> =
            sqlx::query_scalar("DELETE FROM demand_logs WHERE id = $1 RETURNING demand_id")
                .bind(log_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(demand_id)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &DemandListQuery) {
    if query.completed {
        builder.push(" AND status = 'CONCLUIDO'");
    } else {
        builder.push(" AND status <> 'CONCLUIDO'");
    }

    if let Some(user_id) = query.visible_to {
        builder.push(" AND assigned_to_id = ").push_bind(user_id);
    }

    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status);
    }

    match query.assignee {
        Some(AssigneeFilter::Unassigned) => {
            builder.push(" AND assigned_to_id IS NULL");
        }
        Some(AssigneeFilter::User(user_id)) => {
            builder.push(" AND assigned_to_id = ").push_bind(user_id);
        }
        None => {}
    }

    if let Some(from) = query.created_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(until) = query.created_until {
        builder.push(" AND created_at <= ").push_bind(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(query: &DemandListQuery) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM demands WHERE 1 = 1");
        push_filters(&mut builder, query);
        builder.sql().to_string()
    }

    #[test]
    fn active_listing_excludes_completed() {
        let sql = sql_for(&DemandListQuery::default());
        assert!(sql.ends_with("AND status <> 'CONCLUIDO'"));
    }

    #[test]
    fn filters_are_bound_in_order() {
        let sql = sql_for(&DemandListQuery {
            completed: false,
            status: Some(DemandStatus::Parado),
            assignee: Some(AssigneeFilter::User(4)),
            visible_to: Some(4),
            created_from: Some(Utc::now()),
            created_until: None,
        });
        assert!(sql.contains("AND assigned_to_id = $1"));
        assert!(sql.contains("AND status = $2"));
        assert!(sql.contains("AND assigned_to_id = $3"));
        assert!(sql.contains("AND created_at >= $4"));
        assert!(!sql.contains("created_at <="));
    }

    #[test]
    fn unassigned_filter_checks_null() {
        let sql = sql_for(&DemandListQuery {
            completed: true,
            assignee: Some(AssigneeFilter::Unassigned),
            ..Default::default()
        });
        assert!(sql.contains("status = 'CONCLUIDO'"));
        assert!(sql.contains("assigned_to_id IS NULL"));
    }
}

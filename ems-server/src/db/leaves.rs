use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::calendar::DateWindow;
use shared::models::{LeaveDateRow, LeaveDay, LeaveListItem, leave_day_tally};
use shared::pagination::PageSlice;
use sqlx::{PgConnection, PgPool};

use super::{Admission, Approval, DbResult, LeaveStore, ListFilter, PgStore, RequestRecord, Scope};

const LIST_FROM: &str = "
    FROM leave_requests lr
    JOIN department_members dm ON dm.id = lr.department_member_id
    JOIN users u ON u.id = dm.user_id
    JOIN departments d ON d.id = dm.department_id
    WHERE lr.is_active
      AND EXISTS (
        SELECT 1 FROM leave_dates w
        WHERE w.leave_request_id = lr.id AND w.is_active AND w.date BETWEEN $1 AND $2)
      AND ($3::BIGINT IS NULL OR lr.department_member_id = $3)
      AND ($4::BIGINT IS NULL OR (dm.department_id = $4 AND dm.is_active))
      AND ($5::INT[] IS NULL OR (u.role_id = ANY($5) AND u.is_active AND dm.is_active))
      AND ($6::TEXT IS NULL
           OR (u.first_name || ' ' || u.last_name) ILIKE $6 OR u.code ILIKE $6)";

async fn insert_days(conn: &mut PgConnection, request_id: i64, days: &[LeaveDay]) -> DbResult<()> {
    for day in days {
        sqlx::query(
            "INSERT INTO leave_dates (leave_request_id, date, is_full_day, session_type)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(request_id)
        .bind(day.date)
        .bind(day.is_full_day)
        .bind(day.session_type.map(i16::from))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl LeaveStore for PgStore {
    async fn insert_leave(
        &self,
        member_id: i64,
        reason: &str,
        days: &[LeaveDay],
    ) -> DbResult<Admission<i64>> {
        let mut tx = self.pool.begin().await?;

        // Serialise admissions for the member
        sqlx::query("SELECT id FROM department_members WHERE id = $1 FOR UPDATE")
            .bind(member_id)
            .execute(&mut *tx)
            .await?;

        let (pending,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM leave_requests
                WHERE department_member_id = $1 AND is_active AND is_approved IS NULL)",
        )
        .bind(member_id)
        .fetch_one(&mut *tx)
        .await?;
        if pending {
            return Ok(Admission::PendingExists);
        }

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO leave_requests (department_member_id, reason) VALUES ($1, $2) RETURNING id",
        )
        .bind(member_id)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        insert_days(&mut *tx, id, days).await?;

        tx.commit().await?;
        Ok(Admission::Admitted(id))
    }

    async fn find_leave(&self, id: i64) -> DbResult<Option<RequestRecord>> {
        sqlx::query_as(
            "SELECT lr.id, lr.department_member_id, dm.department_id, lr.is_approved
             FROM leave_requests lr
             JOIN department_members dm ON dm.id = lr.department_member_id
             WHERE lr.id = $1 AND lr.is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn replace_leave(&self, id: i64, reason: &str, days: &[LeaveDay]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE leave_requests SET reason = $1, updated_at = NOW() WHERE id = $2")
            .bind(reason)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE leave_dates SET is_active = FALSE, deleted_at = NOW()
             WHERE leave_request_id = $1 AND is_active",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        insert_days(&mut *tx, id, days).await?;

        tx.commit().await
    }

    async fn remove_leave(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE leave_requests SET is_active = FALSE, deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE leave_dates SET is_active = FALSE, deleted_at = NOW()
             WHERE leave_request_id = $1 AND is_active",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    async fn set_leave_status(
        &self,
        id: i64,
        approver_id: i64,
        approved: bool,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            "UPDATE leave_requests
             SET is_approved = $1, approved_by = $2, approved_at = $3, updated_at = NOW()
             WHERE id = $4",
        )
        .bind(approved)
        .bind(approver_id)
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn member_leaves(
        &self,
        member_id: i64,
        window: DateWindow,
        slice: PageSlice,
    ) -> DbResult<(Vec<LeaveListItem>, i64)> {
        list_leaves(&self.pool, &ListFilter::new(window).member(member_id), slice).await
    }

    async fn leave_tally(
        &self,
        scope: Scope,
        window: DateWindow,
        approval: Approval,
    ) -> DbResult<f64> {
        let (tally,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(CASE WHEN ld.is_full_day THEN 1.0 ELSE 0.5 END), 0)::FLOAT8
             FROM leave_dates ld
             JOIN leave_requests lr ON lr.id = ld.leave_request_id AND lr.is_active
             JOIN department_members dm ON dm.id = lr.department_member_id
             WHERE ld.is_active AND ld.date BETWEEN $1 AND $2
               AND ($3::BIGINT IS NULL OR lr.department_member_id = $3)
               AND ($4::BIGINT IS NULL OR (dm.department_id = $4 AND dm.is_active))
               AND ($5 = 0
                    OR ($5 = 1 AND lr.is_approved IS TRUE)
                    OR ($5 = 2 AND lr.is_approved IS NULL))",
        )
        .bind(window.start)
        .bind(window.end)
        .bind(scope.member_id())
        .bind(scope.department_id())
        .bind(approval.code())
        .fetch_one(&self.pool)
        .await?;
        Ok(tally)
    }
}

/// Leave requests matching `filter`, newest first, each with its active dates
pub async fn list_leaves(
    pool: &PgPool,
    filter: &ListFilter,
    slice: PageSlice,
) -> DbResult<(Vec<LeaveListItem>, i64)> {
    let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {LIST_FROM}"))
        .bind(filter.window.start)
        .bind(filter.window.end)
        .bind(filter.member_id)
        .bind(filter.department_id)
        .bind(&filter.roles)
        .bind(&filter.pattern)
        .fetch_one(pool)
        .await?;

    let mut rows: Vec<LeaveListItem> = sqlx::query_as(&format!(
        "SELECT lr.id, lr.department_member_id, u.id AS user_id, u.first_name, u.last_name,
                u.code, d.name AS department_name, lr.reason, lr.is_approved, lr.approved_by,
                lr.approved_at, lr.created_at
         {LIST_FROM}
         ORDER BY lr.created_at DESC, lr.id DESC
         LIMIT $7 OFFSET $8"
    ))
    .bind(filter.window.start)
    .bind(filter.window.end)
    .bind(filter.member_id)
    .bind(filter.department_id)
    .bind(&filter.roles)
    .bind(&filter.pattern)
    .bind(slice.limit)
    .bind(slice.offset)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let dates: Vec<LeaveDateRow> = sqlx::query_as(
        "SELECT leave_request_id, date, is_full_day, session_type
         FROM leave_dates
         WHERE leave_request_id = ANY($1) AND is_active
         ORDER BY date",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_request: HashMap<i64, Vec<LeaveDay>> = HashMap::new();
    for row in dates {
        by_request
            .entry(row.leave_request_id)
            .or_default()
            .push(row.into());
    }
    for item in &mut rows {
        item.dates = by_request.remove(&item.id).unwrap_or_default();
        item.leave_days = leave_day_tally(
            item.dates
                .iter()
                .filter(|d| filter.window.contains(d.date)),
        );
    }

    Ok((rows, total))
}

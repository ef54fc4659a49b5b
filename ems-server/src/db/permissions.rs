use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::calendar::DateWindow;
use shared::models::PermissionListItem;
use shared::pagination::PageSlice;
use sqlx::{PgConnection, PgPool};

use super::{
    Admission, Approval, DbResult, ListFilter, PermissionSlot, PermissionStore, PgStore,
    RequestRecord, Scope,
};

const LIST_FROM: &str = "
    FROM permission_requests pr
    JOIN department_members dm ON dm.id = pr.department_member_id
    JOIN users u ON u.id = dm.user_id
    JOIN departments d ON d.id = dm.department_id
    WHERE pr.is_active AND pr.date BETWEEN $1 AND $2
      AND ($3::BIGINT IS NULL OR pr.department_member_id = $3)
      AND ($4::BIGINT IS NULL OR (dm.department_id = $4 AND dm.is_active))
      AND ($5::INT[] IS NULL OR (u.role_id = ANY($5) AND u.is_active AND dm.is_active))
      AND ($6::TEXT IS NULL
           OR (u.first_name || ' ' || u.last_name) ILIKE $6 OR u.code ILIKE $6)";

/// Active requests of a member dated inside `window`, optionally ignoring one
async fn count_in_window(
    conn: &mut PgConnection,
    member_id: i64,
    window: DateWindow,
    exclude: Option<i64>,
) -> DbResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM permission_requests
         WHERE department_member_id = $1 AND is_active AND date BETWEEN $2 AND $3
           AND ($4::BIGINT IS NULL OR id <> $4)",
    )
    .bind(member_id)
    .bind(window.start)
    .bind(window.end)
    .bind(exclude)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

async fn lock_member(conn: &mut PgConnection, member_id: i64) -> DbResult<()> {
    sqlx::query("SELECT id FROM department_members WHERE id = $1 FOR UPDATE")
        .bind(member_id)
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl PermissionStore for PgStore {
    async fn insert_permission(
        &self,
        member_id: i64,
        slot: &PermissionSlot,
        window: DateWindow,
        quota: i64,
    ) -> DbResult<Admission<i64>> {
        let mut tx = self.pool.begin().await?;
        lock_member(&mut *tx, member_id).await?;

        if count_in_window(&mut *tx, member_id, window, None).await? >= quota {
            return Ok(Admission::QuotaExceeded);
        }

        let (pending,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM permission_requests
                WHERE department_member_id = $1 AND is_active AND is_approved IS NULL)",
        )
        .bind(member_id)
        .fetch_one(&mut *tx)
        .await?;
        if pending {
            return Ok(Admission::PendingExists);
        }

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO permission_requests (department_member_id, reason, date, from_time, to_time)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(member_id)
        .bind(&slot.reason)
        .bind(slot.date)
        .bind(slot.from_time)
        .bind(slot.to_time)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Admission::Admitted(id))
    }

    async fn find_permission(&self, id: i64) -> DbResult<Option<RequestRecord>> {
        sqlx::query_as(
            "SELECT pr.id, pr.department_member_id, dm.department_id, pr.is_approved
             FROM permission_requests pr
             JOIN department_members dm ON dm.id = pr.department_member_id
             WHERE pr.id = $1 AND pr.is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_permission(
        &self,
        id: i64,
        slot: &PermissionSlot,
        window: DateWindow,
        quota: i64,
    ) -> DbResult<Admission<()>> {
        let mut tx = self.pool.begin().await?;

        let (member_id,): (i64,) =
            sqlx::query_as("SELECT department_member_id FROM permission_requests WHERE id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        lock_member(&mut *tx, member_id).await?;

        if count_in_window(&mut *tx, member_id, window, Some(id)).await? >= quota {
            return Ok(Admission::QuotaExceeded);
        }

        sqlx::query(
            "UPDATE permission_requests
             SET reason = $1, date = $2, from_time = $3, to_time = $4, updated_at = NOW()
             WHERE id = $5",
        )
        .bind(&slot.reason)
        .bind(slot.date)
        .bind(slot.from_time)
        .bind(slot.to_time)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Admission::Admitted(()))
    }

    async fn remove_permission(&self, id: i64) -> DbResult<()> {
        sqlx::query(
            "UPDATE permission_requests
             SET is_active = FALSE, deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_permission_status(
        &self,
        id: i64,
        approver_id: i64,
        approved: bool,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            "UPDATE permission_requests
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

    async fn member_permissions(
        &self,
        member_id: i64,
        window: DateWindow,
        slice: PageSlice,
    ) -> DbResult<(Vec<PermissionListItem>, i64)> {
        list_permissions(&self.pool, &ListFilter::new(window).member(member_id), slice).await
    }

    async fn count_permissions(
        &self,
        scope: Scope,
        window: DateWindow,
        approval: Approval,
    ) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*)
             FROM permission_requests pr
             JOIN department_members dm ON dm.id = pr.department_member_id
             WHERE pr.is_active AND pr.date BETWEEN $1 AND $2
               AND ($3::BIGINT IS NULL OR pr.department_member_id = $3)
               AND ($4::BIGINT IS NULL OR (dm.department_id = $4 AND dm.is_active))
               AND ($5 = 0
                    OR ($5 = 1 AND pr.is_approved IS TRUE)
                    OR ($5 = 2 AND pr.is_approved IS NULL))",
        )
        .bind(window.start)
        .bind(window.end)
        .bind(scope.member_id())
        .bind(scope.department_id())
        .bind(approval.code())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

/// Permission requests matching `filter`, newest first
pub async fn list_permissions(
    pool: &PgPool,
    filter: &ListFilter,
    slice: PageSlice,
) -> DbResult<(Vec<PermissionListItem>, i64)> {
    let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {LIST_FROM}"))
        .bind(filter.window.start)
        .bind(filter.window.end)
        .bind(filter.member_id)
        .bind(filter.department_id)
        .bind(&filter.roles)
        .bind(&filter.pattern)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as(&format!(
        "SELECT pr.id, pr.department_member_id, u.id AS user_id, u.first_name, u.last_name,
                u.code, d.name AS department_name, pr.reason, pr.date, pr.from_time, pr.to_time,
                pr.is_approved, pr.approved_by, pr.approved_at, pr.created_at
         {LIST_FROM}
         ORDER BY pr.created_at DESC, pr.id DESC
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

    Ok((rows, total))
}

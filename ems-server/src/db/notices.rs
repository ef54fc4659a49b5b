use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{Notice, NoticeListItem, Role};
use shared::pagination::PageSlice;
use sqlx::PgPool;

use super::{DbResult, NoticeStore, PgStore, Scope};

const NOTICE_COLUMNS: &str =
    "id, department_member_id, remarks, notice_end_date, is_approved, approved_by, created_at";

#[async_trait]
impl NoticeStore for PgStore {
    async fn insert_notice(&self, member_id: i64, remarks: &str) -> DbResult<Notice> {
        sqlx::query_as(&format!(
            "INSERT INTO notices (department_member_id, remarks) VALUES ($1, $2)
             RETURNING {NOTICE_COLUMNS}"
        ))
        .bind(member_id)
        .bind(remarks)
        .fetch_one(&self.pool)
        .await
    }

    async fn latest_notice(&self, member_id: i64) -> DbResult<Option<Notice>> {
        sqlx::query_as(&format!(
            "SELECT {NOTICE_COLUMNS} FROM notices
             WHERE department_member_id = $1 AND is_active
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        ))
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn approve_notice(
        &self,
        notice_id: i64,
        approver_id: i64,
        end_date: DateTime<Utc>,
    ) -> DbResult<Notice> {
        sqlx::query_as(&format!(
            "UPDATE notices
             SET notice_end_date = $1, is_approved = TRUE, approved_by = $2, updated_at = NOW()
             WHERE id = $3
             RETURNING {NOTICE_COLUMNS}"
        ))
        .bind(end_date)
        .bind(approver_id)
        .bind(notice_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn count_on_notice(&self, scope: Scope, now: DateTime<Utc>) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT n.department_member_id)
             FROM notices n
             JOIN department_members dm ON dm.id = n.department_member_id AND dm.is_active
             WHERE n.is_active AND n.is_approved AND n.notice_end_date > $1
               AND ($2::BIGINT IS NULL OR n.department_member_id = $2)
               AND ($3::BIGINT IS NULL OR dm.department_id = $3)",
        )
        .bind(now)
        .bind(scope.member_id())
        .bind(scope.department_id())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> DbResult<Vec<i64>> {
        let mut tx = self.pool.begin().await?;

        let expired: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT dm.id, dm.user_id
             FROM department_members dm
             WHERE dm.is_active
               AND EXISTS (
                 SELECT 1 FROM notices n
                 WHERE n.department_member_id = dm.id AND n.is_active AND n.is_approved
                   AND n.notice_end_date < $1)
             FOR UPDATE",
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        if expired.is_empty() {
            return Ok(Vec::new());
        }

        let (member_ids, user_ids): (Vec<i64>, Vec<i64>) = expired.into_iter().unzip();

        sqlx::query(
            "UPDATE department_members SET is_active = FALSE, deleted_at = $1, updated_at = $1
             WHERE id = ANY($2)",
        )
        .bind(now)
        .bind(&member_ids)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users SET is_active = FALSE, token = NULL, deleted_at = $1, updated_at = $1
             WHERE id = ANY($2)",
        )
        .bind(now)
        .bind(&user_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(member_ids)
    }
}

/// Notices of active members holding one of `roles`, newest first
pub async fn list_notices(
    pool: &PgPool,
    roles: &[Role],
    slice: PageSlice,
    pattern: Option<&str>,
) -> DbResult<(Vec<NoticeListItem>, i64)> {
    const FROM: &str = "
        FROM notices n
        JOIN department_members dm ON dm.id = n.department_member_id AND dm.is_active
        JOIN users u ON u.id = dm.user_id AND u.is_active
        JOIN departments d ON d.id = dm.department_id
        WHERE n.is_active AND u.role_id = ANY($1)
          AND ($2::TEXT IS NULL
               OR (u.first_name || ' ' || u.last_name) ILIKE $2 OR u.code ILIKE $2)";

    let role_ids: Vec<i32> = roles.iter().map(Role::id).collect();

    let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {FROM}"))
        .bind(&role_ids)
        .bind(pattern)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as(&format!(
        "SELECT n.id, n.department_member_id, u.id AS user_id, u.first_name, u.last_name, u.code,
                u.role_id, d.name AS department_name, n.remarks, n.notice_end_date,
                n.is_approved, n.approved_by, n.created_at
         {FROM}
         ORDER BY n.created_at DESC, n.id DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(&role_ids)
    .bind(pattern)
    .bind(slice.limit)
    .bind(slice.offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

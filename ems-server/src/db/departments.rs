use async_trait::async_trait;
use shared::models::{
    Department, DepartmentListItem, DepartmentMemberItem, HR_DEPARTMENT_ID, Membership, Role,
    lead_role,
};
use shared::pagination::PageSlice;
use sqlx::PgPool;

use super::{DbResult, DepartmentStore, PgStore};

#[async_trait]
impl DepartmentStore for PgStore {
    async fn find_department(&self, id: i64) -> DbResult<Option<Department>> {
        sqlx::query_as(
            "SELECT id, name, is_active, created_at FROM departments WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn department_name_taken(&self, name: &str, exclude: Option<i64>) -> DbResult<bool> {
        let (taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM departments
                WHERE is_active AND lower(name) = lower($1)
                  AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name.trim())
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn find_membership(&self, member_id: i64) -> DbResult<Option<Membership>> {
        sqlx::query_as(
            "SELECT id, department_id, user_id FROM department_members WHERE id = $1 AND is_active",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn membership_of(&self, user_id: i64) -> DbResult<Option<Membership>> {
        sqlx::query_as(
            "SELECT id, department_id, user_id FROM department_members
             WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn is_assignable(
        &self,
        user_id: i64,
        role: Role,
        department_id: Option<i64>,
    ) -> DbResult<bool> {
        let (ok,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM users u
                WHERE u.id = $1 AND u.is_active AND u.role_id = $2
                  AND NOT EXISTS (
                    SELECT 1 FROM department_members dm
                    WHERE dm.user_id = u.id AND dm.is_active
                      AND ($3::BIGINT IS NULL OR dm.department_id <> $3)))",
        )
        .bind(user_id)
        .bind(role.id())
        .bind(department_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(ok)
    }

    async fn count_assignable(&self, user_ids: &[i64], role: Role) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users u
             WHERE u.id = ANY($1) AND u.is_active AND u.role_id = $2
               AND NOT EXISTS (
                 SELECT 1 FROM department_members dm WHERE dm.user_id = u.id AND dm.is_active)",
        )
        .bind(user_ids)
        .bind(role.id())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_members(&self, department_id: i64) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM department_members WHERE department_id = $1 AND is_active",
        )
        .bind(department_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn create_department(&self, name: &str, lead_id: i64) -> DbResult<Department> {
        let mut tx = self.pool.begin().await?;

        let department: Department = sqlx::query_as(
            "INSERT INTO departments (name) VALUES ($1)
             RETURNING id, name, is_active, created_at",
        )
        .bind(name.trim())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO department_members (department_id, user_id) VALUES ($1, $2)")
            .bind(department.id)
            .bind(lead_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(department)
    }

    async fn reassign_lead(&self, id: i64, name: &str, lead_id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE departments SET name = $1, updated_at = NOW() WHERE id = $2")
            .bind(name.trim())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE department_members SET is_active = FALSE, deleted_at = NOW(), updated_at = NOW()
             WHERE department_id = $1 AND user_id <> $2 AND is_active",
        )
        .bind(id)
        .bind(lead_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO department_members (department_id, user_id)
             SELECT $1, $2
             WHERE NOT EXISTS (
                SELECT 1 FROM department_members
                WHERE department_id = $1 AND user_id = $2 AND is_active)",
        )
        .bind(id)
        .bind(lead_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    async fn remove_department(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE departments SET is_active = FALSE, deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE department_members SET is_active = FALSE, deleted_at = NOW(), updated_at = NOW()
             WHERE department_id = $1 AND is_active",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    async fn map_users(&self, id: i64, user_ids: &[i64]) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO department_members (department_id, user_id)
             SELECT $1, UNNEST($2::BIGINT[])",
        )
        .bind(id)
        .bind(user_ids)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unmap(&self, membership: Membership, replacement: Option<i64>) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE department_members SET is_active = FALSE, deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(membership.id)
        .execute(&mut *tx)
        .await?;

        if let Some(user_id) = replacement {
            sqlx::query("INSERT INTO department_members (department_id, user_id) VALUES ($1, $2)")
                .bind(membership.department_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await
    }
}

// ── List views ──

/// Active departments with their head and head count
pub async fn list_departments(
    pool: &PgPool,
    slice: PageSlice,
    pattern: Option<&str>,
) -> DbResult<(Vec<DepartmentListItem>, i64)> {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM departments
         WHERE is_active AND ($1::TEXT IS NULL OR name ILIKE $1)",
    )
    .bind(pattern)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as(
        "SELECT d.id, d.name,
                head.id AS lead_id, head.first_name AS lead_first_name,
                head.last_name AS lead_last_name,
                (SELECT COUNT(*) FROM department_members m
                 WHERE m.department_id = d.id AND m.is_active) AS member_count,
                d.created_at
         FROM departments d
         LEFT JOIN LATERAL (
            SELECT u.id, u.first_name, u.last_name
            FROM department_members dm
            JOIN users u ON u.id = dm.user_id AND u.is_active
            WHERE dm.department_id = d.id AND dm.is_active
              AND u.role_id = CASE WHEN d.id = $1 THEN $2 ELSE $3 END
            ORDER BY dm.id
            LIMIT 1
         ) head ON TRUE
         WHERE d.is_active AND ($4::TEXT IS NULL OR d.name ILIKE $4)
         ORDER BY d.id
         LIMIT $5 OFFSET $6",
    )
    .bind(HR_DEPARTMENT_ID)
    .bind(Role::Hr.id())
    .bind(Role::DepartmentLead.id())
    .bind(pattern)
    .bind(slice.limit)
    .bind(slice.offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

/// Active members of a department, head first
pub async fn department_members(
    pool: &PgPool,
    department_id: i64,
    slice: PageSlice,
    pattern: Option<&str>,
) -> DbResult<(Vec<DepartmentMemberItem>, i64)> {
    const FROM: &str = "
        FROM department_members dm
        JOIN users u ON u.id = dm.user_id AND u.is_active
        WHERE dm.department_id = $1 AND dm.is_active
          AND ($2::TEXT IS NULL
               OR (u.first_name || ' ' || u.last_name) ILIKE $2
               OR u.code ILIKE $2 OR u.email ILIKE $2)";

    let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {FROM}"))
        .bind(department_id)
        .bind(pattern)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as(&format!(
        "SELECT dm.id AS department_member_id, u.id AS user_id, u.first_name, u.last_name,
                u.code, u.email, u.role_id, (u.role_id = $3) AS is_lead
         {FROM}
         ORDER BY is_lead DESC, u.first_name, u.last_name
         LIMIT $4 OFFSET $5"
    ))
    .bind(department_id)
    .bind(pattern)
    .bind(lead_role(department_id).id())
    .bind(slice.limit)
    .bind(slice.offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

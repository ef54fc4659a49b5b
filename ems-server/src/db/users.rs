use async_trait::async_trait;
use shared::models::{Role, RoleInfo, UpdateUser, User, UserDetails, UserListItem, UserRef};
use shared::request::UserQuery;
use sqlx::PgPool;

use super::{Account, DbResult, DetailsField, IdentityField, NewUser, PgStore, UserStore};

const ACCOUNT_SELECT: &str = "
    SELECT u.id, u.first_name, u.last_name, u.email, u.role_id, u.password_hash, u.token,
           dm.department_id, dm.id AS department_member_id
    FROM users u
    LEFT JOIN department_members dm ON dm.user_id = u.id AND dm.is_active
    WHERE u.is_active";

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, mobile, code, role_id, manager_id, is_active, created_at";

const DETAILS_COLUMNS: &str = "user_id, date_of_joining, designation, experience, date_of_birth, \
     aadhar, pan, bank_account, ifsc, address, city, degree, college";

#[async_trait]
impl UserStore for PgStore {
    async fn account_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        sqlx::query_as(&format!("{ACCOUNT_SELECT} AND lower(u.email) = lower($1)"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn account_by_id(&self, user_id: i64) -> DbResult<Option<Account>> {
        sqlx::query_as(&format!("{ACCOUNT_SELECT} AND u.id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn set_token(&self, user_id: i64, token: Option<&str>) -> DbResult<()> {
        sqlx::query("UPDATE users SET token = $1, updated_at = NOW() WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_password(&self, user_id: i64, password_hash: &str) -> DbResult<()> {
        sqlx::query(
            "UPDATE users SET password_hash = $1, token = NULL, updated_at = NOW() WHERE id = $2",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user(&self, user_id: i64) -> DbResult<Option<User>> {
        sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn identity_conflict(
        &self,
        code: &str,
        email: &str,
        mobile: &str,
        exclude: Option<i64>,
    ) -> DbResult<Option<IdentityField>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT CASE WHEN code = $1 THEN 'code'
                         WHEN lower(email) = lower($2) THEN 'email'
                         ELSE 'mobile' END
             FROM users
             WHERE is_active
               AND (code = $1 OR lower(email) = lower($2) OR mobile = $3)
               AND ($4::BIGINT IS NULL OR id <> $4)
             LIMIT 1",
        )
        .bind(code)
        .bind(email)
        .bind(mobile)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(field,)| match field.as_str() {
            "code" => IdentityField::Code,
            "email" => IdentityField::Email,
            _ => IdentityField::Mobile,
        }))
    }

    async fn default_manager(&self) -> DbResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM users WHERE is_active AND role_id = $1 ORDER BY id LIMIT 1",
        )
        .bind(Role::Manager.id())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn insert_user(&self, user: &NewUser) -> DbResult<User> {
        sqlx::query_as(&format!(
            "INSERT INTO users (first_name, last_name, email, mobile, code, password_hash, role_id, manager_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.mobile)
        .bind(&user.code)
        .bind(&user.password_hash)
        .bind(user.role.id())
        .bind(user.manager_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user(&self, user_id: i64, update: &UpdateUser) -> DbResult<Option<User>> {
        sqlx::query_as(&format!(
            "UPDATE users
             SET first_name = $1, last_name = $2, email = $3, mobile = $4, code = $5,
                 role_id = $6, updated_at = NOW()
             WHERE id = $7 AND is_active
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(&update.mobile)
        .bind(&update.code)
        .bind(update.role_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn remove_user(&self, user_id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE users SET is_active = FALSE, token = NULL, deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE department_members SET is_active = FALSE, deleted_at = NOW(), updated_at = NOW()
             WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    async fn find_details(&self, user_id: i64) -> DbResult<Option<UserDetails>> {
        sqlx::query_as(&format!(
            "SELECT {DETAILS_COLUMNS} FROM user_details WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn details_conflict(
        &self,
        user_id: i64,
        aadhar: Option<&str>,
        pan: Option<&str>,
    ) -> DbResult<Option<DetailsField>> {
        let row: Option<(bool,)> = sqlx::query_as(
            "SELECT COALESCE(aadhar = $2, FALSE) FROM user_details
             WHERE user_id <> $1 AND (aadhar = $2 OR upper(pan) = upper($3))
             LIMIT 1",
        )
        .bind(user_id)
        .bind(aadhar)
        .bind(pan)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(is_aadhar,)| {
            if is_aadhar {
                DetailsField::Aadhar
            } else {
                DetailsField::Pan
            }
        }))
    }

    async fn upsert_details(&self, details: &UserDetails) -> DbResult<UserDetails> {
        sqlx::query_as(&format!(
            "INSERT INTO user_details ({DETAILS_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT (user_id) DO UPDATE SET
                date_of_joining = $2, designation = $3, experience = $4, date_of_birth = $5,
                aadhar = $6, pan = $7, bank_account = $8, ifsc = $9, address = $10,
                city = $11, degree = $12, college = $13, updated_at = NOW()
             RETURNING {DETAILS_COLUMNS}"
        ))
        .bind(details.user_id)
        .bind(details.date_of_joining)
        .bind(&details.designation)
        .bind(&details.experience)
        .bind(details.date_of_birth)
        .bind(&details.aadhar)
        .bind(&details.pan)
        .bind(&details.bank_account)
        .bind(&details.ifsc)
        .bind(&details.address)
        .bind(&details.city)
        .bind(&details.degree)
        .bind(&details.college)
        .fetch_one(&self.pool)
        .await
    }

    async fn count_staff(&self) -> DbResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_active AND role_id <> $1")
                .bind(Role::Admin.id())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

// ── Directory views ──

const DIRECTORY_FROM: &str = "
    FROM users u
    JOIN roles r ON r.id = u.role_id
    LEFT JOIN department_members dm ON dm.user_id = u.id AND dm.is_active
    LEFT JOIN departments d ON d.id = dm.department_id AND d.is_active
    WHERE u.is_active AND u.role_id <> $1
      AND ($2::INT IS NULL OR u.role_id = $2)
      AND ($3::BIGINT IS NULL OR dm.department_id = $3)
      AND ($4::TEXT IS NULL
           OR (u.first_name || ' ' || u.last_name) ILIKE $4
           OR u.code ILIKE $4 OR u.email ILIKE $4 OR u.mobile ILIKE $4)";

/// Users other than Admin, filtered by role, department and free text
pub async fn list_users(pool: &PgPool, query: &UserQuery) -> DbResult<(Vec<UserListItem>, i64)> {
    let pattern = query.pattern();
    let slice = query.slice();

    let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {DIRECTORY_FROM}"))
        .bind(Role::Admin.id())
        .bind(query.role_id)
        .bind(query.department_id)
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as(&format!(
        "SELECT u.id, u.first_name, u.last_name, u.email, u.mobile, u.code, u.role_id,
                r.name AS role_name, d.id AS department_id, d.name AS department_name
         {DIRECTORY_FROM}
         ORDER BY u.id DESC
         LIMIT $5 OFFSET $6"
    ))
    .bind(Role::Admin.id())
    .bind(query.role_id)
    .bind(query.department_id)
    .bind(&pattern)
    .bind(slice.limit)
    .bind(slice.offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

/// Code of the most recently created user
pub async fn last_user_code(pool: &PgPool) -> DbResult<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT code FROM users ORDER BY id DESC LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(code,)| code))
}

/// Active users holding one of `roles` with no active assignment.
/// `include` is listed even when mapped (the current lead on an edit screen).
pub async fn unmapped_users(
    pool: &PgPool,
    roles: &[Role],
    include: Option<i64>,
) -> DbResult<Vec<UserRef>> {
    let role_ids: Vec<i32> = roles.iter().map(Role::id).collect();
    sqlx::query_as(
        "SELECT u.id, u.first_name, u.last_name, u.code, u.role_id
         FROM users u
         WHERE u.is_active AND u.role_id = ANY($1)
           AND (u.id = $2 OR NOT EXISTS (
                SELECT 1 FROM department_members dm WHERE dm.user_id = u.id AND dm.is_active))
         ORDER BY u.first_name, u.last_name",
    )
    .bind(role_ids)
    .bind(include)
    .fetch_all(pool)
    .await
}

pub async fn list_roles(pool: &PgPool) -> DbResult<Vec<RoleInfo>> {
    sqlx::query_as("SELECT id, name FROM roles ORDER BY id")
        .fetch_all(pool)
        .await
}

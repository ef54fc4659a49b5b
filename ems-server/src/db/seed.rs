//! Idempotent startup seeding

use shared::models::{HR_DEPARTMENT_ID, HR_DEPARTMENT_NAME, Role};
use sqlx::PgPool;

use super::DbResult;

struct SeedUser {
    first_name: &'static str,
    last_name: &'static str,
    code: &'static str,
    email: &'static str,
    mobile: &'static str,
    role: Role,
}

const SEED_USERS: [SeedUser; 3] = [
    SeedUser {
        first_name: "System",
        last_name: "Admin",
        code: "A000",
        email: "admin@ems.local",
        mobile: "9000000000",
        role: Role::Admin,
    },
    SeedUser {
        first_name: "Default",
        last_name: "Manager",
        code: "M000",
        email: "manager@ems.local",
        mobile: "9000000001",
        role: Role::Manager,
    },
    SeedUser {
        first_name: "Default",
        last_name: "HR",
        code: "H000",
        email: "hr@ems.local",
        mobile: "9000000002",
        role: Role::Hr,
    },
];

/// Seed roles, default accounts and the HR department.
///
/// Accounts are only created on an empty `users` table and the HR department
/// only on an empty `departments` table.
pub async fn run(pool: &PgPool, password_hash: &str) -> DbResult<()> {
    seed_roles(pool).await?;
    seed_users(pool, password_hash).await?;
    seed_hr_department(pool).await
}

async fn seed_roles(pool: &PgPool) -> DbResult<()> {
    for role in Role::ALL {
        sqlx::query(
            "INSERT INTO roles (id, name) VALUES ($1, $2)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name",
        )
        .bind(role.id())
        .bind(role.name())
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_users(pool: &PgPool, password_hash: &str) -> DbResult<()> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for user in &SEED_USERS {
        sqlx::query(
            "INSERT INTO users (first_name, last_name, code, email, mobile, password_hash, role_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.code)
        .bind(user.email)
        .bind(user.mobile)
        .bind(password_hash)
        .bind(user.role.id())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!(count = SEED_USERS.len(), "Seeded default accounts");
    Ok(())
}

async fn seed_hr_department(pool: &PgPool) -> DbResult<()> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM departments")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO departments (id, name) VALUES ($1, $2)")
        .bind(HR_DEPARTMENT_ID)
        .bind(HR_DEPARTMENT_NAME)
        .execute(&mut *tx)
        .await?;

    // Explicit id: move the sequence past it
    sqlx::query(
        "SELECT setval(pg_get_serial_sequence('departments', 'id'),
                       (SELECT MAX(id) FROM departments))",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO department_members (department_id, user_id)
         SELECT $1, u.id FROM users u
         WHERE u.is_active AND u.role_id = $2
           AND NOT EXISTS (
             SELECT 1 FROM department_members dm WHERE dm.user_id = u.id AND dm.is_active)
         ORDER BY u.id
         LIMIT 1",
    )
    .bind(HR_DEPARTMENT_ID)
    .bind(Role::Hr.id())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Seeded {HR_DEPARTMENT_NAME} department");
    Ok(())
}

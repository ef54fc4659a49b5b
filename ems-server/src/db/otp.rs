use async_trait::async_trait;

use super::{DbResult, OtpRecord, OtpStore, PgStore};

#[async_trait]
impl OtpStore for PgStore {
    async fn insert_otp(&self, user_id: i64, email: &str, otp: &str) -> DbResult<()> {
        sqlx::query("INSERT INTO forgot_password_otps (user_id, email, otp) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(email)
            .bind(otp)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn latest_otp(&self, email: &str) -> DbResult<Option<OtpRecord>> {
        sqlx::query_as(
            "SELECT id, user_id, otp, created_at FROM forgot_password_otps
             WHERE lower(email) = lower($1) AND NOT is_used
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_otp_used(&self, otp_id: i64) -> DbResult<()> {
        sqlx::query("UPDATE forgot_password_otps SET is_used = TRUE WHERE id = $1")
            .bind(otp_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

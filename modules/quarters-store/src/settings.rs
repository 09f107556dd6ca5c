//! Settings store. Owned by the surrounding application's settings
//! management; this side only reads the one value the engine consumes.

use anyhow::Result;
use sqlx::PgPool;
use tracing::warn;

const MAX_AGE_GAP_KEY: &str = "max_age_gap";

#[derive(Clone)]
pub struct SettingsStore {
    pool: PgPool,
    default_max_age_gap: i32,
}

impl SettingsStore {
    pub fn new(pool: PgPool, default_max_age_gap: i32) -> Self {
        Self {
            pool,
            default_max_age_gap,
        }
    }

    /// The configured age-gap limit. Read per allocation request so an
    /// operator-changed setting applies without a restart. Falls back to
    /// the configured default when the row is missing or unparseable.
    pub async fn max_age_gap(&self) -> Result<i32> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT value FROM settings WHERE key = $1
            "#,
        )
        .bind(MAX_AGE_GAP_KEY)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((value,)) => match value.parse::<i32>() {
                Ok(limit) if limit >= 0 => Ok(limit),
                _ => {
                    warn!(%value, "unusable max_age_gap setting, using default");
                    Ok(self.default_max_age_gap)
                }
            },
            None => Ok(self.default_max_age_gap),
        }
    }
}

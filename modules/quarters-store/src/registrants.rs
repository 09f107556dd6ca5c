//! Read store for registrants. The engine's candidate pool.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use quarters_common::{Gender, Registrant};

#[derive(Debug, Clone, sqlx::FromRow)]
struct RegistrantRow {
    id: Uuid,
    full_name: String,
    gender: String,
    birth_date: NaiveDate,
    verified: bool,
    registered_at: DateTime<Utc>,
}

impl TryFrom<RegistrantRow> for Registrant {
    type Error = anyhow::Error;

    fn try_from(row: RegistrantRow) -> Result<Self> {
        Ok(Registrant {
            id: row.id,
            full_name: row.full_name,
            gender: row.gender.parse()?,
            birth_date: row.birth_date,
            verified: row.verified,
            registered_at: row.registered_at,
        })
    }
}

#[derive(Clone)]
pub struct RegistrantStore {
    pool: PgPool,
}

impl RegistrantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verified registrants of one gender with no current allocation,
    /// youngest first (birth date descending, id as the stable tie-break).
    pub async fn unallocated_verified(&self, gender: Gender) -> Result<Vec<Registrant>> {
        let rows = sqlx::query_as::<_, RegistrantRow>(
            r#"
            SELECT id, full_name, gender, birth_date, verified, registered_at
            FROM registrants r
            WHERE r.verified = TRUE
              AND r.gender = $1
              AND NOT EXISTS (
                  SELECT 1 FROM allocations a WHERE a.registrant_id = r.id
              )
            ORDER BY r.birth_date DESC, r.id ASC
            "#,
        )
        .bind(gender.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Registrant::try_from).collect()
    }

    /// Single registrant lookup (manual path).
    pub async fn registrant(&self, id: Uuid) -> Result<Option<Registrant>> {
        let row = sqlx::query_as::<_, RegistrantRow>(
            r#"
            SELECT id, full_name, gender, birth_date, verified, registered_at
            FROM registrants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Registrant::try_from).transpose()
    }
}

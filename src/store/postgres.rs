//! PostgreSQL-backed store
//!
//! History lives in a JSONB array and tags in a TEXT[] column so that every
//! patch is a single `UPDATE ... RETURNING`, which keeps history appends and
//! field updates atomic per address.

use axum::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use super::{merge_tags, UserStore, WalletPatch, WalletStore};
use crate::error::ApiError;
use crate::models::{
    RiskClassification, RiskLevel, TransactionEvent, UserAccount, WalletAddress, WalletRecord,
};

const SOURCE_COMPUTED: &str = "computed";
const SOURCE_ADMIN: &str = "admin";

/// Raw wallet row
#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    address: String,
    trust_score: i32,
    risk_level: String,
    risk_source: String,
    risk_from_score: Option<i32>,
    frozen: bool,
    whitelist: bool,
    unblacklist_count: i32,
    history: Json<Vec<serde_json::Value>>,
    tags: Vec<String>,
    owner_username: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WalletRow> for WalletRecord {
    type Error = ApiError;

    fn try_from(row: WalletRow) -> Result<Self, Self::Error> {
        let level = RiskLevel::parse(&row.risk_level).ok_or_else(|| {
            ApiError::InternalError(format!(
                "Unknown risk level '{}' stored for {}",
                row.risk_level, row.address
            ))
        })?;

        let risk = match row.risk_source.as_str() {
            SOURCE_ADMIN => RiskClassification::AdminOverridden { level },
            _ => RiskClassification::Computed {
                level,
                from_score: row.risk_from_score.unwrap_or(row.trust_score),
            },
        };

        // Entries that are not objects still occupy a slot; they just carry no valid data.
        let history = row
            .history
            .0
            .into_iter()
            .map(|v| serde_json::from_value::<TransactionEvent>(v).unwrap_or_default())
            .collect();

        Ok(WalletRecord {
            address: WalletAddress::parse(&row.address)?,
            trust_score: row.trust_score,
            risk,
            frozen: row.frozen,
            whitelist: row.whitelist,
            unblacklist_count: row.unblacklist_count,
            history,
            tags: row.tags,
            owner_username: row.owner_username,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Split a classification into (level, source, from_score) columns
fn classification_columns(risk: &RiskClassification) -> (&'static str, &'static str, Option<i32>) {
    match risk {
        RiskClassification::Computed { level, from_score } => {
            (level.as_str(), SOURCE_COMPUTED, Some(*from_score))
        }
        RiskClassification::AdminOverridden { level } => (level.as_str(), SOURCE_ADMIN, None),
    }
}

/// Postgres implementation of both store traits
#[derive(Clone)]
pub struct PgStore {
    db_pool: PgPool,
}

impl PgStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl WalletStore for PgStore {
    async fn find(&self, address: &WalletAddress) -> Result<Option<WalletRecord>, ApiError> {
        let row = sqlx::query_as::<_, WalletRow>("SELECT * FROM wallets WHERE address = $1")
            .bind(address.as_str())
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        row.map(WalletRecord::try_from).transpose()
    }

    async fn upsert(
        &self,
        address: &WalletAddress,
        initial_owner: Option<&str>,
    ) -> Result<WalletRecord, ApiError> {
        // An existing owner is never replaced, only filled in when missing.
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            INSERT INTO wallets (address, owner_username)
            VALUES ($1, $2)
            ON CONFLICT (address) DO UPDATE
                SET owner_username = COALESCE(wallets.owner_username, EXCLUDED.owner_username)
            RETURNING *
            "#,
        )
        .bind(address.as_str())
        .bind(initial_owner)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        row.try_into()
    }

    async fn apply_update(
        &self,
        address: &WalletAddress,
        patch: WalletPatch,
    ) -> Result<WalletRecord, ApiError> {
        let (risk_level, risk_source, risk_from_score) = match &patch.risk {
            Some(risk) => {
                let (level, source, from_score) = classification_columns(risk);
                (Some(level), Some(source), from_score)
            }
            None => (None, None, None),
        };

        let mut add_tags = Vec::new();
        merge_tags(&mut add_tags, &patch.add_tags);

        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            UPDATE wallets SET
                trust_score = COALESCE($2, trust_score),
                risk_level = COALESCE($3, risk_level),
                risk_source = COALESCE($4, risk_source),
                risk_from_score = CASE WHEN $4::text IS NULL THEN risk_from_score ELSE $5 END,
                frozen = COALESCE($6, frozen),
                whitelist = COALESCE($7, whitelist),
                unblacklist_count = unblacklist_count + $8,
                history = CASE
                    WHEN $9::jsonb IS NULL THEN history
                    ELSE history || jsonb_build_array($9::jsonb)
                END,
                tags = tags || ARRAY(
                    SELECT t FROM unnest($10::text[]) WITH ORDINALITY AS u(t, ord)
                    WHERE NOT (t = ANY(tags))
                    ORDER BY ord
                ),
                updated_at = NOW()
            WHERE address = $1
            RETURNING *
            "#,
        )
        .bind(address.as_str())
        .bind(patch.trust_score)
        .bind(risk_level)
        .bind(risk_source)
        .bind(risk_from_score)
        .bind(patch.frozen)
        .bind(patch.whitelist)
        .bind(i32::from(patch.increment_unblacklist))
        .bind(patch.append_event.map(Json))
        .bind(add_tags)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        row.ok_or_else(|| ApiError::NotFound(format!("Wallet {} not found", address)))?
            .try_into()
    }

    async fn list_by_owner(&self, username: &str) -> Result<Vec<WalletRecord>, ApiError> {
        let rows = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT w.* FROM wallets w
            JOIN user_wallets uw ON uw.address = w.address
            WHERE uw.username = $1
            ORDER BY uw.linked_at ASC
            "#,
        )
        .bind(username)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(WalletRecord::try_from).collect()
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        crate::db::check_health(&self.db_pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, username: &str) -> Result<Option<UserAccount>, ApiError> {
        let user = sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT
                u.username,
                u.is_verified,
                u.created_at,
                COALESCE(
                    ARRAY_AGG(uw.address ORDER BY uw.linked_at) FILTER (WHERE uw.address IS NOT NULL),
                    '{}'
                ) AS wallets
            FROM users u
            LEFT JOIN user_wallets uw ON uw.username = u.username
            WHERE u.username = $1
            GROUP BY u.username
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    async fn create_user(&self, username: &str) -> Result<UserAccount, ApiError> {
        sqlx::query("INSERT INTO users (username) VALUES ($1) ON CONFLICT (username) DO NOTHING")
            .bind(username)
            .execute(&self.db_pool)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        self.find_user(username)
            .await?
            .ok_or_else(|| ApiError::InternalError(format!("User {} vanished after insert", username)))
    }

    async fn link_wallet(
        &self,
        username: &str,
        address: &WalletAddress,
    ) -> Result<bool, ApiError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_wallets (username, address)
            VALUES ($1, $2)
            ON CONFLICT (username, address) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(address.as_str())
        .execute(&self.db_pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                ApiError::NotFound(format!("User {} not found", username))
            }
            other => ApiError::DatabaseError(other.to_string()),
        })?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(risk_level: &str, risk_source: &str) -> WalletRow {
        WalletRow {
            address: "0xabc".to_string(),
            trust_score: 420,
            risk_level: risk_level.to_string(),
            risk_source: risk_source.to_string(),
            risk_from_score: Some(480),
            frozen: false,
            whitelist: false,
            unblacklist_count: 2,
            history: Json(vec![
                serde_json::json!({"amount": 3.5, "recipient": "0xdef", "score_impact": 5}),
                serde_json::json!(17),
            ]),
            tags: vec!["no-data".to_string()],
            owner_username: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion_keeps_staleness() {
        let record = WalletRecord::try_from(row("suspicious", "computed")).unwrap();
        assert_eq!(record.risk_level(), RiskLevel::Suspicious);
        assert!(record.risk.is_stale(record.trust_score));
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.history[0].valid_amount(), Some(3.5));
        assert_eq!(record.history[1].valid_amount(), None);
    }

    #[test]
    fn test_row_conversion_admin_source() {
        let record = WalletRecord::try_from(row("blocked", "admin")).unwrap();
        assert_eq!(
            record.risk,
            RiskClassification::AdminOverridden {
                level: RiskLevel::Blocked
            }
        );
    }

    #[test]
    fn test_row_conversion_rejects_unknown_level() {
        assert!(WalletRecord::try_from(row("An Toàn", "computed")).is_err());
    }

    #[test]
    fn test_classification_columns() {
        let (level, source, from) = classification_columns(&RiskClassification::Computed {
            level: RiskLevel::Safe,
            from_score: 510,
        });
        assert_eq!((level, source, from), ("safe", "computed", Some(510)));
    }
}

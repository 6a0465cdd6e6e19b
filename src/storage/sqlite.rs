use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{AssessmentRecord, AssessmentRecorder};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed assessment store
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create an in-memory database, mainly for tests
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        // Every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fetch a single assessment by id
    pub async fn get_assessment(&self, id: &str) -> StorageResult<Option<AssessmentRecord>> {
        let row: Option<AssessmentRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, assessment_type, risk_score, risk_category,
                   responses, recommendations, created_at
            FROM health_assessments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AssessmentRecord::try_from).transpose()
    }

    /// List a user's assessments, newest first
    pub async fn list_assessments(
        &self,
        user_id: &str,
        limit: u32,
    ) -> StorageResult<Vec<AssessmentRecord>> {
        let rows: Vec<AssessmentRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, assessment_type, risk_score, risk_category,
                   responses, recommendations, created_at
            FROM health_assessments
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AssessmentRecord::try_from).collect()
    }
}

#[async_trait]
impl AssessmentRecorder for SqliteStorage {
    async fn save(&self, record: &AssessmentRecord) -> StorageResult<()> {
        let responses =
            serde_json::to_string(&record.responses).map_err(|e| StorageError::Serialization {
                message: format!("Failed to serialize responses: {}", e),
            })?;
        let recommendations = record
            .supplementary
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StorageError::Serialization {
                message: format!("Failed to serialize recommendations: {}", e),
            })?;

        sqlx::query(
            r#"
            INSERT INTO health_assessments
                (id, user_id, assessment_type, risk_score, risk_category, responses, recommendations, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(record.assessment_type.as_str())
        .bind(record.risk_score)
        .bind(record.risk_category.as_str())
        .bind(&responses)
        .bind(&recommendations)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(id = %record.id, user_id = %record.user_id, "Assessment stored");
        Ok(())
    }
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct AssessmentRow {
    id: String,
    user_id: String,
    assessment_type: String,
    risk_score: f64,
    risk_category: String,
    responses: String,
    recommendations: Option<String>,
    created_at: String,
}

impl TryFrom<AssessmentRow> for AssessmentRecord {
    type Error = StorageError;

    fn try_from(row: AssessmentRow) -> Result<Self, Self::Error> {
        use chrono::DateTime;

        let invalid = |message: String| StorageError::Serialization { message };

        Ok(Self {
            assessment_type: row.assessment_type.parse().map_err(invalid)?,
            risk_category: row.risk_category.parse().map_err(invalid)?,
            responses: serde_json::from_str(&row.responses)
                .map_err(|e| invalid(format!("Invalid responses for {}: {}", row.id, e)))?,
            supplementary: row
                .recommendations
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(|e| invalid(format!("Invalid recommendations for {}: {}", row.id, e)))?,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| invalid(format!("Invalid created_at for {}: {}", row.id, e)))?,
            id: row.id,
            user_id: row.user_id,
            risk_score: row.risk_score,
        })
    }
}

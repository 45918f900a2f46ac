//! 遥测数据仓库（PostgreSQL）

use crate::db::PostgresPool;
use crate::errors::AppError;
use crate::models::{
    AlertRecord, AlertSubscription, Reading, Recipient, RecipientQuery, Sensor, VerificationStatus,
};
use crate::repositories::PersistenceSink;
use sqlx::types::Json;
use sqlx::FromRow;

/// 通知对象行
#[derive(Debug, FromRow)]
struct RecipientRow {
    id: String,
    name: String,
    email: String,
    role: String,
    subscriptions: Vec<String>,
    district: Option<String>,
    verification_status: String,
    active: bool,
}

impl From<RecipientRow> for Recipient {
    fn from(row: RecipientRow) -> Self {
        Recipient {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            subscriptions: row
                .subscriptions
                .iter()
                .map(|s| AlertSubscription::parse(s))
                .collect(),
            district: row.district,
            verification_status: VerificationStatus::parse(&row.verification_status),
            active: row.active,
        }
    }
}

/// 遥测数据仓库
#[derive(Clone)]
pub struct PgTelemetryRepository {
    pool: PostgresPool,
}

impl PgTelemetryRepository {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }
}

fn persistence_error(e: sqlx::Error) -> AppError {
    AppError::Persistence(e.to_string())
}

#[async_trait::async_trait]
impl PersistenceSink for PgTelemetryRepository {
    async fn put_reading(&self, reading: &Reading) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sensor_readings (sensor_id, recorded_at, location, parameters, battery_level, signal_strength, status, anomaly)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&reading.sensor_id)
        .bind(reading.timestamp)
        .bind(Json(&reading.location))
        .bind(Json(&reading.parameters))
        .bind(reading.battery_level)
        .bind(reading.signal_strength)
        .bind(reading.status.as_str())
        .bind(reading.anomaly.map(|a| a.as_str()))
        .execute(self.pool.pool())
        .await
        .map_err(persistence_error)?;

        Ok(())
    }

    async fn upsert_sensor_state(&self, sensor: &Sensor) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sensors (id, name, village, district, latitude, longitude, status, battery_level, signal_strength, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                status = EXCLUDED.status,
                battery_level = EXCLUDED.battery_level,
                signal_strength = EXCLUDED.signal_strength,
                updated_at = NOW()
            "#,
        )
        .bind(&sensor.id)
        .bind(&sensor.name)
        .bind(&sensor.location.village)
        .bind(&sensor.location.district)
        .bind(sensor.location.latitude)
        .bind(sensor.location.longitude)
        .bind(sensor.status.as_str())
        .bind(sensor.battery_level)
        .bind(sensor.signal_strength)
        .execute(self.pool.pool())
        .await
        .map_err(persistence_error)?;

        Ok(())
    }

    async fn put_alert_record(&self, record: &AlertRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO alert_records (id, sensor_id, location, severity, status, alerts, readings, created_at, acknowledged_by, acknowledged_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(&record.sensor_id)
        .bind(Json(&record.location))
        .bind(record.severity.as_str())
        .bind(record.status.as_str())
        .bind(Json(&record.alerts))
        .bind(Json(&record.readings))
        .bind(record.created_at)
        .bind(&record.acknowledged_by)
        .bind(record.acknowledged_at)
        .execute(self.pool.pool())
        .await
        .map_err(persistence_error)?;

        Ok(())
    }

    async fn query_recipients(&self, query: &RecipientQuery) -> Result<Vec<Recipient>, AppError> {
        let (sql, value) = match query {
            RecipientQuery::Role(role) => (
                "SELECT * FROM recipients WHERE LOWER(role) = LOWER($1) AND active = true ORDER BY created_at",
                role.clone(),
            ),
            RecipientQuery::Verification(status) => (
                "SELECT * FROM recipients WHERE verification_status = $1 AND active = true ORDER BY created_at",
                status.as_str().to_string(),
            ),
        };

        let rows = sqlx::query_as::<_, RecipientRow>(sql)
            .bind(value)
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| AppError::RecipientResolution(format!("{}: {}", query, e)))?;

        Ok(rows.into_iter().map(Recipient::from).collect())
    }
}

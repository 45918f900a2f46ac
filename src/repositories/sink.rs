//! 持久化接口

use crate::errors::AppError;
use crate::models::{AlertRecord, Reading, Recipient, RecipientQuery, Sensor};

/// 外部持久化接口
///
/// 实现方自行保证并发安全；管线只保证同一传感器在同一 tick 内的调用顺序。
#[async_trait::async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn put_reading(&self, reading: &Reading) -> Result<(), AppError>;

    async fn upsert_sensor_state(&self, sensor: &Sensor) -> Result<(), AppError>;

    async fn put_alert_record(&self, record: &AlertRecord) -> Result<(), AppError>;

    async fn query_recipients(&self, query: &RecipientQuery) -> Result<Vec<Recipient>, AppError>;
}

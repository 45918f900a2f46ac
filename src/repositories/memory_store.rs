//! 进程内遥测存储（未启用数据库时使用）

use crate::errors::AppError;
use crate::models::{AlertRecord, Reading, Recipient, RecipientQuery, Sensor};
use crate::repositories::PersistenceSink;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// 历史保留上限
const HISTORY_LIMIT: usize = 10_000;

#[derive(Default)]
struct Inner {
    readings: VecDeque<Reading>,
    alerts: VecDeque<AlertRecord>,
    sensors: HashMap<String, Sensor>,
}

/// 进程内遥测存储
pub struct MemoryTelemetryStore {
    inner: Mutex<Inner>,
    directory: Vec<Recipient>,
}

impl MemoryTelemetryStore {
    pub fn new(directory: Vec<Recipient>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            directory,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Persistence("内存存储锁已失效".to_string()))
    }

    pub fn reading_count(&self) -> usize {
        self.lock().map(|g| g.readings.len()).unwrap_or(0)
    }

    pub fn alert_count(&self) -> usize {
        self.lock().map(|g| g.alerts.len()).unwrap_or(0)
    }

    pub fn sensor(&self, id: &str) -> Option<Sensor> {
        self.lock().ok().and_then(|g| g.sensors.get(id).cloned())
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T) {
    if queue.len() >= HISTORY_LIMIT {
        queue.pop_front();
    }
    queue.push_back(item);
}

#[async_trait::async_trait]
impl PersistenceSink for MemoryTelemetryStore {
    async fn put_reading(&self, reading: &Reading) -> Result<(), AppError> {
        push_bounded(&mut self.lock()?.readings, reading.clone());
        Ok(())
    }

    async fn upsert_sensor_state(&self, sensor: &Sensor) -> Result<(), AppError> {
        self.lock()?.sensors.insert(sensor.id.clone(), sensor.clone());
        Ok(())
    }

    async fn put_alert_record(&self, record: &AlertRecord) -> Result<(), AppError> {
        push_bounded(&mut self.lock()?.alerts, record.clone());
        Ok(())
    }

    async fn query_recipients(&self, query: &RecipientQuery) -> Result<Vec<Recipient>, AppError> {
        Ok(self
            .directory
            .iter()
            .filter(|r| r.active && query.matches(r))
            .cloned()
            .collect())
    }
}

//! 预警与读数存储服务
//!
//! 写入外部持久化接口，同时在进程内保留最近的读数与预警（新的在前，
//! 超出容量淘汰最旧的）。持久化失败的条目仍保留在缓冲区中并计数，
//! 不会被静默丢弃。

use crate::models::{AlertRecord, Reading, Sensor};
use crate::repositories::PersistenceSink;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// 有界环形缓冲区（新的在前）
#[derive(Debug)]
struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 插入最新条目，返回被淘汰的最旧条目
    fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_back()
        } else {
            None
        };
        self.items.push_front(item);
        evicted
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// 缓冲区条目
#[derive(Debug, Clone)]
struct Buffered<T> {
    item: T,
    persisted: bool,
}

/// 存储统计
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub readings_persisted: u64,
    pub readings_retained_in_memory: u64,
    pub alerts_persisted: u64,
    pub alerts_retained_in_memory: u64,
    pub sensor_state_failures: u64,
    /// 未持久化即被淘汰的条目数
    pub unpersisted_evicted: u64,
    pub buffered_readings: usize,
    pub buffered_alerts: usize,
}

struct State {
    readings: RingBuffer<Buffered<Reading>>,
    alerts: RingBuffer<Buffered<AlertRecord>>,
    stats: StoreStats,
}

/// 预警与读数存储
pub struct AlertStore {
    sink: Arc<dyn PersistenceSink>,
    state: Mutex<State>,
}

impl AlertStore {
    pub fn new(sink: Arc<dyn PersistenceSink>, reading_capacity: usize, alert_capacity: usize) -> Self {
        Self {
            sink,
            state: Mutex::new(State {
                readings: RingBuffer::new(reading_capacity),
                alerts: RingBuffer::new(alert_capacity),
                stats: StoreStats::default(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 记录读数，返回是否已持久化
    pub async fn record_reading(&self, reading: &Reading) -> bool {
        let persisted = match self.sink.put_reading(reading).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    sensor_id = %reading.sensor_id,
                    "读数持久化失败，保留在内存缓冲区"
                );
                false
            }
        };

        let mut state = self.state();
        if persisted {
            state.stats.readings_persisted += 1;
        } else {
            state.stats.readings_retained_in_memory += 1;
        }
        let evicted = state.readings.push(Buffered {
            item: reading.clone(),
            persisted,
        });
        if evicted.is_some_and(|e| !e.persisted) {
            state.stats.unpersisted_evicted += 1;
        }

        persisted
    }

    /// 更新传感器状态，失败只计数
    pub async fn save_sensor(&self, sensor: &Sensor) -> bool {
        match self.sink.upsert_sensor_state(sensor).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, sensor_id = %sensor.id, "传感器状态更新失败");
                self.state().stats.sensor_state_failures += 1;
                false
            }
        }
    }

    /// 记录预警，返回是否已持久化
    pub async fn record_alert(&self, record: &AlertRecord) -> bool {
        let persisted = match self.sink.put_alert_record(record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    alert_id = %record.id,
                    sensor_id = %record.sensor_id,
                    "预警持久化失败，保留在内存缓冲区"
                );
                false
            }
        };

        let mut state = self.state();
        if persisted {
            state.stats.alerts_persisted += 1;
        } else {
            state.stats.alerts_retained_in_memory += 1;
        }
        let evicted = state.alerts.push(Buffered {
            item: record.clone(),
            persisted,
        });
        if evicted.is_some_and(|e| !e.persisted) {
            state.stats.unpersisted_evicted += 1;
        }

        persisted
    }

    /// 最近的读数（新的在前）
    pub fn recent_readings(&self, limit: usize) -> Vec<Reading> {
        self.state()
            .readings
            .iter()
            .take(limit)
            .map(|b| b.item.clone())
            .collect()
    }

    /// 最近的预警（新的在前）
    pub fn recent_alerts(&self, limit: usize) -> Vec<AlertRecord> {
        self.state()
            .alerts
            .iter()
            .take(limit)
            .map(|b| b.item.clone())
            .collect()
    }

    /// 尚未持久化的预警
    pub fn unpersisted_alerts(&self) -> Vec<AlertRecord> {
        self.state()
            .alerts
            .iter()
            .filter(|b| !b.persisted)
            .map(|b| b.item.clone())
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.state();
        StoreStats {
            buffered_readings: state.readings.len(),
            buffered_alerts: state.alerts.len(),
            ..state.stats.clone()
        }
    }
}

//! 模拟调度状态模型

use crate::models::Sensor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 每个传感器的运行计数
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SensorRuntimeStats {
    pub total_readings: u64,
    pub alerts_sent: u64,
    pub consecutive_abnormal_readings: u32,
    pub last_reading_at: Option<DateTime<Utc>>,
}

impl SensorRuntimeStats {
    /// 一个 tick 完成后更新计数
    pub fn record_tick(&mut self, alert_count: usize, at: DateTime<Utc>) {
        self.total_readings += 1;
        self.last_reading_at = Some(at);
        if alert_count > 0 {
            self.alerts_sent += alert_count as u64;
            self.consecutive_abnormal_readings += 1;
        } else {
            self.consecutive_abnormal_readings = 0;
        }
    }
}

/// 调度器状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// 单次 tick 汇总
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub sensors_processed: usize,
    pub sensors_failed: usize,
    pub alerts_raised: usize,
    pub completed_at: DateTime<Utc>,
}

/// 传感器快照
#[derive(Debug, Clone, Serialize)]
pub struct SensorSnapshot {
    pub sensor: Sensor,
    pub stats: SensorRuntimeStats,
}

/// 控制面返回的调度器状态
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub tick_interval_seconds: f64,
    pub tick_count: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_tick: Option<TickReport>,
    pub sensors: Vec<SensorSnapshot>,
}

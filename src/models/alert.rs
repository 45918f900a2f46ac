//! 预警模型

use crate::models::{Location, Reading, WaterParameters};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 预警级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
    /// 设备维护（低电量）
    Maintenance,
    /// 技术故障（离线）
    Technical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
            AlertSeverity::Maintenance => "maintenance",
            AlertSeverity::Technical => "technical",
        }
    }

    /// 一批预警的汇总级别：存在 critical 即为 critical，否则为 warning
    pub fn aggregate(alerts: &[Alert]) -> AlertSeverity {
        if alerts.iter().any(|a| a.severity == AlertSeverity::Critical) {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 预警状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
        }
    }
}

/// 单条预警
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub severity: AlertSeverity,
    /// 参数名（水质参数名，或 battery / connectivity）
    pub parameter: String,
    pub value: f64,
    pub message: String,
    pub action: String,
}

/// 预警记录（一次读数产生的一批预警）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: Uuid,
    pub sensor_id: String,
    pub location: Location,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub alerts: Vec<Alert>,
    pub readings: WaterParameters,
    pub created_at: DateTime<Utc>,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl AlertRecord {
    /// 由读数和非空预警列表构建记录
    pub fn from_reading(reading: &Reading, alerts: Vec<Alert>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sensor_id: reading.sensor_id.clone(),
            location: reading.location.clone(),
            severity: AlertSeverity::aggregate(&alerts),
            status: AlertStatus::Active,
            alerts,
            readings: reading.parameters,
            created_at: reading.timestamp,
            acknowledged_by: None,
            acknowledged_at: None,
        }
    }
}

//! 传感器模型

use serde::{Deserialize, Serialize};

/// 传感器运行状态
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    #[default]
    Online,
    Offline,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Online => "online",
            SensorStatus::Offline => "offline",
        }
    }
}

/// 传感器安装位置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub village: String,
    pub district: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// 传感器实体
///
/// 进程启动时由静态配置创建，每次生成读数时原地更新电量、信号与状态。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    pub name: String,
    pub location: Location,
    pub status: SensorStatus,
    /// 电量 [0, 100]
    pub battery_level: f64,
    /// 信号强度 [0, 100]
    pub signal_strength: f64,
}

impl Sensor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: Location) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location,
            status: SensorStatus::Online,
            battery_level: 100.0,
            signal_strength: 100.0,
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == SensorStatus::Online
    }
}

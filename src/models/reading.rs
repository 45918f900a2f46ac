//! 水质读数模型

use crate::models::{Location, SensorStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 监测参数（声明顺序即评估顺序）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Ph,
    Turbidity,
    Tds,
    Ecoli,
    Temperature,
    FlowRate,
    DissolvedOxygen,
}

impl Parameter {
    pub const ALL: [Parameter; 7] = [
        Parameter::Ph,
        Parameter::Turbidity,
        Parameter::Tds,
        Parameter::Ecoli,
        Parameter::Temperature,
        Parameter::FlowRate,
        Parameter::DissolvedOxygen,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Ph => "ph",
            Parameter::Turbidity => "turbidity",
            Parameter::Tds => "tds",
            Parameter::Ecoli => "ecoli",
            Parameter::Temperature => "temperature",
            Parameter::FlowRate => "flow_rate",
            Parameter::DissolvedOxygen => "dissolved_oxygen",
        }
    }

    /// 展示名称
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Turbidity => "浊度",
            Parameter::Tds => "溶解性总固体",
            Parameter::Ecoli => "大肠杆菌",
            Parameter::Temperature => "水温",
            Parameter::FlowRate => "流量",
            Parameter::DissolvedOxygen => "溶解氧",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Ph => "",
            Parameter::Turbidity => " NTU",
            Parameter::Tds => " mg/L",
            Parameter::Ecoli => " CFU/100mL",
            Parameter::Temperature => "°C",
            Parameter::FlowRate => " L/min",
            Parameter::DissolvedOxygen => " mg/L",
        }
    }

    /// 是否按整数取值
    pub fn is_integral(&self) -> bool {
        matches!(self, Parameter::Ecoli | Parameter::Tds)
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 一次采样的全部水质参数
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct WaterParameters {
    pub ph: f64,
    pub turbidity: f64,
    pub tds: f64,
    pub ecoli: f64,
    pub temperature: f64,
    pub flow_rate: f64,
    pub dissolved_oxygen: f64,
}

impl WaterParameters {
    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Ph => self.ph,
            Parameter::Turbidity => self.turbidity,
            Parameter::Tds => self.tds,
            Parameter::Ecoli => self.ecoli,
            Parameter::Temperature => self.temperature,
            Parameter::FlowRate => self.flow_rate,
            Parameter::DissolvedOxygen => self.dissolved_oxygen,
        }
    }

    pub fn set(&mut self, parameter: Parameter, value: f64) {
        let slot = match parameter {
            Parameter::Ph => &mut self.ph,
            Parameter::Turbidity => &mut self.turbidity,
            Parameter::Tds => &mut self.tds,
            Parameter::Ecoli => &mut self.ecoli,
            Parameter::Temperature => &mut self.temperature,
            Parameter::FlowRate => &mut self.flow_rate,
            Parameter::DissolvedOxygen => &mut self.dissolved_oxygen,
        };
        *slot = value;
    }

    /// 按声明顺序迭代 (参数, 数值)
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        Parameter::ALL.iter().map(move |p| (*p, self.get(*p)))
    }
}

/// 异常注入类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyProfile {
    /// 污染：大肠杆菌、浊度飙升，pH 下降
    Contamination,
    /// 设备故障：pH 极端，电量与信号崩溃
    EquipmentMalfunction,
    /// 季节性极端：水温与 TDS 升高
    SeasonalExtreme,
}

impl AnomalyProfile {
    pub const ALL: [AnomalyProfile; 3] = [
        AnomalyProfile::Contamination,
        AnomalyProfile::EquipmentMalfunction,
        AnomalyProfile::SeasonalExtreme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyProfile::Contamination => "contamination",
            AnomalyProfile::EquipmentMalfunction => "equipment_malfunction",
            AnomalyProfile::SeasonalExtreme => "seasonal_extreme",
        }
    }
}

/// 传感器读数（只追加，不可变）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    pub location: Location,
    pub parameters: WaterParameters,
    pub battery_level: f64,
    pub signal_strength: f64,
    pub status: SensorStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<AnomalyProfile>,
}

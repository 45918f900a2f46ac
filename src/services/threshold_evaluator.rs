//! 阈值评估服务
//!
//! 纯函数：同一读数与同一阈值表总是得到相同的预警列表与顺序。
//! 水质参数按声明顺序评估（critical 优先于 warning），随后检查电量与连接状态。

use crate::models::{Alert, AlertSeverity, BandTable, Parameter, Range, Reading, SensorStatus};
use std::sync::Arc;

/// 低于该电量触发维护预警
pub const LOW_BATTERY_THRESHOLD: f64 = 20.0;

/// 越界方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Low,
    High,
}

impl Direction {
    fn of(range: &Range, value: f64) -> Self {
        if value < range.min { Direction::Low } else { Direction::High }
    }

    fn label(&self) -> &'static str {
        match self {
            Direction::Low => "偏低",
            Direction::High => "偏高",
        }
    }
}

/// 阈值评估器
pub struct ThresholdEvaluator {
    bands: Arc<BandTable>,
}

impl ThresholdEvaluator {
    pub fn new(bands: Arc<BandTable>) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &BandTable {
        &self.bands
    }

    /// 评估一条读数
    pub fn evaluate(&self, reading: &Reading) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = reading
            .parameters
            .iter()
            .filter_map(|(parameter, value)| self.evaluate_parameter(parameter, value))
            .collect();

        if reading.battery_level < LOW_BATTERY_THRESHOLD {
            alerts.push(Alert {
                severity: AlertSeverity::Maintenance,
                parameter: "battery".to_string(),
                value: reading.battery_level,
                message: format!("传感器电量低: {:.0}%", reading.battery_level),
                action: "安排现场维护，更换或充电电池".to_string(),
            });
        }

        if reading.status == SensorStatus::Offline {
            alerts.push(Alert {
                severity: AlertSeverity::Technical,
                parameter: "connectivity".to_string(),
                value: reading.signal_strength,
                message: "传感器已离线".to_string(),
                action: "检查供电与通信链路，必要时派人现场排查".to_string(),
            });
        }

        alerts
    }

    fn evaluate_parameter(&self, parameter: Parameter, value: f64) -> Option<Alert> {
        let band = self.bands.get(parameter);

        let (severity, range, tier) = if band.critical.is_violated_by(value) {
            (AlertSeverity::Critical, &band.critical, "严重")
        } else if band.warning.is_violated_by(value) {
            (AlertSeverity::Warning, &band.warning, "")
        } else {
            return None;
        };

        let direction = Direction::of(range, value);
        let message = format!(
            "{}{}{}: {}{}（允许范围 {}–{}）",
            parameter.label(),
            tier,
            direction.label(),
            format_value(parameter, value),
            parameter.unit(),
            format_value(parameter, range.min),
            format_value(parameter, range.max),
        );

        Some(Alert {
            severity,
            parameter: parameter.name().to_string(),
            value,
            message,
            action: recommended_action(parameter, direction, severity).to_string(),
        })
    }
}

fn format_value(parameter: Parameter, value: f64) -> String {
    if parameter.is_integral() {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// 建议处置措施
fn recommended_action(parameter: Parameter, direction: Direction, severity: AlertSeverity) -> &'static str {
    let critical = severity == AlertSeverity::Critical;
    match (parameter, direction) {
        (Parameter::Ph, Direction::High) if critical => "立即停止供水，排查碱性污染源",
        (Parameter::Ph, Direction::Low) if critical => "立即停止供水，排查酸性污染源",
        (Parameter::Ph, _) => "复测 pH 并检查投药设备",
        (Parameter::Turbidity, _) if critical => "停止供水，检查过滤设施并冲洗管网",
        (Parameter::Turbidity, _) => "加强过滤与沉淀处理",
        (Parameter::Tds, _) if critical => "暂停饮用，送检并启用备用水源",
        (Parameter::Tds, _) => "安排水样送检，关注矿物质含量变化",
        (Parameter::Ecoli, _) if critical => "立即发布煮沸饮用通知并加氯消毒",
        (Parameter::Ecoli, _) => "加强消毒，排查污水渗漏",
        (Parameter::Temperature, _) => "检查水源遮阳与储水设施",
        (Parameter::FlowRate, Direction::Low) => "检查水泵与管道堵塞",
        (Parameter::FlowRate, Direction::High) => "检查管道泄漏与阀门状态",
        (Parameter::DissolvedOxygen, Direction::Low) => "检查水体富营养化，必要时曝气",
        (Parameter::DissolvedOxygen, Direction::High) => "复核溶解氧探头校准",
    }
}

//! 参数阈值分级模型

use crate::errors::AppError;
use crate::models::Parameter;
use serde::{Deserialize, Serialize};

/// 正常区间（含最佳值）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NormalRange {
    pub min: f64,
    pub max: f64,
    pub optimal: f64,
}

/// 闭区间
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// 数值是否越出区间；非有限值总是越界
    pub fn is_violated_by(&self, value: f64) -> bool {
        !value.is_finite() || value < self.min || value > self.max
    }
}

/// 单个参数的三级阈值：normal ⊆ warning ⊆ critical
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ParameterBand {
    pub normal: NormalRange,
    pub warning: Range,
    pub critical: Range,
}

impl ParameterBand {
    pub const fn new(normal: (f64, f64, f64), warning: (f64, f64), critical: (f64, f64)) -> Self {
        Self {
            normal: NormalRange {
                min: normal.0,
                max: normal.1,
                optimal: normal.2,
            },
            warning: Range::new(warning.0, warning.1),
            critical: Range::new(critical.0, critical.1),
        }
    }

    /// 生成值的钳制区间 [0.8·min, 1.2·max]
    pub fn clamp_bounds(&self) -> (f64, f64) {
        (self.normal.min * 0.8, self.normal.max * 1.2)
    }

    /// 校验分级嵌套关系
    pub fn validate(&self, parameter: Parameter) -> Result<(), AppError> {
        let n = &self.normal;
        let w = &self.warning;
        let c = &self.critical;

        let all = [n.min, n.max, n.optimal, w.min, w.max, c.min, c.max];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(AppError::SchedulerFatal(format!(
                "参数 {} 的阈值包含非有限数值",
                parameter
            )));
        }

        let ordered = c.min <= w.min
            && w.min <= n.min
            && n.min < n.max
            && n.max <= w.max
            && w.max <= c.max;
        if !ordered {
            return Err(AppError::SchedulerFatal(format!(
                "参数 {} 的阈值分级不满足 critical ⊇ warning ⊇ normal: {:?}",
                parameter, self
            )));
        }

        if n.optimal < n.min || n.optimal > n.max {
            return Err(AppError::SchedulerFatal(format!(
                "参数 {} 的最佳值 {} 不在正常区间内",
                parameter, n.optimal
            )));
        }

        Ok(())
    }
}

/// 全部参数的阈值表，进程生命周期内不可变
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BandTable {
    pub ph: ParameterBand,
    pub turbidity: ParameterBand,
    pub tds: ParameterBand,
    pub ecoli: ParameterBand,
    pub temperature: ParameterBand,
    pub flow_rate: ParameterBand,
    pub dissolved_oxygen: ParameterBand,
}

impl Default for BandTable {
    fn default() -> Self {
        Self {
            ph: ParameterBand::new((6.5, 8.5, 7.2), (6.5, 8.5), (6.0, 9.0)),
            turbidity: ParameterBand::new((0.5, 5.0, 1.5), (0.0, 5.0), (0.0, 10.0)),
            tds: ParameterBand::new((50.0, 500.0, 200.0), (30.0, 600.0), (0.0, 1000.0)),
            ecoli: ParameterBand::new((0.0, 10.0, 1.0), (0.0, 10.0), (0.0, 50.0)),
            temperature: ParameterBand::new((15.0, 30.0, 22.0), (10.0, 32.0), (5.0, 38.0)),
            flow_rate: ParameterBand::new((10.0, 100.0, 50.0), (5.0, 110.0), (0.0, 150.0)),
            dissolved_oxygen: ParameterBand::new((5.0, 12.0, 8.0), (4.0, 14.0), (2.0, 16.0)),
        }
    }
}

impl BandTable {
    pub fn get(&self, parameter: Parameter) -> &ParameterBand {
        match parameter {
            Parameter::Ph => &self.ph,
            Parameter::Turbidity => &self.turbidity,
            Parameter::Tds => &self.tds,
            Parameter::Ecoli => &self.ecoli,
            Parameter::Temperature => &self.temperature,
            Parameter::FlowRate => &self.flow_rate,
            Parameter::DissolvedOxygen => &self.dissolved_oxygen,
        }
    }

    /// 校验全部参数
    pub fn validate(&self) -> Result<(), AppError> {
        Parameter::ALL
            .iter()
            .try_for_each(|p| self.get(*p).validate(*p))
    }
}

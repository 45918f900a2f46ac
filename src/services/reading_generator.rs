//! 水质读数生成服务
//!
//! 每个 tick 为每个传感器合成一条读数：以各参数最佳值为中心，叠加季节与
//! 昼夜偏置和均匀噪声，并以较低概率注入异常或离线。随机源由调用方显式传入，
//! 相同种子产生相同序列。

use crate::errors::AppError;
use crate::models::{AnomalyProfile, BandTable, Parameter, Reading, Sensor, SensorStatus, WaterParameters};
use crate::utils::{local_month_hour, round2};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rand::Rng;
use std::sync::Arc;

/// 电量低于该值时视为已更换电池
const BATTERY_SWAP_LEVEL: f64 = 5.0;
/// 每个 tick 的最大耗电量
const MAX_DRAIN_PER_TICK: f64 = 0.5;
/// 每个 tick 的最大信号波动
const MAX_SIGNAL_DRIFT: f64 = 5.0;

/// 生成器配置
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub anomaly_probability: f64,
    pub offline_probability: f64,
    pub timezone: Tz,
}

impl GeneratorConfig {
    pub fn new(anomaly_probability: f64, offline_probability: f64, timezone: Tz) -> Self {
        Self {
            anomaly_probability: sanitize_probability(anomaly_probability),
            offline_probability: sanitize_probability(offline_probability),
            timezone,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(0.05, 0.02, chrono_tz::Asia::Kolkata)
    }
}

fn sanitize_probability(p: f64) -> f64 {
    if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
}

/// 读数生成器
pub struct ReadingGenerator {
    bands: Arc<BandTable>,
    config: GeneratorConfig,
}

impl ReadingGenerator {
    pub fn new(bands: Arc<BandTable>, config: GeneratorConfig) -> Self {
        Self { bands, config }
    }

    pub fn bands(&self) -> &BandTable {
        &self.bands
    }

    /// 季节因子：季风期污染风险最高，冬季最低
    pub fn seasonal_factor(month: u32) -> f64 {
        match month {
            6..=9 => 0.8,
            10 | 11 => 0.3,
            3..=5 => 0.4,
            _ => -0.2,
        }
    }

    /// 昼夜因子：清晨水质较好，午后较差
    pub fn daily_factor(hour: u32) -> f64 {
        match hour {
            5..=9 => -0.1,
            12..=16 => 0.2,
            17..=20 => 0.1,
            _ => 0.0,
        }
    }

    /// 为传感器生成一条读数，并原地更新传感器的电量、信号与状态
    pub fn generate<R: Rng>(
        &self,
        sensor: &mut Sensor,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Reading, AppError> {
        let (month, hour) = local_month_hour(now, self.config.timezone);
        let seasonal = Self::seasonal_factor(month);
        let daily = Self::daily_factor(hour);

        let mut parameters = WaterParameters::default();
        for parameter in Parameter::ALL {
            let value = self.baseline_value(parameter, seasonal, daily, rng);
            parameters.set(parameter, value);
        }

        self.drift_device(sensor, rng);

        let mut anomaly = None;
        if rng.gen_bool(self.config.anomaly_probability) {
            let profile = AnomalyProfile::ALL[rng.gen_range(0..AnomalyProfile::ALL.len())];
            self.apply_anomaly(profile, &mut parameters, sensor, rng);
            anomaly = Some(profile);
        }

        if rng.gen_bool(self.config.offline_probability) {
            sensor.status = SensorStatus::Offline;
            sensor.battery_level = 0.0;
        } else {
            sensor.status = SensorStatus::Online;
        }

        let reading = Reading {
            sensor_id: sensor.id.clone(),
            timestamp: now,
            location: sensor.location.clone(),
            parameters,
            battery_level: sensor.battery_level,
            signal_strength: sensor.signal_strength,
            status: sensor.status,
            anomaly,
        };

        ensure_finite(&reading)?;

        Ok(reading)
    }

    /// 常规取值：最佳值 + 季节偏置 + 昼夜偏置 + 噪声，钳制并按精度取整
    fn baseline_value<R: Rng>(&self, parameter: Parameter, seasonal: f64, daily: f64, rng: &mut R) -> f64 {
        let band = self.bands.get(parameter);
        let normal = &band.normal;

        let span = ((normal.max - normal.min) * 0.05).abs();
        let noise = if span.is_finite() && span > 0.0 {
            rng.gen_range(-span..=span)
        } else {
            0.0
        };

        let raw = normal.optimal
            + normal.optimal * seasonal * 0.1
            + normal.optimal * daily * 0.05
            + noise;

        let (a, b) = band.clamp_bounds();
        let (lo, hi) = (a.min(b), a.max(b));
        quantize(raw.clamp(lo, hi), parameter.is_integral(), lo, hi)
    }

    /// 电量缓慢消耗，过低时视为换电；信号随机波动
    fn drift_device<R: Rng>(&self, sensor: &mut Sensor, rng: &mut R) {
        sensor.battery_level = if sensor.battery_level < BATTERY_SWAP_LEVEL {
            100.0
        } else {
            round2((sensor.battery_level - rng.gen_range(0.0..=MAX_DRAIN_PER_TICK)).max(0.0))
        };

        let drift = rng.gen_range(-MAX_SIGNAL_DRIFT..=MAX_SIGNAL_DRIFT);
        sensor.signal_strength = round2((sensor.signal_strength + drift).clamp(0.0, 100.0));
    }

    fn apply_anomaly<R: Rng>(
        &self,
        profile: AnomalyProfile,
        parameters: &mut WaterParameters,
        sensor: &mut Sensor,
        rng: &mut R,
    ) {
        let bands = &self.bands;
        match profile {
            AnomalyProfile::Contamination => {
                let ecoli = &bands.ecoli.critical;
                let turbidity = &bands.turbidity.critical;
                let ph = &bands.ph.critical;
                parameters.ecoli = uniform(rng, ecoli.max * 1.2, ecoli.max * 3.0).round();
                parameters.turbidity = round2(uniform(rng, turbidity.max * 1.1, turbidity.max * 2.0));
                parameters.ph = round2(uniform(rng, ph.min * 0.85, ph.min * 0.98));
            }
            AnomalyProfile::EquipmentMalfunction => {
                parameters.ph = if rng.gen_bool(0.5) {
                    round2(uniform(rng, 2.0, 4.0))
                } else {
                    round2(uniform(rng, 10.5, 12.5))
                };
                sensor.battery_level = round2(uniform(rng, 0.0, 10.0));
                sensor.signal_strength = round2(uniform(rng, 0.0, 15.0));
            }
            AnomalyProfile::SeasonalExtreme => {
                let temperature = &bands.temperature;
                let tds = &bands.tds;
                parameters.temperature = round2(uniform(
                    rng,
                    temperature.warning.max,
                    temperature.critical.max * 1.1,
                ));
                parameters.tds = uniform(rng, tds.warning.max, tds.critical.max * 1.1).round();
            }
        }
    }
}

/// 区间端点无序时也能取样
fn uniform<R: Rng>(rng: &mut R, a: f64, b: f64) -> f64 {
    let (lo, hi) = (a.min(b), a.max(b));
    if lo == hi || !lo.is_finite() || !hi.is_finite() {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

/// 按参数精度取整，且保证结果不越出 [lo, hi]
fn quantize(value: f64, integral: bool, lo: f64, hi: f64) -> f64 {
    let scale = if integral { 1.0 } else { 100.0 };
    let q = (value * scale).round();
    // 吸收 `10.2 * 100.0 = 1019.999…` 这类表示误差
    let q_lo = (lo * scale - 1e-6).ceil();
    let q_hi = (hi * scale + 1e-6).floor();
    if q_lo <= q_hi {
        q.clamp(q_lo, q_hi) / scale
    } else {
        q / scale
    }
}

fn ensure_finite(reading: &Reading) -> Result<(), AppError> {
    if let Some((parameter, value)) = reading.parameters.iter().find(|(_, v)| !v.is_finite()) {
        return Err(AppError::Generation(format!(
            "传感器 {} 参数 {} 取值非法: {}",
            reading.sensor_id, parameter, value
        )));
    }
    if !reading.battery_level.is_finite() || !reading.signal_strength.is_finite() {
        return Err(AppError::Generation(format!(
            "传感器 {} 电量或信号取值非法",
            reading.sensor_id
        )));
    }
    Ok(())
}

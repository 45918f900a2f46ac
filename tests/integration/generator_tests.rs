//! ReadingGenerator 性质测试：钳制范围与取整精度

use crate::helpers::test_sensor;
use chrono::{Duration, TimeZone, Utc};
use hydrowatch::models::{BandTable, Parameter, SensorStatus};
use hydrowatch::services::{GeneratorConfig, ReadingGenerator};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

fn quiet_generator() -> ReadingGenerator {
    ReadingGenerator::new(
        Arc::new(BandTable::default()),
        GeneratorConfig::new(0.0, 0.0, chrono_tz::Asia::Kolkata),
    )
}

fn has_two_decimals(value: f64) -> bool {
    ((value * 100.0).round() / 100.0 - value).abs() < 1e-9
}

#[test]
fn test_values_stay_within_clamp_bounds_and_precision() {
    let generator = quiet_generator();
    let bands = BandTable::default();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    for seed in 0..50u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sensor = test_sensor("S1");

        // 覆盖全年每个月与每天不同时段
        for step in 0..48 {
            let now = start + Duration::hours(step * 183 + seed as i64);
            let reading = generator
                .generate(&mut sensor, now, &mut rng)
                .expect("默认阈值下生成不应失败");

            assert_eq!(reading.status, SensorStatus::Online);
            assert!(reading.anomaly.is_none());

            for (parameter, value) in reading.parameters.iter() {
                let (lo, hi) = bands.get(parameter).clamp_bounds();
                assert!(
                    value >= lo && value <= hi,
                    "{} = {} 超出 [{}, {}]（seed {}）",
                    parameter,
                    value,
                    lo,
                    hi,
                    seed
                );

                if matches!(parameter, Parameter::Ecoli | Parameter::Tds) {
                    assert_eq!(value.fract(), 0.0, "{} = {} 应为整数", parameter, value);
                } else {
                    assert!(has_two_decimals(value), "{} = {} 应保留两位小数", parameter, value);
                }
            }

            assert!((0.0..=100.0).contains(&reading.battery_level));
            assert!((0.0..=100.0).contains(&reading.signal_strength));
        }
    }
}

#[test]
fn test_forced_anomalies_are_tagged() {
    let generator = ReadingGenerator::new(
        Arc::new(BandTable::default()),
        GeneratorConfig::new(1.0, 0.0, chrono_tz::Asia::Kolkata),
    );
    let mut rng = StdRng::seed_from_u64(7);
    let mut sensor = test_sensor("S1");
    let now = Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap();

    for _ in 0..30 {
        let reading = generator.generate(&mut sensor, now, &mut rng).unwrap();
        assert!(reading.anomaly.is_some());
        assert!(reading.parameters.iter().all(|(_, v)| v.is_finite()));
    }
}

#[test]
fn test_offline_reading_mirrors_status_and_zero_battery() {
    let generator = ReadingGenerator::new(
        Arc::new(BandTable::default()),
        GeneratorConfig::new(0.0, 1.0, chrono_tz::Asia::Kolkata),
    );
    let mut rng = StdRng::seed_from_u64(11);
    let mut sensor = test_sensor("S1");

    let reading = generator.generate(&mut sensor, Utc::now(), &mut rng).unwrap();

    assert_eq!(reading.status, SensorStatus::Offline);
    assert_eq!(reading.battery_level, 0.0);
    assert_eq!(sensor.status, SensorStatus::Offline);
    assert_eq!(sensor.battery_level, 0.0);
}

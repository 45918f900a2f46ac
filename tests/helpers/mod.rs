//! 测试辅助工具

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use config::{Config, File, FileFormat};
use hydrowatch::config::Settings;
use hydrowatch::models::{
    AlertSubscription, Location, Reading, Recipient, Sensor, SensorStatus, VerificationStatus,
    WaterParameters,
};

/// 固定时间（IST 2024-01-15 10:30），季节与昼夜因子都为确定值
pub fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 5, 0, 0).unwrap()
}

pub fn test_location() -> Location {
    Location {
        village: "Rampur".to_string(),
        district: "Varanasi".to_string(),
        latitude: Some(25.3176),
        longitude: Some(82.9739),
    }
}

pub fn test_sensor(id: &str) -> Sensor {
    Sensor::new(id, format!("{} 水井", id), test_location())
}

/// 全部参数处于最佳值的读数
pub fn normal_reading(sensor_id: &str) -> Reading {
    Reading {
        sensor_id: sensor_id.to_string(),
        timestamp: fixed_now(),
        location: test_location(),
        parameters: WaterParameters {
            ph: 7.2,
            turbidity: 1.5,
            tds: 200.0,
            ecoli: 2.0,
            temperature: 22.0,
            flow_rate: 50.0,
            dissolved_oxygen: 8.0,
        },
        battery_level: 90.0,
        signal_strength: 80.0,
        status: SensorStatus::Online,
        anomaly: None,
    }
}

pub fn recipient(
    email: &str,
    role: &str,
    district: Option<&str>,
    subscriptions: Vec<AlertSubscription>,
    verification_status: VerificationStatus,
) -> Recipient {
    Recipient {
        id: format!("r-{}", email),
        name: email.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        subscriptions,
        district: district.map(str::to_string),
        verification_status,
        active: true,
    }
}

/// 常用的通知对象目录
pub fn directory() -> Vec<Recipient> {
    vec![
        recipient(
            "jal.officer@varanasi.gov.in",
            "official",
            Some("Varanasi"),
            vec![AlertSubscription::WaterQuality, AlertSubscription::CriticalAlerts],
            VerificationStatus::Approved,
        ),
        recipient(
            "health@prayagraj.gov.in",
            "government",
            Some("Prayagraj"),
            vec![AlertSubscription::CriticalAlerts],
            VerificationStatus::Pending,
        ),
        recipient(
            "panchayat@mirzapur.gov.in",
            "official",
            Some("Mirzapur"),
            vec![AlertSubscription::WaterQuality],
            VerificationStatus::Pending,
        ),
    ]
}

pub const EMERGENCY_CC: &str = "emergency@jalshakti.gov.in";
pub const FALLBACK: &str = "duty-officer@jalshakti.gov.in";

/// 测试用配置：无异常注入、无离线，结果只由传感器初始状态决定
pub fn test_settings(extra: &str) -> Settings {
    let toml = format!(
        r#"
        [server]
        host = "127.0.0.1"
        port = 0
        workers = 1

        [logging]
        level = "warn"
        format = "pretty"

        [simulation]
        tick_interval_seconds = 10
        seed = 42
        anomaly_probability = 0.0
        offline_probability = 0.0

        [notification]
        batch_timeout_seconds = 2
        emergency_contacts = ["{cc}"]
        fallback_recipients = ["{fallback}"]

        [[sensors]]
        id = "S1"
        name = "村口水井"
        village = "Rampur"
        district = "Varanasi"

        [[sensors]]
        id = "S2"
        name = "水塔"
        village = "Chunar"
        district = "Mirzapur"

        {extra}
        "#,
        cc = EMERGENCY_CC,
        fallback = FALLBACK,
        extra = extra,
    );

    Config::builder()
        .add_source(File::from_str(&toml, FileFormat::Toml))
        .build()
        .and_then(|c| c.try_deserialize())
        .expect("测试配置应能解析")
}

/// 断言结果是成功的
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// 断言结果是错误的
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(e) => e,
        }
    };
}

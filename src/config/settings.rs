//! 应用配置加载和管理

use crate::models::{BandTable, Location, Recipient, Sensor};
use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// 应用配置结构
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    #[serde(default)]
    pub smtp: SmtpSettings,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub notification: NotificationSettings,
    #[serde(default)]
    pub sensors: Vec<SensorSettings>,
    #[serde(default)]
    pub directory: DirectorySettings,
    #[serde(default)]
    pub bands: BandTable,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 未启用时使用进程内存储
    #[serde(default)]
    pub enabled: bool,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub require_ssl: bool,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_seconds: 5,
            idle_timeout_seconds: 300,
            require_ssl: false,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    /// `pretty` 或 `json`
    pub format: String,
}

/// SMTP 邮件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    /// 是否启用 SMTP，未启用时通知只写入日志
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_true")]
    pub tls: bool,
    #[serde(default)]
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            tls: true,
            from_email: String::new(),
            from_name: default_from_name(),
        }
    }
}

fn default_smtp_host() -> String { "smtp.example.com".to_string() }
fn default_smtp_port() -> u16 { 587 }
fn default_from_name() -> String { "HydroWatch".to_string() }
fn default_true() -> bool { true }

/// 模拟调度配置
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSettings {
    /// tick 周期（秒）
    #[serde(default = "default_tick_interval")]
    pub tick_interval_seconds: u64,
    /// 随机种子，未设置时使用系统熵
    #[serde(default)]
    pub seed: Option<u64>,
    /// 计算季节/昼夜因子使用的时区
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_anomaly_probability")]
    pub anomaly_probability: f64,
    #[serde(default = "default_offline_probability")]
    pub offline_probability: f64,
    /// 服务启动后是否自动开始模拟
    #[serde(default)]
    pub autostart: bool,
    #[serde(default = "default_reading_buffer")]
    pub reading_buffer_capacity: usize,
    #[serde(default = "default_alert_buffer")]
    pub alert_buffer_capacity: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_interval_seconds: default_tick_interval(),
            seed: None,
            timezone: default_timezone(),
            anomaly_probability: default_anomaly_probability(),
            offline_probability: default_offline_probability(),
            autostart: false,
            reading_buffer_capacity: default_reading_buffer(),
            alert_buffer_capacity: default_alert_buffer(),
        }
    }
}

fn default_tick_interval() -> u64 { 30 }
fn default_timezone() -> String { "Asia/Kolkata".to_string() }
fn default_anomaly_probability() -> f64 { 0.05 }
fn default_offline_probability() -> f64 { 0.02 }
fn default_reading_buffer() -> usize { 100 }
fn default_alert_buffer() -> usize { 50 }

impl SimulationSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds.max(1))
    }

    /// 解析时区，非法值回落到 UTC
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(timezone = %self.timezone, "时区无效，使用 UTC");
            chrono_tz::UTC
        })
    }
}

/// 通知配置
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    /// 每个批次的最长等待时间（秒）
    #[serde(default = "default_batch_timeout")]
    pub batch_timeout_seconds: u64,
    /// 每次 critical 发送都抄送的应急地址
    #[serde(default)]
    pub emergency_contacts: Vec<String>,
    /// 通知对象查询失败或为空时使用的名单
    #[serde(default)]
    pub fallback_recipients: Vec<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            batch_timeout_seconds: default_batch_timeout(),
            emergency_contacts: Vec::new(),
            fallback_recipients: Vec::new(),
        }
    }
}

fn default_batch_timeout() -> u64 { 15 }

impl NotificationSettings {
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_seconds.max(1))
    }

    pub fn fallback_list(&self) -> Vec<Recipient> {
        self.fallback_recipients
            .iter()
            .map(Recipient::emergency_contact)
            .collect()
    }
}

/// 静态传感器配置
#[derive(Debug, Clone, Deserialize)]
pub struct SensorSettings {
    pub id: String,
    pub name: String,
    pub village: String,
    pub district: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_full")]
    pub battery_level: f64,
    #[serde(default = "default_full")]
    pub signal_strength: f64,
}

fn default_full() -> f64 { 100.0 }

impl SensorSettings {
    pub fn to_sensor(&self) -> Sensor {
        let mut sensor = Sensor::new(
            self.id.clone(),
            self.name.clone(),
            Location {
                village: self.village.clone(),
                district: self.district.clone(),
                latitude: self.latitude,
                longitude: self.longitude,
            },
        );
        sensor.battery_level = self.battery_level.clamp(0.0, 100.0);
        sensor.signal_strength = self.signal_strength.clamp(0.0, 100.0);
        sensor
    }
}

/// 进程内通知对象目录（未启用数据库时使用）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectorySettings {
    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

impl Settings {
    /// 从配置文件和环境变量加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let settings = Config::builder()
            // 加载默认配置
            .add_source(File::with_name("config/development"))
            // 根据环境加载对应配置
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // 环境变量覆盖，前缀 HYDROWATCH，分隔符 __
            .add_source(
                Environment::with_prefix("HYDROWATCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// 获取数据库连接 URL（从环境变量）
    pub fn database_url() -> Option<SecretString> {
        env::var("DATABASE_URL").ok().map(SecretString::new)
    }

    /// 获取 SMTP 密码（从环境变量）
    pub fn smtp_password() -> Option<SecretString> {
        env::var("SMTP_PASSWORD").ok().map(SecretString::new)
    }

    /// 获取服务器地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn build_sensors(&self) -> Vec<Sensor> {
        self.sensors.iter().map(SensorSettings::to_sensor).collect()
    }
}

//! 配置管理模块

mod settings;

pub use settings::{
	Settings,
	ServerSettings,
	DatabaseSettings,
	LoggingSettings,
	SmtpSettings,
	SimulationSettings,
	NotificationSettings,
	SensorSettings,
	DirectorySettings,
};

//! HydroWatch - 农村供水水质遥测模拟与预警服务
//!
//! 周期性生成各监测点的水质读数，按多级阈值评估，
//! 解析通知对象并分发预警：
//! - 读数生成（季节/昼夜因子、异常注入、离线模拟）
//! - 多级阈值评估
//! - 通知对象解析与应急名单兜底
//! - 分级通知分发

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

pub use errors::AppError;

//! HTTP 处理器模块

mod health_handler;
mod simulation_handler;
mod telemetry_handler;

pub use health_handler::*;
pub use simulation_handler::*;
pub use telemetry_handler::*;

//! 数据模型模块

mod alert;
mod band;
mod common;
mod notification;
mod reading;
mod recipient;
mod sensor;
mod simulation;

pub use alert::*;
pub use band::*;
pub use common::*;
pub use notification::*;
pub use reading::*;
pub use recipient::*;
pub use sensor::*;
pub use simulation::*;

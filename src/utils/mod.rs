//! 工具函数模块

mod time;

pub use time::*;

//! 通知分发模型

use serde::Serialize;

/// 分发结果统计
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_addresses: Vec<String>,
}

impl DispatchReport {
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, address: &str) {
        self.attempted += 1;
        self.failed += 1;
        self.failed_addresses.push(address.to_string());
    }

    pub fn merge(&mut self, other: DispatchReport) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.failed_addresses.extend(other.failed_addresses);
    }
}

/// 渲染后的通知内容（每个级别批次一份）
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationPayload {
    pub subject: String,
    pub body: String,
}

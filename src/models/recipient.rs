//! 通知对象模型

use crate::models::AlertSeverity;
use serde::{Deserialize, Serialize};

/// 预警订阅类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertSubscription {
    WaterQuality,
    CriticalAlerts,
    Maintenance,
    #[serde(other)]
    Other,
}

impl AlertSubscription {
    /// 由预警级别推导订阅类型
    pub fn for_severity(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Critical => AlertSubscription::CriticalAlerts,
            _ => AlertSubscription::WaterQuality,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSubscription::WaterQuality => "water_quality",
            AlertSubscription::CriticalAlerts => "critical_alerts",
            AlertSubscription::Maintenance => "maintenance",
            AlertSubscription::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "water_quality" => AlertSubscription::WaterQuality,
            "critical_alerts" => AlertSubscription::CriticalAlerts,
            "maintenance" => AlertSubscription::Maintenance,
            _ => AlertSubscription::Other,
        }
    }
}

/// 审核状态
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "approved" => VerificationStatus::Approved,
            "rejected" => VerificationStatus::Rejected,
            _ => VerificationStatus::Pending,
        }
    }
}

/// 通知对象
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub subscriptions: Vec<AlertSubscription>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool { true }

impl Recipient {
    /// 仅有地址的应急联系人
    pub fn emergency_contact(email: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            id: format!("emergency:{}", email),
            name: "应急联系人".to_string(),
            email,
            role: "emergency".to_string(),
            subscriptions: vec![AlertSubscription::CriticalAlerts, AlertSubscription::WaterQuality],
            district: None,
            verification_status: VerificationStatus::Approved,
            active: true,
        }
    }

    /// 用于去重的规范化邮箱
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    pub fn is_subscribed_to(&self, subscription: &AlertSubscription) -> bool {
        self.subscriptions.contains(subscription)
    }
}

/// 通知对象查询条件（多条件取并集由解析器完成）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientQuery {
    Role(String),
    Verification(VerificationStatus),
}

impl std::fmt::Display for RecipientQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipientQuery::Role(role) => write!(f, "role={}", role),
            RecipientQuery::Verification(status) => write!(f, "verification_status={}", status.as_str()),
        }
    }
}

impl RecipientQuery {
    /// 内存目录中的匹配判断
    pub fn matches(&self, recipient: &Recipient) -> bool {
        match self {
            RecipientQuery::Role(role) => recipient.role.eq_ignore_ascii_case(role),
            RecipientQuery::Verification(status) => recipient.verification_status == *status,
        }
    }
}

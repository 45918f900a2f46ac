//! NotificationDispatcher 单元测试

use crate::helpers::{normal_reading, recipient, EMERGENCY_CC};
use crate::mocks::MockChannel;
use hydrowatch::models::{
    Alert, AlertRecord, AlertSeverity, Recipient, VerificationStatus,
};
use hydrowatch::services::NotificationDispatcher;
use std::sync::Arc;
use std::time::Duration;

fn alert(severity: AlertSeverity, parameter: &str) -> Alert {
    Alert {
        severity,
        parameter: parameter.to_string(),
        value: 1.0,
        message: format!("{} 越界", parameter),
        action: "复测".to_string(),
    }
}

fn record(alerts: Vec<Alert>) -> AlertRecord {
    AlertRecord::from_reading(&normal_reading("S1"), alerts)
}

fn recipients(emails: &[&str]) -> Vec<Recipient> {
    emails
        .iter()
        .map(|e| recipient(e, "official", None, vec![], VerificationStatus::Approved))
        .collect()
}

fn dispatcher(channel: Arc<MockChannel>) -> NotificationDispatcher {
    NotificationDispatcher::new(
        channel,
        vec![EMERGENCY_CC.to_string()],
        Duration::from_secs(2),
    )
}

#[tokio::test]
async fn test_partial_failure_accounting() {
    let channel = Arc::new(MockChannel::failing_for(&["b@gov.in", "d@gov.in"]));
    let to = recipients(&["a@gov.in", "b@gov.in", "c@gov.in", "d@gov.in", "e@gov.in"]);

    let report = dispatcher(channel.clone())
        .dispatch(&record(vec![alert(AlertSeverity::Warning, "turbidity")]), &to)
        .await;

    assert_eq!(report.attempted, 5);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 2);
    assert_eq!(report.failed_addresses, vec!["b@gov.in", "d@gov.in"]);
    assert_eq!(channel.addresses(), vec!["a@gov.in", "c@gov.in", "e@gov.in"]);
}

#[tokio::test]
async fn test_warning_tier_has_no_emergency_cc() {
    let channel = Arc::new(MockChannel::new());

    dispatcher(channel.clone())
        .dispatch(
            &record(vec![alert(AlertSeverity::Warning, "ph")]),
            &recipients(&["a@gov.in"]),
        )
        .await;

    assert_eq!(channel.addresses(), vec!["a@gov.in"]);
}

#[tokio::test]
async fn test_critical_tier_copies_emergency_contacts_without_dedupe() {
    let channel = Arc::new(MockChannel::new());
    // 应急地址同时也是解析出的通知对象
    let to = recipients(&["a@gov.in", EMERGENCY_CC]);

    let report = dispatcher(channel.clone())
        .dispatch(&record(vec![alert(AlertSeverity::Critical, "ph")]), &to)
        .await;

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(
        channel.addresses(),
        vec!["a@gov.in", EMERGENCY_CC, EMERGENCY_CC]
    );
}

#[tokio::test]
async fn test_tiers_are_sent_separately() {
    let channel = Arc::new(MockChannel::new());
    let record = record(vec![
        alert(AlertSeverity::Critical, "ecoli"),
        alert(AlertSeverity::Warning, "turbidity"),
        alert(AlertSeverity::Maintenance, "battery"),
    ]);

    let report = dispatcher(channel.clone())
        .dispatch(&record, &recipients(&["a@gov.in"]))
        .await;

    // critical 批次: a + 应急抄送；非 critical 批次: a
    assert_eq!(report.attempted, 3);

    let sent = channel.sent();
    let critical: Vec<_> = sent.iter().filter(|m| m.subject.contains("严重水质预警")).collect();
    let standard: Vec<_> = sent.iter().filter(|m| m.subject.contains("【HydroWatch】水质预警")).collect();
    assert_eq!(critical.len(), 2);
    assert_eq!(standard.len(), 1);

    assert!(critical[0].body.contains("ecoli 越界"));
    assert!(!critical[0].body.contains("turbidity 越界"));
    assert!(standard[0].body.contains("turbidity 越界"));
    assert!(standard[0].body.contains("battery 越界"));
    assert!(!standard[0].body.contains("ecoli 越界"));
}

#[tokio::test(start_paused = true)]
async fn test_hung_send_is_a_per_recipient_failure() {
    let channel = Arc::new(MockChannel::hanging_for(&["slow@gov.in"]));
    let to = recipients(&["a@gov.in", "slow@gov.in", "c@gov.in"]);

    let report = dispatcher(channel.clone())
        .dispatch(&record(vec![alert(AlertSeverity::Warning, "tds")]), &to)
        .await;

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed_addresses, vec!["slow@gov.in"]);
}

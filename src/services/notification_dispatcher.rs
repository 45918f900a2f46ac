//! 通知分发服务
//!
//! 一条预警记录按级别拆成 critical 批次和非 critical 批次，分别渲染、分别发送；
//! critical 批次额外抄送应急地址（不与解析出的通知对象去重）。
//! 单个地址失败只记入报告，整批等待时间受超时限制。

use crate::models::{Alert, AlertRecord, AlertSeverity, DispatchReport, NotificationPayload, Recipient};
use crate::services::NotificationChannel;
use crate::utils::format_iso8601;
use futures::future::join_all;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// 级别批次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Critical,
    Standard,
}

/// 通知分发器
pub struct NotificationDispatcher {
    channel: Arc<dyn NotificationChannel>,
    emergency_contacts: Vec<String>,
    batch_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        channel: Arc<dyn NotificationChannel>,
        emergency_contacts: Vec<String>,
        batch_timeout: Duration,
    ) -> Self {
        Self {
            channel,
            emergency_contacts,
            batch_timeout,
        }
    }

    /// 分发一条预警记录，单个地址失败不会中断其余发送
    pub async fn dispatch(&self, record: &AlertRecord, recipients: &[Recipient]) -> DispatchReport {
        let (critical, standard): (Vec<&Alert>, Vec<&Alert>) = record
            .alerts
            .iter()
            .partition(|a| a.severity == AlertSeverity::Critical);

        let mut report = DispatchReport::default();

        for (tier, alerts) in [(Tier::Critical, critical), (Tier::Standard, standard)] {
            if alerts.is_empty() {
                continue;
            }

            let payload = render_payload(record, tier, &alerts);
            let mut addresses: Vec<&str> = recipients.iter().map(|r| r.email.as_str()).collect();
            if tier == Tier::Critical {
                addresses.extend(self.emergency_contacts.iter().map(String::as_str));
            }

            let batch = self.send_batch(&addresses, &payload).await;
            tracing::info!(
                alert_id = %record.id,
                sensor_id = %record.sensor_id,
                tier = ?tier,
                attempted = batch.attempted,
                succeeded = batch.succeeded,
                failed = batch.failed,
                "通知批次发送完成"
            );
            report.merge(batch);
        }

        report
    }

    /// 并发发送一个批次，超过截止时间仍未完成的地址记为失败
    async fn send_batch(&self, addresses: &[&str], payload: &NotificationPayload) -> DispatchReport {
        let deadline = Instant::now() + self.batch_timeout;

        let sends = addresses.iter().map(|address| async move {
            let result = timeout_at(
                deadline,
                self.channel.send(address, &payload.subject, &payload.body),
            )
            .await;
            (*address, result)
        });

        let mut report = DispatchReport::default();
        for (address, result) in join_all(sends).await {
            match result {
                Ok(Ok(())) => report.record_success(),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, to = %address, "通知发送失败");
                    report.record_failure(address);
                }
                Err(_) => {
                    tracing::warn!(to = %address, "通知发送超时");
                    report.record_failure(address);
                }
            }
        }

        report
    }
}

/// 渲染某个级别批次的通知内容
fn render_payload(record: &AlertRecord, tier: Tier, alerts: &[&Alert]) -> NotificationPayload {
    let title = match tier {
        Tier::Critical => "严重水质预警",
        Tier::Standard if alerts.iter().any(|a| a.severity == AlertSeverity::Warning) => "水质预警",
        Tier::Standard => "设备状态提醒",
    };
    let subject = format!("【HydroWatch】{} - {}", title, record.location.village);

    let mut body = String::new();
    let _ = writeln!(body, "监测点: {}（{}）", record.location.village, record.location.district);
    let _ = writeln!(body, "传感器: {}", record.sensor_id);
    let _ = writeln!(body, "时间: {}", format_iso8601(&record.created_at));
    let _ = writeln!(body, "预警编号: {}", record.id);
    let _ = writeln!(body);
    for (i, alert) in alerts.iter().enumerate() {
        let _ = writeln!(body, "{}. [{}] {}", i + 1, alert.severity, alert.message);
        let _ = writeln!(body, "   建议措施: {}", alert.action);
    }
    let _ = writeln!(body);
    let _ = writeln!(body, "当前读数:");
    for (parameter, value) in record.readings.iter() {
        let _ = writeln!(body, "  {}: {} {}", parameter.label(), value, parameter.unit());
    }

    NotificationPayload { subject, body }
}

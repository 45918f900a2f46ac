//! 通知对象解析服务
//!
//! 多个查询条件取并集、按邮箱去重后做宽松过滤（满足任一条件即保留），
//! 查询全部失败或结果为空时回落到固定的应急名单，保证返回值非空。

use crate::errors::AppError;
use crate::models::{
    AlertSeverity, AlertSubscription, Location, Recipient, RecipientQuery, VerificationStatus,
};
use crate::repositories::PersistenceSink;
use std::collections::HashSet;
use std::sync::Arc;

/// 通知对象解析器
pub struct RecipientResolver {
    sink: Arc<dyn PersistenceSink>,
    queries: Vec<RecipientQuery>,
    fallback: Vec<Recipient>,
}

impl RecipientResolver {
    /// 应急名单不能为空
    pub fn new(sink: Arc<dyn PersistenceSink>, fallback: Vec<Recipient>) -> Result<Self, AppError> {
        if fallback.is_empty() {
            return Err(AppError::SchedulerFatal(
                "notification.fallback_recipients 不能为空".to_string(),
            ));
        }

        Ok(Self {
            sink,
            queries: vec![
                RecipientQuery::Role("government".to_string()),
                RecipientQuery::Role("official".to_string()),
                RecipientQuery::Verification(VerificationStatus::Approved),
            ],
            fallback,
        })
    }

    pub fn fallback(&self) -> &[Recipient] {
        &self.fallback
    }

    /// 解析某级别、某地点预警的通知对象
    pub async fn resolve(&self, severity: AlertSeverity, location: &Location) -> Vec<Recipient> {
        let candidates = match self.lookup().await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, "通知对象查询失败，使用应急名单");
                return self.fallback.clone();
            }
        };

        let matched = filter_recipients(candidates, severity, location);
        if matched.is_empty() {
            tracing::warn!(
                severity = %severity,
                district = %location.district,
                "未匹配到通知对象，使用应急名单"
            );
            return self.fallback.clone();
        }

        tracing::debug!(
            severity = %severity,
            district = %location.district,
            count = matched.len(),
            "通知对象解析完成"
        );
        matched
    }

    /// 依次执行查询并合并；单个查询失败只记录，全部失败才视为查询失败
    async fn lookup(&self) -> Result<Vec<Recipient>, AppError> {
        let mut merged = Vec::new();
        let mut seen = HashSet::new();
        let mut failures = Vec::new();

        for query in &self.queries {
            match self.sink.query_recipients(query).await {
                Ok(recipients) => {
                    // 停用条目不参与去重，避免遮蔽同一地址的有效条目
                    for recipient in recipients.into_iter().filter(|r| r.active) {
                        if seen.insert(recipient.normalized_email()) {
                            merged.push(recipient);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, query = %query, "通知对象查询条件执行失败");
                    failures.push(e.to_string());
                }
            }
        }

        if failures.len() == self.queries.len() {
            return Err(AppError::RecipientResolution(failures.join("; ")));
        }

        Ok(merged)
    }
}

/// 宽松过滤：订阅匹配、辖区匹配或已审核，满足其一即可；同时剔除停用对象
pub fn filter_recipients(
    candidates: Vec<Recipient>,
    severity: AlertSeverity,
    location: &Location,
) -> Vec<Recipient> {
    let subscription = AlertSubscription::for_severity(severity);

    candidates
        .into_iter()
        .filter(|r| r.active)
        .filter(|r| {
            r.is_subscribed_to(&subscription)
                || r
                    .district
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case(&location.district))
                || r.verification_status == VerificationStatus::Approved
        })
        .collect()
}

//! 模拟调度服务
//!
//! 状态机 Stopped / Running。`start()` 先同步执行一次完整 tick 再启动定时器；
//! 每个传感器的状态放在独立的异步锁里，tick 之间串行执行，
//! 同一传感器不会同时存在两次生成。状态查询只读取每个传感器处理完成后
//! 发布的副本，不等待进行中的 tick。

use crate::config::Settings;
use crate::errors::AppError;
use crate::models::{
    AlertRecord, SchedulerState, SchedulerStatus, Sensor, SensorRuntimeStats, SensorSnapshot,
    TickReport,
};
use crate::repositories::PersistenceSink;
use crate::services::{
    AlertStore, GeneratorConfig, NotificationChannel, NotificationDispatcher, ReadingGenerator,
    RecipientResolver, ThresholdEvaluator,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// 调度器配置
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    /// 未设置时使用系统熵
    pub seed: Option<u64>,
}

/// 一次 tick 需要的全部组件
pub struct PipelineComponents {
    pub generator: ReadingGenerator,
    pub evaluator: ThresholdEvaluator,
    pub resolver: RecipientResolver,
    pub dispatcher: NotificationDispatcher,
    pub store: Arc<AlertStore>,
}

impl PipelineComponents {
    /// 按配置组装管线
    pub fn from_settings(
        settings: &Settings,
        sink: Arc<dyn PersistenceSink>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Result<Self, AppError> {
        let bands = Arc::new(settings.bands.clone());
        let simulation = &settings.simulation;

        let generator = ReadingGenerator::new(
            Arc::clone(&bands),
            GeneratorConfig::new(
                simulation.anomaly_probability,
                simulation.offline_probability,
                simulation.tz(),
            ),
        );
        let resolver = RecipientResolver::new(
            Arc::clone(&sink),
            settings.notification.fallback_list(),
        )?;
        let dispatcher = NotificationDispatcher::new(
            channel,
            settings.notification.emergency_contacts.clone(),
            settings.notification.batch_timeout(),
        );
        let store = Arc::new(AlertStore::new(
            sink,
            simulation.reading_buffer_capacity,
            simulation.alert_buffer_capacity,
        ));

        Ok(Self {
            generator,
            evaluator: ThresholdEvaluator::new(bands),
            resolver,
            dispatcher,
            store,
        })
    }
}

impl SchedulerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tick_interval: settings.simulation.tick_interval(),
            seed: settings.simulation.seed,
        }
    }
}

/// 传感器槽位：传感器本身与其运行计数只由调度器修改
struct SensorSlot {
    sensor: Sensor,
    stats: SensorRuntimeStats,
}

struct Pipeline {
    components: PipelineComponents,
    slots: Vec<Mutex<SensorSlot>>,
    rng: StdMutex<StdRng>,
    /// tick 串行化
    tick_lock: Mutex<()>,
    tick_count: AtomicU64,
    last_tick: StdMutex<Option<TickReport>>,
    /// 各传感器最近一次处理完成后的副本
    published: StdMutex<Vec<SensorSnapshot>>,
}

enum Lifecycle {
    Stopped,
    Running {
        shutdown: watch::Sender<bool>,
        handle: JoinHandle<()>,
    },
}

/// 模拟调度器
pub struct SimulationScheduler {
    pipeline: Arc<Pipeline>,
    tick_interval: Duration,
    lifecycle: Mutex<Lifecycle>,
    /// Running 期间为启动时间
    started_at: StdMutex<Option<DateTime<Utc>>>,
}

impl SimulationScheduler {
    pub fn new(components: PipelineComponents, sensors: Vec<Sensor>, config: SchedulerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let published: Vec<SensorSnapshot> = sensors
            .into_iter()
            .map(|sensor| SensorSnapshot {
                sensor,
                stats: SensorRuntimeStats::default(),
            })
            .collect();

        let slots = published
            .iter()
            .map(|s| {
                Mutex::new(SensorSlot {
                    sensor: s.sensor.clone(),
                    stats: s.stats.clone(),
                })
            })
            .collect();

        Self {
            pipeline: Arc::new(Pipeline {
                components,
                slots,
                rng: StdMutex::new(rng),
                tick_lock: Mutex::new(()),
                tick_count: AtomicU64::new(0),
                last_tick: StdMutex::new(None),
                published: StdMutex::new(published),
            }),
            tick_interval: config.tick_interval,
            lifecycle: Mutex::new(Lifecycle::Stopped),
            started_at: StdMutex::new(None),
        }
    }

    pub fn store(&self) -> Arc<AlertStore> {
        Arc::clone(&self.pipeline.components.store)
    }

    pub fn tick_count(&self) -> u64 {
        self.pipeline.tick_count.load(Ordering::SeqCst)
    }

    pub async fn is_running(&self) -> bool {
        self.started_at().is_some()
    }

    fn started_at(&self) -> MutexGuard<'_, Option<DateTime<Utc>>> {
        self.started_at.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 启动调度；已在运行时直接返回当前状态
    pub async fn start(&self) -> Result<SchedulerStatus, AppError> {
        let mut lifecycle = self.lifecycle.lock().await;

        if matches!(*lifecycle, Lifecycle::Running { .. }) {
            tracing::debug!("调度器已在运行");
            return Ok(self.snapshot());
        }

        self.pipeline.preflight()?;

        // 进入 Running 前先完整执行一次
        self.pipeline.run_tick().await;

        let (shutdown, receiver) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.pipeline),
            self.tick_interval,
            receiver,
        ));

        *lifecycle = Lifecycle::Running { shutdown, handle };
        *self.started_at() = Some(Utc::now());

        tracing::info!(
            sensors = self.pipeline.slots.len(),
            tick_interval_seconds = self.tick_interval.as_secs_f64(),
            "模拟调度已启动"
        );

        Ok(self.snapshot())
    }

    /// 停止调度；进行中的 tick 会执行完
    pub async fn stop(&self) -> SchedulerStatus {
        let mut lifecycle = self.lifecycle.lock().await;

        if let Lifecycle::Running { shutdown, .. } =
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        {
            let _ = shutdown.send(true);
            *self.started_at() = None;
            tracing::info!(ticks = self.tick_count(), "模拟调度已停止");
        }

        self.snapshot()
    }

    /// 停止并等待后台循环退出
    pub async fn shutdown(&self) {
        let previous = {
            let mut lifecycle = self.lifecycle.lock().await;
            *self.started_at() = None;
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        };

        if let Lifecycle::Running { shutdown, handle } = previous {
            let _ = shutdown.send(true);
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "调度循环异常退出");
            }
        }
    }

    /// 当前状态；不等待进行中的 tick 或 start()
    pub async fn status(&self) -> SchedulerStatus {
        self.snapshot()
    }

    /// 手动执行一次 tick（与定时 tick 串行）
    pub async fn run_tick(&self) -> TickReport {
        self.pipeline.run_tick().await
    }

    fn snapshot(&self) -> SchedulerStatus {
        let started_at = *self.started_at();
        let state = if started_at.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        };

        let sensors = self.pipeline.published().clone();
        let last_tick = self.pipeline.last_tick().clone();

        SchedulerStatus {
            state,
            tick_interval_seconds: self.tick_interval.as_secs_f64(),
            tick_count: self.tick_count(),
            started_at,
            last_tick,
            sensors,
        }
    }
}

async fn run_loop(pipeline: Arc<Pipeline>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    // 首次 tick 已在 start() 中执行
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                pipeline.run_tick().await;
            }
        }
    }

    tracing::debug!("调度循环已退出");
}

impl Pipeline {
    /// 启动前检查，失败即为不可恢复的配置错误
    fn preflight(&self) -> Result<(), AppError> {
        self.components.generator.bands().validate()?;
        self.components.evaluator.bands().validate()?;
        if self.slots.is_empty() {
            return Err(AppError::SchedulerFatal("未配置任何传感器".to_string()));
        }
        Ok(())
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn last_tick(&self) -> MutexGuard<'_, Option<TickReport>> {
        self.last_tick.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn published(&self) -> MutexGuard<'_, Vec<SensorSnapshot>> {
        self.published.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run_tick(&self) -> TickReport {
        let _serial = self.tick_lock.lock().await;
        let tick = self.tick_count.fetch_add(1, Ordering::SeqCst) + 1;

        let mut sensors_processed = 0;
        let mut sensors_failed = 0;
        let mut alerts_raised = 0;

        for (index, slot) in self.slots.iter().enumerate() {
            let mut slot = slot.lock().await;
            let outcome = self.process_sensor(&mut slot).await;

            if let Some(published) = self.published().get_mut(index) {
                published.sensor = slot.sensor.clone();
                published.stats = slot.stats.clone();
            }

            match outcome {
                Ok(alert_count) => {
                    sensors_processed += 1;
                    alerts_raised += alert_count;
                }
                Err(e) => {
                    sensors_failed += 1;
                    tracing::error!(error = %e, sensor_id = %slot.sensor.id, tick, "传感器处理失败");
                }
            }
        }

        let report = TickReport {
            tick,
            sensors_processed,
            sensors_failed,
            alerts_raised,
            completed_at: Utc::now(),
        };

        tracing::debug!(
            tick,
            sensors_processed,
            sensors_failed,
            alerts_raised,
            "tick 完成"
        );

        *self.last_tick() = Some(report.clone());
        report
    }

    /// 处理单个传感器：生成 → 存储 → 评估 → 通知，返回预警条数
    async fn process_sensor(&self, slot: &mut SensorSlot) -> Result<usize, AppError> {
        let c = &self.components;

        let reading = {
            let mut rng = self.rng();
            c.generator.generate(&mut slot.sensor, Utc::now(), &mut *rng)?
        };

        c.store.record_reading(&reading).await;
        c.store.save_sensor(&slot.sensor).await;

        let alerts = c.evaluator.evaluate(&reading);
        let alert_count = alerts.len();

        if alert_count > 0 {
            let record = AlertRecord::from_reading(&reading, alerts);
            tracing::warn!(
                sensor_id = %record.sensor_id,
                alert_id = %record.id,
                severity = %record.severity,
                alerts = alert_count,
                anomaly = ?reading.anomaly,
                "检测到异常读数"
            );

            c.store.record_alert(&record).await;

            let recipients = c.resolver.resolve(record.severity, &record.location).await;
            let report = c.dispatcher.dispatch(&record, &recipients).await;
            if report.failed > 0 {
                tracing::warn!(
                    alert_id = %record.id,
                    failed = report.failed,
                    failed_addresses = ?report.failed_addresses,
                    "部分通知发送失败"
                );
            }
        }

        slot.stats.record_tick(alert_count, reading.timestamp);
        Ok(alert_count)
    }
}

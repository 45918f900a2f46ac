//! SimulationScheduler 集成测试

use crate::helpers::{directory, test_sensor, test_settings};
use crate::mocks::{MockChannel, MockSink};
use crate::{assert_err, assert_ok};
use hydrowatch::errors::AppError;
use hydrowatch::models::{SchedulerState, Sensor};
use hydrowatch::services::{PipelineComponents, SchedulerConfig, SimulationScheduler};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    scheduler: SimulationScheduler,
    sink: Arc<MockSink>,
    channel: Arc<MockChannel>,
}

fn harness_with(sensors: Vec<Sensor>, extra: &str) -> Harness {
    let settings = test_settings(extra);
    let sink = Arc::new(MockSink::new(directory()));
    let channel = Arc::new(MockChannel::new());
    let components = PipelineComponents::from_settings(&settings, sink.clone(), channel.clone())
        .expect("管线应能组装");

    Harness {
        scheduler: SimulationScheduler::new(components, sensors, SchedulerConfig::from_settings(&settings)),
        sink,
        channel,
    }
}

fn harness() -> Harness {
    let settings = test_settings("");
    harness_with(settings.build_sensors(), "")
}

#[tokio::test(start_paused = true)]
async fn test_start_runs_one_tick_immediately() {
    let h = harness();

    let status = assert_ok!(h.scheduler.start().await);

    assert_eq!(status.state, SchedulerState::Running);
    assert_eq!(status.tick_count, 1);
    assert!(status.started_at.is_some());
    assert!(status.sensors.iter().all(|s| s.stats.total_readings == 1));
    assert_eq!(h.sink.readings().len(), 2);
    assert_eq!(h.sink.sensor_updates(), 2);

    let last = status.last_tick.expect("启动后应有 tick 报告");
    assert_eq!(last.tick, 1);
    assert_eq!(last.sensors_processed, 2);
    assert_eq!(last.sensors_failed, 0);
    assert_eq!(last.alerts_raised, 0);

    h.scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_double_start_does_not_double_arm_timer() {
    let h = harness();

    assert_ok!(h.scheduler.start().await);
    let second = assert_ok!(h.scheduler.start().await);
    assert_eq!(second.state, SchedulerState::Running);
    assert_eq!(second.tick_count, 1);

    // 周期 10s：立即执行 1 次 + 10s/20s/30s 各 1 次
    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(h.scheduler.tick_count(), 4);

    h.scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_prevents_future_ticks() {
    let h = harness();

    assert_ok!(h.scheduler.start().await);
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(h.scheduler.tick_count(), 2);

    let status = h.scheduler.stop().await;
    assert_eq!(status.state, SchedulerState::Stopped);
    assert!(status.started_at.is_none());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.scheduler.tick_count(), 2);

    // 重复 stop 也只是返回当前状态
    assert_eq!(h.scheduler.stop().await.state, SchedulerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_restart_ticks_immediately_again() {
    let h = harness();

    assert_ok!(h.scheduler.start().await);
    h.scheduler.stop().await;
    assert_eq!(h.scheduler.tick_count(), 1);

    let status = assert_ok!(h.scheduler.start().await);
    assert_eq!(status.tick_count, 2);
    assert!(status.sensors.iter().all(|s| s.stats.total_readings == 2));

    h.scheduler.shutdown().await;
}

#[tokio::test]
async fn test_start_without_sensors_is_fatal() {
    let h = harness_with(Vec::new(), "");

    let err = assert_err!(h.scheduler.start().await);
    assert!(matches!(err, AppError::SchedulerFatal(_)));
    assert!(!h.scheduler.is_running().await);
    assert_eq!(h.scheduler.tick_count(), 0);
}

#[tokio::test]
async fn test_start_with_misordered_bands_is_fatal() {
    let extra = r#"
        [bands.ph]
        normal = { min = 6.5, max = 8.5, optimal = 7.2 }
        warning = { min = 6.0, max = 9.5 }
        critical = { min = 6.5, max = 9.0 }
    "#;
    let settings = test_settings(extra);
    let h = harness_with(settings.build_sensors(), extra);

    let err = assert_err!(h.scheduler.start().await);
    assert!(matches!(err, AppError::SchedulerFatal(_)));
    assert_eq!(h.scheduler.status().await.state, SchedulerState::Stopped);
    assert!(h.sink.readings().is_empty());
}

#[tokio::test]
async fn test_consecutive_abnormal_resets_after_clean_tick() {
    // 电量 5%：首个 tick 必然低于 20% 触发维护预警，之后换电恢复
    let mut sensor = test_sensor("S1");
    sensor.battery_level = 5.0;
    let h = harness_with(vec![sensor], "");

    let first = h.scheduler.run_tick().await;
    assert_eq!(first.alerts_raised, 1);
    let stats = h.scheduler.status().await.sensors[0].stats.clone();
    assert_eq!(stats.consecutive_abnormal_readings, 1);
    assert_eq!(stats.alerts_sent, 1);

    let mut abnormal = 1;
    let mut reset = false;
    for _ in 0..5 {
        let report = h.scheduler.run_tick().await;
        let stats = h.scheduler.status().await.sensors[0].stats.clone();
        if report.alerts_raised == 0 {
            assert_eq!(stats.consecutive_abnormal_readings, 0);
            reset = true;
            break;
        }
        abnormal += 1;
        assert_eq!(stats.consecutive_abnormal_readings, abnormal);
    }

    assert!(reset, "换电后应出现无预警的 tick");
    assert!(h.channel.sent().len() >= 1);
    assert_eq!(h.sink.alerts().len() as u32, abnormal);
}

#[tokio::test]
async fn test_sensor_failure_does_not_abort_tick() {
    // S1 的信号强度为 NaN，生成失败；S2 仍被处理
    let mut broken = test_sensor("S1");
    broken.signal_strength = f64::NAN;
    let h = harness_with(vec![broken, test_sensor("S2")], "");

    let report = h.scheduler.run_tick().await;

    assert_eq!(report.sensors_failed, 1);
    assert_eq!(report.sensors_processed, 1);

    let status = h.scheduler.status().await;
    assert_eq!(status.sensors[0].stats.total_readings, 0);
    assert_eq!(status.sensors[1].stats.total_readings, 1);
}

/// 每个 tick 都离线：一条维护预警与一条技术预警，发给 Varanasi 官员的通知挂起到超时
fn hanging_scheduler() -> (Arc<SimulationScheduler>, Arc<MockSink>, Arc<MockChannel>) {
    let mut settings = test_settings("");
    settings.simulation.offline_probability = 1.0;
    let sink = Arc::new(MockSink::new(directory()));
    let channel = Arc::new(MockChannel::hanging_for(&["jal.officer@varanasi.gov.in"]));
    let components = PipelineComponents::from_settings(&settings, sink.clone(), channel.clone())
        .expect("管线应能组装");

    let scheduler = SimulationScheduler::new(
        components,
        vec![test_sensor("S1")],
        SchedulerConfig::from_settings(&settings),
    );
    (Arc::new(scheduler), sink, channel)
}

#[tokio::test(start_paused = true)]
async fn test_manual_tick_never_overlaps_timer_tick() {
    let (scheduler, sink, channel) = hanging_scheduler();

    // 立即 tick 挂起到 2s 超时，定时器在 12s 触发
    assert_ok!(scheduler.start().await);
    tokio::time::sleep(Duration::from_secs(11)).await;

    // 第 2 次 tick 进行中
    assert_eq!(scheduler.tick_count(), 2);
    assert_eq!(scheduler.status().await.sensors[0].stats.total_readings, 1);

    let manual = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.run_tick().await }
    });
    let report = manual.await.expect("手动 tick 不应 panic");

    assert_eq!(report.tick, 3);
    assert_eq!(report.sensors_processed, 1);
    assert_eq!(scheduler.status().await.sensors[0].stats.total_readings, 3);
    assert_eq!(sink.readings().len(), 3);
    assert_eq!(channel.max_in_flight(), 1);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_status_does_not_wait_for_in_flight_tick() {
    let (scheduler, _sink, _channel) = hanging_scheduler();

    let tick = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.run_tick().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let before = tokio::time::Instant::now();
    let status = scheduler.status().await;
    assert!(before.elapsed() < Duration::from_millis(1));
    assert_eq!(status.tick_count, 1);
    assert_eq!(status.sensors[0].stats.total_readings, 0);

    assert_eq!(tick.await.expect("tick 不应 panic").tick, 1);
    assert_eq!(scheduler.status().await.sensors[0].stats.total_readings, 1);
}

#[tokio::test(start_paused = true)]
async fn test_status_during_start_reports_stopped() {
    let (scheduler, _sink, _channel) = hanging_scheduler();

    let starting = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.start().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    // 立即 tick 尚未完成，状态查询不等待 start()
    let before = tokio::time::Instant::now();
    assert_eq!(scheduler.status().await.state, SchedulerState::Stopped);
    assert!(!scheduler.is_running().await);
    assert!(before.elapsed() < Duration::from_millis(1));

    let status = assert_ok!(starting.await.expect("start 不应 panic"));
    assert_eq!(status.state, SchedulerState::Running);
    assert!(scheduler.is_running().await);

    scheduler.shutdown().await;
}

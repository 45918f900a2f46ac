//! HydroWatch - 农村供水水质遥测模拟与预警服务

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hydrowatch::{
    config::{LoggingSettings, Settings},
    db::PostgresPool,
    repositories::{MemoryTelemetryStore, PersistenceSink, PgTelemetryRepository},
    routes,
    services::{
        EmailService, LogChannel, NotificationChannel, PipelineComponents, SchedulerConfig,
        SimulationScheduler,
    },
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    // 加载配置
    let settings = Settings::load().context("配置加载失败")?;

    // 初始化日志
    init_tracing(&settings.logging);

    info!("💧 HydroWatch 服务启动中...");

    // 持久化：启用数据库时使用 PostgreSQL，否则使用进程内存储
    let mut pg_pool: Option<Arc<PostgresPool>> = None;
    let sink: Arc<dyn PersistenceSink> = if settings.database.enabled {
        let pool = PostgresPool::open(&settings)
            .await
            .context("遥测库初始化失败")?;
        info!("✅ 数据库连接成功");

        let repo = PgTelemetryRepository::new(pool.clone());
        pg_pool = Some(Arc::new(pool));
        Arc::new(repo)
    } else {
        info!(
            recipients = settings.directory.recipients.len(),
            "未启用数据库，使用进程内存储"
        );
        Arc::new(MemoryTelemetryStore::new(settings.directory.recipients.clone()))
    };

    // 通知通道：未启用 SMTP 时只写日志
    let channel: Arc<dyn NotificationChannel> = if settings.smtp.enabled {
        Arc::new(EmailService::new(settings.smtp.clone()).context("邮件服务初始化失败")?)
    } else {
        Arc::new(LogChannel)
    };

    // 组装管线
    let components = PipelineComponents::from_settings(&settings, sink, channel)
        .context("预警管线初始化失败")?;
    let scheduler = Arc::new(SimulationScheduler::new(
        components,
        settings.build_sensors(),
        SchedulerConfig::from_settings(&settings),
    ));
    info!(sensors = settings.sensors.len(), "✅ 模拟调度器初始化完成");

    if settings.simulation.autostart {
        scheduler.start().await.context("模拟调度启动失败")?;
    }

    let server_addr = settings.server_addr();
    let workers = if settings.server.workers == 0 {
        num_cpus::get()
    } else {
        settings.server.workers
    };

    info!("🚀 服务启动在 http://{}", server_addr);
    info!("📊 工作线程数: {}", workers);

    let app_scheduler = scheduler.clone();

    // 启动 HTTP 服务器
    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(TracingLogger::default())
            // 注入服务
            .app_data(web::Data::new(app_scheduler.clone()));

        if let Some(pool) = &pg_pool {
            app = app.app_data(web::Data::new(pool.clone()));
        }

        app.configure(routes::configure)
    })
    .workers(workers)
    .bind(&server_addr)
    .with_context(|| format!("端口绑定失败: {}", server_addr))?
    .run()
    .await
    .context("HTTP 服务异常退出")?;

    scheduler.shutdown().await;
    info!("👋 HydroWatch 服务已退出");

    Ok(())
}

fn init_tracing(logging: &LoggingSettings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("{},hydrowatch=debug", logging.level))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use backend::{
    AppState,
    auth::BcryptHasher,
    cache::RedisStore,
    config::Config,
    routes,
    store::{PgBlogStore, PgUserStore},
};
use clap::Parser;
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Blog backend with token authentication")]
struct Cli {
    /// 执行数据库迁移后退出
    #[arg(long)]
    migrate_only: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'blog_backend';").await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    if cli.migrate_only {
        tracing::info!("Migrations completed, exiting");
        return;
    }

    // 设置 Redis 客户端，连接失败只告警，撤销检查按配置的策略处理
    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let cache_store = RedisStore::new(redis_client);
    match cache_store.ping().await {
        Ok(()) => tracing::info!("Redis connection established"),
        Err(e) => tracing::warn!(error = %e, "Redis is not reachable at startup"),
    }

    tracing::info!(
        fail_mode = ?config.revocation_fail_mode,
        rate_limit = config.rate_limit_requests,
        "Loaded configuration"
    );

    let host = config.server_host.clone();
    let port = config.server_port;
    let hasher = BcryptHasher::new(config.bcrypt_cost);
    let state = AppState::new(
        config,
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgBlogStore::new(pool.clone())),
        Arc::new(cache_store),
        Arc::new(hasher),
    );

    let app = routes::create_router(state);

    // 启动服务器
    let addr = SocketAddr::new(
        host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    pool.close().await;
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down server");
}

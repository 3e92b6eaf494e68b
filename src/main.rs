use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod push;
mod routes;
mod scheduler;
mod utils;

use config::Config;
use db::{init_db, run_migrations};

use crate::docs::ApiDoc;
use crate::push::fcm::FcmClient;
use crate::utils::holidays;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "HRMS geo attendance service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, offset_minutes = config.utc_offset_minutes, "Server starting...");

    let pool = init_db(&config.database_url).await?;
    if config.run_migrations {
        run_migrations(&pool).await?;
    }

    let fcm = FcmClient::from_config(&config).unwrap_or_else(|e| {
        warn!(error = %e, "FCM unavailable, push notifications disabled");
        FcmClient::disabled()
    });
    info!(enabled = fcm.is_enabled(), "Push notifications configured");

    let pool_for_cache_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = holidays::warmup_holiday_cache(&pool_for_cache_warmup).await {
            error!(error = %e, "Failed to warm up holiday cache");
        }
    });

    // held until the server stops
    let _scheduler = if config.enable_reminders {
        Some(scheduler::start_scheduler(pool.clone(), fcm.clone(), config.clone()).await?)
    } else {
        info!("Reminders disabled");
        None
    };

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard {_:.*} so the UI's JS/CSS files match too
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(fcm.clone()))
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}

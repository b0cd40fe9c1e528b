use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use clarity_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{
        AnthropicClient, LemonSqueezyService, LocationIqClient, PerplexityClient, ProkeralaClient,
    },
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

const JSON_LIMIT_BYTES: usize = 64 * 1024;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().context("Failed to load configuration file")?;

    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database connection pool")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // upstream clients
    let perplexity = PerplexityClient::new(config.perplexity.clone());
    let prokerala = ProkeralaClient::new(config.prokerala.clone());
    let anthropic = AnthropicClient::new(config.anthropic.clone());
    let locationiq = LocationIqClient::new(config.locationiq.clone());
    let lemonsqueezy = LemonSqueezyService::new(config.lemonsqueezy.clone());
    if config.lemonsqueezy.webhook_secret.is_empty() {
        log::warn!("LemonSqueezy webhook secret is not set; webhooks will be rejected");
    }

    let subscription_service = SubscriptionService::new(pool.clone(), config.subscription.clone());
    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        subscription_service.trial_messages(),
    );
    let chart_service = ChartService::new(pool.clone(), prokerala);
    let birth_detail_service = BirthDetailService::new(pool.clone(), chart_service.clone());
    let chat_service = ChatService::new(
        pool.clone(),
        perplexity,
        subscription_service.clone(),
        birth_detail_service.clone(),
    );
    let payment_service = PaymentService::new(
        pool.clone(),
        anthropic,
        lemonsqueezy,
        subscription_service.clone(),
        ReceiptStorage::new(&config.storage),
        config.gcash.clone(),
    );
    let notification_service = NotificationService::new(pool.clone());
    let geocode_service = GeocodeService::new(locationiq);

    tasks::spawn_all(
        subscription_service.clone(),
        config.cron.expire_interval_secs,
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let cron_config = config.cron.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::JsonConfig::default().limit(JSON_LIMIT_BYTES))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(subscription_service.clone()))
            .app_data(web::Data::new(chart_service.clone()))
            .app_data(web::Data::new(birth_detail_service.clone()))
            .app_data(web::Data::new(chat_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(notification_service.clone()))
            .app_data(web::Data::new(geocode_service.clone()))
            .app_data(web::Data::new(cron_config.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::birth_details_config)
                    .configure(handlers::charts_config)
                    .configure(handlers::chat_config)
                    .configure(handlers::subscription_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::notifications_config)
                    .configure(handlers::geocode_config)
                    .configure(handlers::cron_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}

use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use leave_tracker::config::Config;
use leave_tracker::db::init_db;
use leave_tracker::docs::ApiDoc;
use leave_tracker::leave::{LeaveService, SystemClock};
use leave_tracker::routes::{self, RateLimiters};
use leave_tracker::store::{LeaveStore, MySqlStore};
use leave_tracker::{logging, seed};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _guard = logging::init(&config.log_dir, &config.log_level)?;

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    let store: Arc<dyn LeaveStore> = Arc::new(MySqlStore::new(pool));
    let service = Data::new(LeaveService::new(
        store,
        Arc::new(SystemClock),
        config.leave_policy(),
    ));

    if let (Some(email), Some(password)) = (&config.seed_admin_email, &config.seed_admin_password) {
        seed::ensure_admin(&service, email, password).await?;
    }

    let limiters = RateLimiters::from_config(&config)?;
    let server_addr = config.server_addr.clone();
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard matches the JS/CSS assets
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(config.clone())
            .configure(|cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}

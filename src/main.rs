use std::error::Error;
use std::sync::Arc;

use log::{info, warn};

use oxide_mongo_admin::api::routes::build_router;
use oxide_mongo_admin::api::service::AdminService;
use oxide_mongo_admin::logging;
use oxide_mongo_admin::mongo::connection::MongoDriverFactory;
use oxide_mongo_admin::settings::{self, AppSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let (settings, load_error) = match settings::load_from_disk() {
        Ok(settings) => (settings, None),
        Err(error) => (AppSettings::default(), Some(error)),
    };

    logging::apply_settings(&settings);
    if let Some(error) = load_error {
        eprintln!("failed to load {}: {error}", settings::settings_path().display());
        warn!("settings could not be loaded, using defaults: {error}");
    }

    let factory = Arc::new(MongoDriverFactory::from_settings(&settings));
    let service = Arc::new(AdminService::from_settings(factory, &settings));
    let app = build_router(service);

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("admin API listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}

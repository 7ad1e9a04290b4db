use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dine_match::config::{Settings, StoreBackend};
use dine_match::error::{json_config, query_config};
use dine_match::routes::{self, AppState};
use dine_match::services::{
    AppwriteCollections, AppwriteStore, DisabledPushSender, DocumentStore, ExpoPushClient,
    MemoryStore, PushSender, TokenService,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn build_store(settings: &Settings) -> std::io::Result<Arc<dyn DocumentStore>> {
    match settings.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory document store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Appwrite => {
            let appwrite = settings.store.appwrite.clone().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "store.backend is appwrite but [store.appwrite] is missing",
                )
            })?;

            let collections = AppwriteCollections {
                users: settings.collection.users.clone(),
                restaurants: settings.collection.restaurants.clone(),
                reservations: settings.collection.reservations.clone(),
                chat_messages: settings.collection.chat_messages.clone(),
                notifications: settings.collection.notifications.clone(),
            };

            let mut store = AppwriteStore::new(
                appwrite.endpoint,
                appwrite.api_key,
                appwrite.project_id,
                appwrite.database_id,
                collections,
                Duration::from_secs(appwrite.timeout_secs.unwrap_or(30)),
            )
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

            if let Some(page_size) = appwrite.page_size {
                store = store.with_page_size(page_size);
            }

            info!("Appwrite store initialized");
            Ok(Arc::new(store))
        }
    }
}

fn build_push(settings: &Settings) -> std::io::Result<Arc<dyn PushSender>> {
    if !settings.push.enabled {
        info!("Push delivery disabled");
        return Ok(Arc::new(DisabledPushSender));
    }

    let client = ExpoPushClient::new(
        settings.push.endpoint.clone(),
        settings.push.access_token.clone(),
        Duration::from_secs(settings.push.timeout_secs.unwrap_or(10)),
    )
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    info!("Push client initialized ({})", settings.push.endpoint);
    Ok(Arc::new(client))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting Dine Match service...");

    let store = build_store(&settings).map_err(|e| {
        error!("Failed to initialize document store: {}", e);
        e
    })?;
    let push = build_push(&settings)?;

    let tokens = TokenService::new(
        &settings.auth.jwt_secret,
        settings.auth.issuer.clone(),
        settings.auth.token_ttl_minutes,
    );

    let app_state = AppState::new(store, push, tokens);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenvy::dotenv;
use std::sync::Arc;

use blogicum_server::application::BlogService;
use blogicum_server::data::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
    PostgresPostRepository, PostgresUserRepository,
};
use blogicum_server::infrastructure::{
    database::{create_pool, run_migrations},
    logging::init_logging,
    AppConfig, JwtService,
};
use blogicum_server::presentation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    init_logging();

    let config = AppConfig::from_env()?;
    let http_addr = config.http_addr();

    tracing::info!("Starting blogicum server...");
    tracing::info!("HTTP server will listen on {}", http_addr);
    tracing::info!("CORS allowed origins: {}", config.cors_allowed_origins);

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;

    tracing::info!("Running database migrations...");
    run_migrations(&pool).await?;

    // Initialize services
    tracing::info!("Initializing services...");

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret)?);

    let blog_service = Arc::new(BlogService::new(
        Arc::new(PostgresPostRepository::new(pool.clone())),
        Arc::new(PostgresCommentRepository::new(pool.clone())),
        Arc::new(PostgresCategoryRepository::new(pool.clone())),
        Arc::new(PostgresLocationRepository::new(pool.clone())),
        Arc::new(PostgresUserRepository::new(pool.clone())),
    ));

    tracing::info!("Services initialized successfully");

    run_http_server(http_addr, config, blog_service, jwt_service).await?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Configure CORS for the HTTP server with allowed origins from .env
fn configure_cors(allowed_origins: &str) -> actix_cors::Cors {
    use actix_cors::Cors;
    use actix_web::http::header;

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .expose_headers(vec![header::LOCATION])
        .max_age(3600);

    for origin in allowed_origins.split(',').map(str::trim) {
        if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
            tracing::debug!("Added allowed CORS origin: {}", origin);
        }
    }

    cors
}

async fn run_http_server(
    addr: String,
    config: AppConfig,
    blog_service: Arc<BlogService>,
    jwt_service: Arc<JwtService>,
) -> anyhow::Result<()> {
    tracing::info!("Configuring HTTP server...");

    let config = web::Data::new(config);
    let blog_service = web::Data::new(blog_service);
    let jwt_service = web::Data::new(jwt_service);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(configure_cors(&config.cors_allowed_origins))
            .app_data(config.clone())
            .app_data(blog_service.clone())
            .app_data(jwt_service.clone())
            .configure(presentation::configure)
    })
    .bind(&addr)?
    .run();

    tracing::info!("HTTP server running on {}", addr);

    server.await?;

    Ok(())
}

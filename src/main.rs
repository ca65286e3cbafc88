mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::admin::{
    routes as admin_routes, services::AdminService, workers::ReportWorker,
};
use crate::features::appointments::{
    routes as appointments_routes, services::AppointmentService, workers::ReminderWorker,
};
use crate::features::auth::routes as auth_routes;
use crate::features::auth::services::{AuthService, TokenService};
use crate::features::files::{routes as files_routes, FileService};
use crate::features::notifications::services::MailerService;
use crate::features::payments::{routes as payments_routes, services::PaymentService};
use crate::features::psychologists::{
    routes as psychologists_routes,
    services::{GeocodingService, PsychologistService},
};
use crate::features::records::{routes as records_routes, services::RecordService};
use crate::features::reviews::{routes as reviews_routes, services::ReviewService};
use crate::features::users::{routes as users_routes, services::UserService};
use crate::modules::storage::StorageClient;
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run migrations automatically
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Initialize auth services
    let token_service = Arc::new(TokenService::new(pool.clone(), &config.auth));
    let auth_service = Arc::new(AuthService::new(pool.clone(), Arc::clone(&token_service)));
    tracing::info!("Auth services initialized");

    // Create the bootstrap administrator when configured and missing
    if let (Some(email), Some(password)) = (
        config.auth.bootstrap_admin_email.as_deref(),
        config.auth.bootstrap_admin_password.as_deref(),
    ) {
        auth_service
            .bootstrap_admin(email, password)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bootstrap administrator: {}", e))?;
    }

    // Initialize mailer (logs and skips when no API key is configured)
    let mailer_service = Arc::new(MailerService::new(&config.mail));
    tracing::info!("Mailer service initialized");

    // Initialize object storage for image uploads
    let storage_client = Arc::new(
        StorageClient::new(config.storage.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize storage client: {}", e))?,
    );
    tracing::info!("Storage client initialized");

    // Initialize File Service
    let file_service = Arc::new(FileService::new(pool.clone(), Arc::clone(&storage_client)));
    tracing::info!("File service initialized");

    // Initialize User Service
    let user_service = Arc::new(UserService::new(pool.clone()));
    tracing::info!("User service initialized");

    // Initialize Psychologist Services
    let geocoding_service = Arc::new(GeocodingService::new(&config.geocoding));
    let psychologist_service = Arc::new(PsychologistService::new(
        pool.clone(),
        Arc::clone(&geocoding_service),
    ));
    tracing::info!("Psychologist services initialized");

    // Initialize Appointment Service
    let appointment_service = Arc::new(AppointmentService::new(
        pool.clone(),
        Arc::clone(&mailer_service),
    ));
    tracing::info!("Appointment service initialized");

    // Initialize Payment Service
    let payment_service = Arc::new(PaymentService::new(
        pool.clone(),
        Arc::clone(&appointment_service),
        Arc::clone(&mailer_service),
        &config.payment,
    ));
    tracing::info!("Payment service initialized");

    // Initialize Review Service
    let review_service = Arc::new(ReviewService::new(pool.clone()));
    tracing::info!("Review service initialized");

    // Initialize Clinical Record Service
    let record_service = Arc::new(RecordService::new(pool.clone()));
    tracing::info!("Record service initialized");

    // Initialize Admin Service
    let admin_service = Arc::new(AdminService::new(
        pool.clone(),
        Arc::clone(&mailer_service),
    ));
    tracing::info!("Admin service initialized");

    // Spawn appointment reminder worker
    let reminder_worker = ReminderWorker::new(pool.clone(), Arc::clone(&mailer_service));
    tokio::spawn(async move {
        reminder_worker.run().await;
    });
    tracing::info!("Reminder worker spawned");

    // Spawn daily report worker
    let report_worker = ReportWorker::new(pool.clone(), Arc::clone(&mailer_service));
    tokio::spawn(async move {
        report_worker.run().await;
    });
    tracing::info!("Report worker spawned");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require a verified token and an active account)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::clone(&auth_service)))
        .merge(users_routes::routes(user_service))
        .merge(psychologists_routes::protected_routes(Arc::clone(
            &psychologist_service,
        )))
        .merge(appointments_routes::routes(Arc::clone(
            &appointment_service,
        )))
        .merge(payments_routes::protected_routes(Arc::clone(
            &payment_service,
        )))
        .merge(reviews_routes::protected_routes(Arc::clone(
            &review_service,
        )))
        .merge(records_routes::routes(record_service))
        .merge(files_routes::routes(file_service))
        .merge(admin_routes::routes(admin_service))
        .route_layer(axum::middleware::from_fn_with_state(
            token_service.clone(),
            middleware::auth_middleware,
        ));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes (no auth required). The payment webhook authenticates
    // with an HMAC signature instead of a user token.
    let public_routes = Router::new()
        .merge(auth_routes::public_routes(auth_service))
        .merge(psychologists_routes::public_routes(psychologist_service))
        .merge(reviews_routes::public_routes(review_service))
        .merge(payments_routes::public_routes(payment_service));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(public_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}

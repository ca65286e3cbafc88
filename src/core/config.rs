use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub mail: MailConfig,
    pub storage: StorageConfig,
    pub payment: PaymentConfig,
    pub geocoding: GeocodingConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
    pub frontend_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Process-wide HS256 signing secret. Every issued token verifies
    /// against this value.
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub jwt_leeway: Duration,
    /// When set and no administrator account exists, one is created at
    /// startup. Administrators are otherwise provisioned out of band.
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Transactional mail over an HTTP API. Without an API key the mailer
/// logs and skips instead of sending.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from_address: String,
    pub admin_address: String,
}

/// MinIO/S3 storage configuration for image uploads
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Public endpoint URL for publicly accessible files (optional, defaults to endpoint)
    pub public_endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing files
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Key prefix for uploaded images (e.g., "uploads")
    pub upload_prefix: String,
}

/// Payment gateway webhook settings. The gateway signs callback bodies
/// with HMAC-SHA256 using the shared secret.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub webhook_secret: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            // Only error if it's not "file not found" - that's acceptable
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            mail: MailConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            payment: PaymentConfig::from_env()?,
            geocoding: GeocodingConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
            frontend_url,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    const DEFAULT_TOKEN_TTL_SECS: u64 = 86_400; // 24 hours
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("AUTH_JWT_SECRET")
            .map_err(|_| "AUTH_JWT_SECRET environment variable is required".to_string())?;

        if jwt_secret.len() < 32 {
            return Err("AUTH_JWT_SECRET must be at least 32 characters".to_string());
        }

        let token_ttl_secs = env::var("AUTH_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TOKEN_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "AUTH_TOKEN_TTL_SECS must be a valid number".to_string())?;

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        let bootstrap_admin_email = env::var("AUTH_BOOTSTRAP_ADMIN_EMAIL")
            .ok()
            .filter(|s| !s.is_empty());
        let bootstrap_admin_password = env::var("AUTH_BOOTSTRAP_ADMIN_PASSWORD")
            .ok()
            .filter(|s| !s.is_empty());

        Ok(Self {
            jwt_secret,
            token_ttl: Duration::from_secs(token_ttl_secs),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
            bootstrap_admin_email,
            bootstrap_admin_password,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Mindwell API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for Mindwell".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl MailConfig {
    pub fn from_env() -> Result<Self, String> {
        let api_url =
            env::var("MAIL_API_URL").unwrap_or_else(|_| "https://api.mailchannel.dev/v1/send".to_string());

        let api_key = env::var("MAIL_API_KEY").ok().filter(|s| !s.is_empty());

        let from_address = env::var("MAIL_FROM_ADDRESS")
            .unwrap_or_else(|_| "no-reply@mindwell.app".to_string());

        let admin_address = env::var("MAIL_ADMIN_ADDRESS")
            .unwrap_or_else(|_| "admin@mindwell.app".to_string());

        Ok(Self {
            api_url,
            api_key,
            from_address,
            admin_address,
        })
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "mindwell-uploads".to_string());

        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let upload_prefix = env::var("MINIO_UPLOAD_PREFIX").unwrap_or_else(|_| "uploads".to_string());

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            upload_prefix,
        })
    }
}

impl PaymentConfig {
    pub fn from_env() -> Result<Self, String> {
        let webhook_secret = env::var("PAYMENT_WEBHOOK_SECRET")
            .map_err(|_| "PAYMENT_WEBHOOK_SECRET environment variable is required".to_string())?;

        let currency = env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "USD".to_string());

        Ok(Self {
            webhook_secret,
            currency,
        })
    }
}

impl GeocodingConfig {
    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("GEOCODING_BASE_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string());

        let user_agent = env::var("GEOCODING_USER_AGENT")
            .unwrap_or_else(|_| "mindwell-core/0.1 (contact@mindwell.app)".to_string());

        Ok(Self {
            base_url,
            user_agent,
        })
    }
}

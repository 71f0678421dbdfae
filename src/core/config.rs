use std::env;

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Config {
    pub app: AppConfig,
    pub geocoding: GeocodingConfig,
    pub store: StoreConfig,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

/// Geocoding provider connection. The access token is a secret and must never
/// appear in logs or response bodies.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub access_token: String,
}

/// Record store connection (PostgREST-style HTTP contract).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
}

/// S3-compatible storage for film images.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

/// Identity/session provider. Defaults to the record store's host, which
/// serves both contracts in the hosted backend this targets.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Config {
            app: AppConfig::from_env()?,
            geocoding: GeocodingConfig::from_env()?,
            store: StoreConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            identity: IdentityConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
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

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl GeocodingConfig {
    const DEFAULT_BASE_URL: &'static str = "https://api.mapbox.com";

    pub fn from_env() -> Result<Self, String> {
        let base_url =
            env::var("GEOCODING_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());

        let access_token = env::var("GEOCODING_ACCESS_TOKEN")
            .or_else(|_| env::var("MAPBOX_ACCESS_TOKEN"))
            .map_err(|_| {
                "GEOCODING_ACCESS_TOKEN (or MAPBOX_ACCESS_TOKEN) must be set".to_string()
            })?;

        if access_token.is_empty() {
            return Err("GEOCODING_ACCESS_TOKEN must not be empty".to_string());
        }

        Ok(Self {
            base_url,
            access_token,
        })
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, String> {
        let base_url =
            env::var("FILM_STORE_URL").map_err(|_| "FILM_STORE_URL must be set".to_string())?;

        let api_key = env::var("FILM_STORE_API_KEY")
            .map_err(|_| "FILM_STORE_API_KEY must be set".to_string())?;

        Ok(Self { base_url, api_key })
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("STORAGE_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("STORAGE_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("STORAGE_ACCESS_KEY")
            .map_err(|_| "STORAGE_ACCESS_KEY must be set".to_string())?;

        let secret_key = env::var("STORAGE_SECRET_KEY")
            .map_err(|_| "STORAGE_SECRET_KEY must be set".to_string())?;

        let bucket = env::var("STORAGE_BUCKET").unwrap_or_else(|_| "film-images".to_string());

        let region = env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
        })
    }
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self, String> {
        // Falls back to the store host: the hosted backend serves the
        // identity API from the same base URL.
        let base_url = env::var("IDENTITY_URL")
            .or_else(|_| env::var("FILM_STORE_URL"))
            .map_err(|_| "IDENTITY_URL (or FILM_STORE_URL) must be set".to_string())?;

        let api_key = env::var("IDENTITY_API_KEY")
            .or_else(|_| env::var("FILM_STORE_API_KEY"))
            .map_err(|_| "IDENTITY_API_KEY (or FILM_STORE_API_KEY) must be set".to_string())?;

        Ok(Self { base_url, api_key })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Cinemap API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for the Cinemap geocoding proxy".to_string());

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

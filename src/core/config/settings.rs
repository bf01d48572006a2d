use super::parsing::{
    env_optional, env_or_default, is_supported_attachment_extension,
    is_supported_image_extension, normalize_prefix, parse_bool, parse_cors_origins,
    parse_environment, parse_identity_provider, parse_string_list, parse_u16, parse_u32,
    parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, IdentityProvider,
    IdentitySettings, RateLimitSettings, RedisSettings, RuntimeSettings, S3Settings,
    SecuritySettings, ServerHost, ServerPort, ServerSettings, Settings, StorageSettings,
    TelemetrySettings,
};

const GOOGLE_SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("QBANK_HOST", "0.0.0.0");
        let port = env_optional("QBANK_PORT")
            .or_else(|| env_optional("PORT"))
            .unwrap_or_else(|| "5000".to_string());

        let environment =
            parse_environment(env_optional("QBANK_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("QBANK_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Question Bank API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let prefix = normalize_prefix(env_or_default("API_PREFIX", "/api"))?;
        let body_limit_mb = parse_u64("BODY_LIMIT_MB", env_or_default("BODY_LIMIT_MB", "10"))?;

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };

        let firebase_project_id = env_or_default("FIREBASE_PROJECT_ID", "");
        let identity_provider =
            parse_identity_provider(env_optional("IDENTITY_PROVIDER"), &firebase_project_id)?;
        let jwks_url = env_or_default("FIREBASE_JWKS_URL", GOOGLE_SECURETOKEN_JWKS_URL);
        let jwks_cache_ttl_seconds =
            parse_u64("JWKS_CACHE_TTL_SECONDS", env_or_default("JWKS_CACHE_TTL_SECONDS", "3600"))?;
        let identity_timeout_seconds = parse_u64(
            "IDENTITY_REQUEST_TIMEOUT_SECONDS",
            env_or_default("IDENTITY_REQUEST_TIMEOUT_SECONDS", "10"),
        )?;

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "qbank");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "question_bank");
        let database_url = env_optional("DATABASE_URL");
        let max_connections =
            parse_u32("DB_MAX_CONNECTIONS", env_or_default("DB_MAX_CONNECTIONS", "20"))?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let rate_limit_enabled =
            env_optional("RATE_LIMIT_ENABLED").map(|value| parse_bool(&value)).unwrap_or(true);
        let rate_limit_max = parse_u64("RATE_LIMIT_MAX", env_or_default("RATE_LIMIT_MAX", "100"))?;
        let rate_limit_window = parse_u64(
            "RATE_LIMIT_WINDOW_SECONDS",
            env_or_default("RATE_LIMIT_WINDOW_SECONDS", "900"),
        )?;
        let rate_limit_trust_proxy = env_optional("RATE_LIMIT_TRUST_PROXY")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);

        let allowed_image_extensions = parse_string_list(
            env_optional("ALLOWED_IMAGE_EXTENSIONS"),
            &["jpg", "jpeg", "png", "webp"],
        );
        let allowed_attachment_extensions =
            parse_string_list(env_optional("ALLOWED_ATTACHMENT_EXTENSIONS"), &["pdf"]);
        let upload_url_expire_minutes = parse_u64(
            "UPLOAD_URL_EXPIRE_MINUTES",
            env_or_default("UPLOAD_URL_EXPIRE_MINUTES", "15"),
        )?;
        let public_base_url =
            env_or_default("ASSET_PUBLIC_BASE_URL", "").trim_end_matches('/').to_string();

        let s3_endpoint = env_or_default("S3_ENDPOINT", "https://s3.amazonaws.com");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "question-bank-assets");
        let s3_region = env_or_default("S3_REGION", "us-east-1");

        let admin_email = env_optional("ADMIN_EMAIL").map(|value| value.to_ascii_lowercase());
        let admin_identity_id = env_optional("ADMIN_IDENTITY_ID");
        let admin_name = env_or_default("ADMIN_NAME", "Admin User");

        let log_level = env_or_default("QBANK_LOG_LEVEL", "info");
        let json = env_optional("QBANK_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings {
                project_name,
                version,
                prefix,
                body_limit_bytes: (body_limit_mb as usize) * 1024 * 1024,
            },
            security: SecuritySettings { secret_key },
            identity: IdentitySettings {
                provider: identity_provider,
                firebase_project_id,
                jwks_url,
                jwks_cache_ttl_seconds,
                request_timeout_seconds: identity_timeout_seconds,
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            rate_limit: RateLimitSettings {
                enabled: rate_limit_enabled,
                max_requests: rate_limit_max,
                window_seconds: rate_limit_window,
                trust_proxy: rate_limit_trust_proxy,
            },
            storage: StorageSettings {
                allowed_image_extensions,
                allowed_attachment_extensions,
                upload_url_expire_minutes,
                public_base_url,
            },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
            },
            admin: AdminSettings {
                email: admin_email,
                identity_id: admin_identity_id,
                name: admin_name,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn identity(&self) -> &IdentitySettings {
        &self.identity
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn rate_limit(&self) -> &RateLimitSettings {
        &self.rate_limit
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.allowed_image_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_IMAGE_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }

        for extension in &self.storage.allowed_image_extensions {
            if !is_supported_image_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_IMAGE_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        for extension in &self.storage.allowed_attachment_extensions {
            if !is_supported_attachment_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_ATTACHMENT_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::InvalidValue {
                field: "RATE_LIMIT_MAX",
                value: "0".to_string(),
            });
        }

        if self.rate_limit.window_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "RATE_LIMIT_WINDOW_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.identity.provider == IdentityProvider::Firebase
            && self.identity.firebase_project_id.is_empty()
        {
            return Err(ConfigError::MissingSecret("FIREBASE_PROJECT_ID"));
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.runtime.environment.is_production()
            && self.identity.provider == IdentityProvider::SharedSecret
        {
            return Err(ConfigError::InvalidValue {
                field: "IDENTITY_PROVIDER",
                value: self.identity.provider.as_str().to_string(),
            });
        }
        if self.s3.is_configured() && self.storage.public_base_url.is_empty() {
            return Err(ConfigError::MissingSecret("ASSET_PUBLIC_BASE_URL"));
        }

        Ok(())
    }
}

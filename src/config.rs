/*
 * Responsibility
 * - 環境変数から設定を読む (.env を先に読み込む)
 * - 検証して、欠落や不正な値があれば起動を失敗させる
 */
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationBackend {
    Memory,
    Valkey { url: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Process configuration.
///
/// Debug is implemented by hand so the signing secret never reaches a log line.
#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub database_url: String,

    // Shared with the token issuer.
    pub jwt_secret: String,
    pub access_token_leeway_seconds: u64,
    pub upstream_timeout: Duration,

    pub revocation_backend: RevocationBackend,
    pub revocation_grace: chrono::Duration,
    pub revocation_fallback_ttl: chrono::Duration,
    pub revocation_sweep_interval: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("access_token_leeway_seconds", &self.access_token_leeway_seconds)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("revocation_backend", &self.revocation_backend)
            .field("revocation_grace", &self.revocation_grace)
            .field("revocation_fallback_ttl", &self.revocation_fallback_ttl)
            .field("revocation_sweep_interval", &self.revocation_sweep_interval)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source. `from_env` plugs in the process
    /// environment; tests plug in a map.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&get, "PORT", 3000)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(&get("APP_ENV").unwrap_or_else(|| "development".into()));

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let access_token_leeway_seconds = parse_or(&get, "ACCESS_TOKEN_LEEWAY_SECONDS", 0)?;
        let upstream_timeout_ms: u64 = parse_or(&get, "AUTH_UPSTREAM_TIMEOUT_MS", 2000)?;
        if upstream_timeout_ms == 0 {
            return Err(ConfigError::Invalid("AUTH_UPSTREAM_TIMEOUT_MS"));
        }

        let revocation_backend = match get("REVOCATION_BACKEND")
            .unwrap_or_else(|| "memory".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => RevocationBackend::Memory,
            "valkey" | "redis" => RevocationBackend::Valkey {
                url: get("VALKEY_URL").ok_or(ConfigError::Missing("VALKEY_URL"))?,
            },
            _ => return Err(ConfigError::Invalid("REVOCATION_BACKEND")),
        };

        let grace_seconds: i64 = parse_or(&get, "REVOCATION_GRACE_SECONDS", 60)?;
        let fallback_ttl_seconds: i64 = parse_or(&get, "REVOCATION_FALLBACK_TTL_SECONDS", 86_400)?;
        let sweep_interval_seconds: u64 = parse_or(&get, "REVOCATION_SWEEP_INTERVAL_SECONDS", 30)?;

        let revocation_grace = chrono::Duration::try_seconds(grace_seconds)
            .filter(|grace| *grace >= chrono::Duration::zero())
            .ok_or(ConfigError::Invalid("REVOCATION_GRACE_SECONDS"))?;
        let revocation_fallback_ttl = chrono::Duration::try_seconds(fallback_ttl_seconds)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or(ConfigError::Invalid("REVOCATION_FALLBACK_TTL_SECONDS"))?;
        if sweep_interval_seconds == 0 {
            return Err(ConfigError::Invalid("REVOCATION_SWEEP_INTERVAL_SECONDS"));
        }

        Ok(Self {
            addr,
            app_env,
            database_url,
            jwt_secret,
            access_token_leeway_seconds,
            upstream_timeout: Duration::from_millis(upstream_timeout_ms),
            revocation_backend,
            revocation_grace,
            revocation_fallback_ttl,
            revocation_sweep_interval: Duration::from_secs(sweep_interval_seconds),
        })
    }
}

// Unset -> default; set but unparsable -> error (a typo should not silently
// fall back to the default).
fn parse_or<F, T>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/notes"),
        ("JWT_SECRET", "s3cret-s3cret-s3cret-s3cret-s3cret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.revocation_backend, RevocationBackend::Memory);
        assert_eq!(config.upstream_timeout, Duration::from_millis(2000));
        assert_eq!(config.revocation_grace, chrono::Duration::seconds(60));
        assert_eq!(config.access_token_leeway_seconds, 0);
    }

    #[test]
    fn secret_is_required_and_not_blank() {
        let err = load(&[("DATABASE_URL", "postgres://x")]).err().unwrap();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));

        let err = load(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "  ")])
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Invalid("JWT_SECRET")));
    }

    #[test]
    fn valkey_backend_needs_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("REVOCATION_BACKEND", "valkey"));
        assert!(matches!(
            load(&pairs).err().unwrap(),
            ConfigError::Missing("VALKEY_URL")
        ));

        pairs.push(("VALKEY_URL", "redis://localhost:6379"));
        assert_eq!(
            load(&pairs).unwrap().revocation_backend,
            RevocationBackend::Valkey {
                url: "redis://localhost:6379".into()
            }
        );
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("AUTH_UPSTREAM_TIMEOUT_MS", "soon"));
        assert!(matches!(
            load(&pairs).err().unwrap(),
            ConfigError::Invalid("AUTH_UPSTREAM_TIMEOUT_MS")
        ));
    }

    #[test]
    fn debug_hides_secret() {
        let config = load(&REQUIRED).unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[test]
    fn out_of_range_durations_are_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("REVOCATION_GRACE_SECONDS", "-1"));
        assert!(matches!(
            load(&pairs).err().unwrap(),
            ConfigError::Invalid("REVOCATION_GRACE_SECONDS")
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("REVOCATION_FALLBACK_TTL_SECONDS", "9223372036854775807"));
        assert!(matches!(
            load(&pairs).err().unwrap(),
            ConfigError::Invalid("REVOCATION_FALLBACK_TTL_SECONDS")
        ));
    }
}


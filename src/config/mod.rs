use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub prediction: PredictionConfig,
    pub database: DatabaseConfig,
    pub remote_store: Option<RemoteStoreConfig>,
    pub geo: GeoConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
}

/// Remote prediction endpoint configuration
#[derive(Debug, Clone, Default)]
pub struct PredictionConfig {
    /// Base URL of the menopause stage predictor (unset disables it)
    pub menopause_url: Option<String>,
    /// Base URL of the PCOS risk predictor (unset disables it)
    pub pcos_url: Option<String>,
    pub confidence_scale: ConfidenceScale,
}

/// Scale the remote predictor reports its confidence on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfidenceScale {
    /// Already on the 0-100 scale
    #[default]
    Percent,
    /// 0.0-1.0, multiplied by 100 before use
    Fraction,
}

impl ConfidenceScale {
    /// Bring a raw confidence value onto the 0-100 score scale.
    ///
    /// The result is not clamped; the classifier clamps.
    pub fn to_score(self, confidence: f64) -> f64 {
        match self {
            ConfidenceScale::Percent => confidence,
            ConfidenceScale::Fraction => confidence * 100.0,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// REST data store (PostgREST / Supabase) configuration
#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Geocoding configuration
#[derive(Debug, Clone)]
pub struct GeoConfig {
    pub base_url: String,
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Upper bound for `MAX_RETRIES`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let prediction = PredictionConfig {
            menopause_url: non_empty_var("PREDICTION_MENOPAUSE_URL"),
            pcos_url: non_empty_var("PREDICTION_PCOS_URL"),
            confidence_scale: match env::var("PREDICTION_CONFIDENCE_SCALE")
                .unwrap_or_else(|_| "percent".to_string())
                .to_lowercase()
                .as_str()
            {
                "percent" => ConfidenceScale::Percent,
                "fraction" => ConfidenceScale::Fraction,
                other => {
                    return Err(AppError::Config {
                        message: format!(
                            "PREDICTION_CONFIDENCE_SCALE must be 'percent' or 'fraction', got '{}'",
                            other
                        ),
                    })
                }
            },
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/assessments.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let remote_store = match (non_empty_var("SUPABASE_URL"), non_empty_var("SUPABASE_API_KEY")) {
            (Some(base_url), Some(api_key)) => Some(RemoteStoreConfig { base_url, api_key }),
            (Some(_), None) => {
                return Err(AppError::Config {
                    message: "SUPABASE_API_KEY is required when SUPABASE_URL is set".to_string(),
                })
            }
            _ => None,
        };

        let geo = GeoConfig {
            base_url: env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            user_agent: env::var("NOMINATIM_USER_AGENT").unwrap_or_else(|_| {
                format!("womens-health-assessment/{}", env!("CARGO_PKG_VERSION"))
            }),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30000),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(2)
                .min(MAX_RETRIES_LIMIT),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
        };

        Ok(Config {
            prediction,
            database,
            remote_store,
            geo,
            logging,
            request,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("womens-health-assessment/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Site-wide pre-order price in cents; snippets do not carry their own.
    pub song_price_cents: i64,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_region: String,
    pub s3_bucket_name: String,
    pub s3_endpoint: Option<String>,
    pub transcoder_url: String,
    pub analysis_url: String,
    pub stripe_secret_key: String,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let song_price_cents = env::var("SONG_PRICE_CENTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);

        Self {
            database_url,
            jwt_secret,
            song_price_cents,
            aws_access_key_id: env::var("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            aws_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            s3_bucket_name: env::var("S3_BUCKET_NAME")
                .unwrap_or_else(|_| "presong-media".to_string()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            transcoder_url: env::var("TRANSCODER_URL")
                .unwrap_or_else(|_| "http://localhost:9080".to_string()),
            analysis_url: env::var("ANALYSIS_URL")
                .unwrap_or_else(|_| "http://localhost:9081".to_string()),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

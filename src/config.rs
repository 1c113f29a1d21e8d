use anyhow::{Context, Result};
use clap::Parser;
use std::{env, fmt};

/// Origin allowed by CORS outside production.
pub const LOCAL_FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// Deployment environment, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub aws_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub bucket_name: String,
    pub table_name: String,
    pub frontend_url: Option<String>,
    /// Custom S3/DynamoDB endpoint (MinIO, LocalStack). Switches S3 to path-style.
    pub endpoint_url: Option<String>,
    /// Hosted behind an external invocation layer; do not bind a listener.
    pub serverless: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Image upload and metadata gateway")]
pub struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// AWS region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Bucket receiving uploads (overrides S3_BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Metadata table name (overrides DYNAMODB_TABLE_NAME)
    #[arg(long)]
    pub table: Option<String>,

    /// Frontend origin allowed in production (overrides FRONTEND_URL)
    #[arg(long)]
    pub frontend_url: Option<String>,

    /// Custom service endpoint (overrides AWS_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Build the app without listening (also enabled by SERVERLESS=true)
    #[arg(long)]
    pub serverless: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::resolve(args, |name| env::var(name).ok())
    }

    /// Merge CLI args over values produced by `lookup`, then over defaults.
    /// Blank values count as unset.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let env_port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .with_context(|| format!("parsing PORT value `{}`", value))?,
            None => 5000,
        };

        let environment = var("APP_ENV")
            .map(|value| Environment::parse(&value))
            .unwrap_or(Environment::Development);

        let bucket_name = args
            .bucket
            .or_else(|| var("S3_BUCKET_NAME"))
            .context("S3_BUCKET_NAME is not set (or pass --bucket)")?;
        let table_name = args
            .table
            .or_else(|| var("DYNAMODB_TABLE_NAME"))
            .context("DYNAMODB_TABLE_NAME is not set (or pass --table)")?;

        let frontend_url = args.frontend_url.or_else(|| var("FRONTEND_URL"));
        if environment == Environment::Production && frontend_url.is_none() {
            anyhow::bail!("FRONTEND_URL must be set when APP_ENV=production");
        }

        let serverless = args.serverless || var("SERVERLESS").is_some_and(|v| parse_flag(&v));

        Ok(Self {
            host: args
                .host
                .or_else(|| var("HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            environment,
            aws_region: args
                .region
                .or_else(|| var("AWS_REGION"))
                .unwrap_or_else(|| "us-east-1".into()),
            aws_access_key_id: var("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            bucket_name,
            table_name,
            frontend_url,
            endpoint_url: args.endpoint_url.or_else(|| var("AWS_ENDPOINT_URL")),
            serverless,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The single origin CORS lets through.
    pub fn allowed_origin(&self) -> &str {
        match (self.environment, self.frontend_url.as_deref()) {
            (Environment::Production, Some(origin)) => origin,
            _ => LOCAL_FRONTEND_ORIGIN,
        }
    }

    /// Static key pair, only when both halves are configured.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }

    /// Base of the unsigned, public-style object URLs returned by search.
    pub fn public_url_base(&self) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com",
            self.bucket_name, self.aws_region
        )
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("aws_region", &self.aws_region)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field(
                "aws_secret_access_key",
                &self.aws_secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("bucket_name", &self.bucket_name)
            .field("table_name", &self.table_name)
            .field("frontend_url", &self.frontend_url)
            .field("endpoint_url", &self.endpoint_url)
            .field("serverless", &self.serverless)
            .finish()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("S3_BUCKET_NAME", "photos"),
        ("DYNAMODB_TABLE_NAME", "image-metadata"),
    ];

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let cfg = AppConfig::resolve(Args::default(), lookup(&REQUIRED)).unwrap();

        assert_eq!(cfg.addr(), "0.0.0.0:5000");
        assert_eq!(cfg.aws_region, "us-east-1");
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.allowed_origin(), LOCAL_FRONTEND_ORIGIN);
        assert!(cfg.static_credentials().is_none());
        assert!(!cfg.serverless);
        assert_eq!(
            cfg.public_url_base(),
            "https://photos.s3.us-east-1.amazonaws.com"
        );
    }

    #[test]
    fn missing_bucket_is_an_error() {
        let err = AppConfig::resolve(
            Args::default(),
            lookup(&[("DYNAMODB_TABLE_NAME", "image-metadata")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET_NAME"));
    }

    #[test]
    fn production_uses_frontend_origin() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("APP_ENV", "production"));
        vars.push(("FRONTEND_URL", "https://gallery.example.com"));

        let cfg = AppConfig::resolve(Args::default(), lookup(&vars)).unwrap();
        assert_eq!(cfg.allowed_origin(), "https://gallery.example.com");
    }

    #[test]
    fn production_without_frontend_origin_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("APP_ENV", "production"));

        assert!(AppConfig::resolve(Args::default(), lookup(&vars)).is_err());
    }

    #[test]
    fn frontend_origin_is_ignored_outside_production() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("FRONTEND_URL", "https://gallery.example.com"));

        let cfg = AppConfig::resolve(Args::default(), lookup(&vars)).unwrap();
        assert_eq!(cfg.allowed_origin(), LOCAL_FRONTEND_ORIGIN);
    }

    #[test]
    fn cli_args_override_environment() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "8080"));
        vars.push(("AWS_REGION", "eu-west-1"));

        let args = Args::try_parse_from([
            "image-gateway",
            "--port",
            "9090",
            "--bucket",
            "other-bucket",
            "--serverless",
        ])
        .unwrap();
        let cfg = AppConfig::resolve(args, lookup(&vars)).unwrap();

        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.bucket_name, "other-bucket");
        assert_eq!(cfg.aws_region, "eu-west-1");
        assert!(cfg.serverless);
    }

    #[test]
    fn invalid_port_reports_the_value() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "eighty"));

        let err = AppConfig::resolve(Args::default(), lookup(&vars)).unwrap_err();
        assert!(format!("{err:#}").contains("eighty"));
    }

    #[test]
    fn serverless_flag_and_static_credentials_from_env() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SERVERLESS", "TRUE"));
        vars.push(("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"));
        vars.push(("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI"));

        let cfg = AppConfig::resolve(Args::default(), lookup(&vars)).unwrap();
        assert!(cfg.serverless);
        assert_eq!(
            cfg.static_credentials(),
            Some(("AKIDEXAMPLE", "wJalrXUtnFEMI"))
        );
        assert!(!format!("{cfg:?}").contains("wJalrXUtnFEMI"));
    }
}

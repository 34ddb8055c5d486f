use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub manifest: PathBuf,
    pub sync_interval: Duration,
    pub host: String,
    pub port: u16,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Declarative reconciler for InfluxDB organizations, buckets and DBRPs")]
pub struct Args {
    /// InfluxDB base URL (overrides INFLUXDB_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// API token (overrides INFLUXDB_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Manifest of desired resources (overrides RECONCILER_MANIFEST)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Seconds between reconciliation passes (overrides RECONCILER_SYNC_INTERVAL_SECS)
    #[arg(long)]
    pub sync_interval_secs: Option<u64>,

    /// Host for the status server (overrides RECONCILER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port for the status server (overrides RECONCILER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Run a single reconciliation pass and exit
    #[arg(long)]
    pub once: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the once flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let once = args.once;
        Ok((Self::merge(args)?, once))
    }

    fn merge(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_endpoint =
            env::var("INFLUXDB_ENDPOINT").unwrap_or_else(|_| "http://localhost:8086".into());
        let env_token = env::var("INFLUXDB_TOKEN").ok();
        let env_manifest =
            env::var("RECONCILER_MANIFEST").unwrap_or_else(|_| "./resources.json".into());
        let env_interval = parse_var(
            "RECONCILER_SYNC_INTERVAL_SECS",
            env::var("RECONCILER_SYNC_INTERVAL_SECS"),
            60_u64,
        )?;
        let env_host = env::var("RECONCILER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_var("RECONCILER_PORT", env::var("RECONCILER_PORT"), 8080_u16)?;

        let interval_secs = args.sync_interval_secs.unwrap_or(env_interval);
        anyhow::ensure!(interval_secs > 0, "sync interval must be at least one second");

        // --- Merge ---
        Ok(Self {
            endpoint: args
                .endpoint
                .unwrap_or(env_endpoint)
                .trim_end_matches('/')
                .to_string(),
            token: args.token.or(env_token).filter(|t| !t.is_empty()),
            manifest: args.manifest.unwrap_or_else(|| env_manifest.into()),
            sync_interval: Duration::from_secs(interval_secs),
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse an optional numeric environment value, falling back to `default`
/// when the variable is not set.
fn parse_var<T>(key: &str, raw: Result<String, env::VarError>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment() {
        let args = Args::parse_from([
            "influxdb-reconciler",
            "--endpoint",
            "http://influx:8086/",
            "--token",
            "secret",
            "--manifest",
            "/etc/reconciler/resources.json",
            "--sync-interval-secs",
            "5",
            "--host",
            "127.0.0.1",
            "--port",
            "9090",
            "--once",
        ]);
        assert!(args.once);

        let cfg = AppConfig::merge(args).unwrap();
        assert_eq!(cfg.endpoint, "http://influx:8086");
        assert_eq!(cfg.token.as_deref(), Some("secret"));
        assert_eq!(cfg.manifest, PathBuf::from("/etc/reconciler/resources.json"));
        assert_eq!(cfg.sync_interval, Duration::from_secs(5));
        assert_eq!(cfg.addr(), "127.0.0.1:9090");
    }

    #[test]
    fn numeric_env_values_are_validated() {
        assert_eq!(parse_var("P", Err(env::VarError::NotPresent), 8080_u16).unwrap(), 8080);
        assert_eq!(parse_var("P", Ok("9000".into()), 8080_u16).unwrap(), 9000);

        let err = parse_var("RECONCILER_PORT", Ok("http".into()), 8080_u16).unwrap_err();
        assert!(err.to_string().contains("RECONCILER_PORT"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let args = Args::parse_from(["influxdb-reconciler", "--sync-interval-secs", "0"]);
        assert!(AppConfig::merge(args).is_err());
    }
}

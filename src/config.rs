//! Configuration Module
//!
//! Handles loading server configuration from environment variables and the
//! positional command-line arguments.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::cache::DEFAULT_MAX_CACHE_BYTES;

/// Usage line printed when the arguments are wrong.
pub const USAGE: &str = "usage: slurp_server <serve-directory> <listen-port>";

/// Server tuning parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Byte budget of the file cache
    pub max_cache_bytes: usize,
    /// Capacity of each coordinator request queue
    pub queue_depth: usize,
    /// Seconds to wait for a streamed file to finish before giving up on caching it
    pub completion_timeout: u64,
    /// Seconds a client gets to send its full name frame
    pub request_timeout: u64,
    /// Admin HTTP port; the admin API is off when unset
    pub admin_port: Option<u16>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_CACHE_BYTES` - Cache byte budget (default: 60 MiB)
    /// - `QUEUE_DEPTH` - Coordinator queue capacity (default: 16)
    /// - `COMPLETION_TIMEOUT` - Stream completion timeout in seconds (default: 300)
    /// - `REQUEST_TIMEOUT` - Name frame read timeout in seconds (default: 10)
    /// - `ADMIN_PORT` - Admin HTTP API port (default: disabled)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_cache_bytes: env::var("MAX_CACHE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_cache_bytes),
            queue_depth: env::var("QUEUE_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&depth| depth > 0)
                .unwrap_or(defaults.queue_depth),
            completion_timeout: env::var("COMPLETION_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.completion_timeout),
            request_timeout: env::var("REQUEST_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or(defaults.request_timeout),
            admin_port: env::var("ADMIN_PORT").ok().and_then(|v| v.parse().ok()),
        }
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cache_bytes: DEFAULT_MAX_CACHE_BYTES,
            queue_depth: 16,
            completion_timeout: 300,
            request_timeout: 10,
            admin_port: None,
        }
    }
}

// == Command Line ==
/// Positional arguments: the directory to serve and where to listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeArgs {
    pub serve_dir: PathBuf,
    pub listen_addr: String,
}

impl ServeArgs {
    /// Parses `<serve-directory> <listen-port>` (program name already removed).
    pub fn parse<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        let [serve_dir, listen] = args.as_slice() else {
            bail!("expected two arguments, got {}; {}", args.len(), USAGE);
        };
        Ok(Self {
            serve_dir: PathBuf::from(serve_dir),
            listen_addr: listen_addr(listen)?,
        })
    }

    /// Checks that the serve directory exists, is a directory and can be read.
    pub fn check_serve_dir(&self) -> anyhow::Result<()> {
        let dir = self.serve_dir.display();
        let metadata = std::fs::metadata(&self.serve_dir)
            .with_context(|| format!("{} could not be opened", dir))?;
        if !metadata.is_dir() {
            bail!("{} is not a directory; {}", dir, USAGE);
        }
        std::fs::read_dir(&self.serve_dir)
            .with_context(|| format!("{} could not be read", dir))?;
        Ok(())
    }
}

/// Turns `8080`, `:8080` or `host:port` into a bindable address.
pub fn listen_addr(raw: &str) -> anyhow::Result<String> {
    let port_only = raw.strip_prefix(':').unwrap_or(raw);
    if let Ok(port) = port_only.parse::<u16>() {
        return Ok(format!("0.0.0.0:{}", port));
    }
    match raw.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
            Ok(raw.to_string())
        }
        _ => bail!("invalid listen port {:?}; {}", raw, USAGE),
    }
}

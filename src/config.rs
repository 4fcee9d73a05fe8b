//! Server configuration.
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional YAML file (`--config`), then command-line flags.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use serde::Deserialize;

use crate::server::pool::DEFAULT_POOL_SIZE;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub threads: usize,
    /// Defaults to `threads` when unset.
    pub queue_capacity: Option<usize>,
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 0,
            threads: DEFAULT_POOL_SIZE,
            queue_capacity: None,
            root: PathBuf::from("."),
        }
    }
}

/// Concurrent GET/PUT file server.
#[derive(Debug, Parser)]
#[command(name = "fileserve", version, about)]
pub struct Cli {
    /// Number of worker threads
    #[arg(short = 't', long, value_parser = parse_positive)]
    pub threads: Option<usize>,

    /// Capacity of the accept queue (defaults to the thread count)
    #[arg(short = 'q', long, value_parser = parse_positive)]
    pub queue_capacity: Option<usize>,

    /// Directory that request paths are resolved against
    #[arg(short, long, env = "FILESERVE_ROOT")]
    pub root: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,
}

impl ServerConfig {
    /// Builds the effective configuration from parsed arguments.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut cfg = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        cfg.port = cli.port;
        if let Some(threads) = cli.threads {
            cfg.threads = threads;
        }
        if let Some(capacity) = cli.queue_capacity {
            cfg.queue_capacity = Some(capacity);
        }
        if let Some(root) = &cli.root {
            cfg.root = root.clone();
        }
        if let Some(bind) = cli.bind {
            cfg.bind = bind;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.threads == 0 {
            bail!("threads must be at least 1");
        }
        if self.queue_capacity == Some(0) {
            bail!("queue_capacity must be at least 1");
        }
        if !self.root.is_dir() {
            bail!("root {} is not a directory", self.root.display());
        }
        Ok(())
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.threads)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

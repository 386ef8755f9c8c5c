//! Server configuration from `READMODE_*` environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use readmode_core::{PipelineConfig, RetrievalStrategy};

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub pipeline: PipelineConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let addr_value = lookup("READMODE_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_value.parse().with_context(|| format!("invalid READMODE_ADDR '{addr_value}'"))?;

        let mut builder = PipelineConfig::builder();

        if let Some(secs) = lookup("READMODE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().with_context(|| format!("invalid READMODE_TIMEOUT_SECS '{secs}'"))?;
            builder = builder.overall_timeout(Duration::from_secs(secs));
        }
        if let Some(list) = lookup("READMODE_STRATEGIES") {
            let strategies = RetrievalStrategy::parse_list(&list)
                .map_err(anyhow::Error::msg)
                .context("invalid READMODE_STRATEGIES")?;
            builder = builder.retrieval_strategies(strategies);
        }
        if let Some(template) = lookup("READMODE_READER_PROXY") {
            builder = builder.reader_proxy(template);
        }
        if let Some(template) = lookup("READMODE_WEB_PROXY") {
            builder = builder.web_proxy(template);
        }
        if let Some(template) = lookup("READMODE_ARCHIVE_API") {
            builder = builder.archive_api(template);
        }
        if let Some(flag) = lookup("READMODE_DEGRADED") {
            builder = builder.degraded_acceptance(parse_flag(&flag).context("invalid READMODE_DEGRADED")?);
        }

        Ok(Self { addr, pipeline: builder.build() })
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected true or false, got '{other}'"),
    }
}

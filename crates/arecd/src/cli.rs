// Command-line configuration for arecd
//
// Everything is a flag; the token may also come from `CLOUDFLARE_TOKEN` so it
// stays out of the process list.

use anyhow::Result;
use arec_core::{DdnsConfig, EngineConfig, RecordConfig};
use arec_ip_http::DEFAULT_TRACE_URL;
use clap::Parser;
use std::time::Duration;

/// Keep a Cloudflare A record pointed at this host's public IPv4 address
#[derive(Debug, Parser)]
#[command(name = "arecd", version, about)]
pub struct Args {
    /// Zone the record lives in, e.g. example.com
    #[arg(long = "zone-name", alias = "zoneName", value_name = "ZONE")]
    pub zone_name: String,

    /// Fully-qualified record to manage, e.g. home.example.com
    #[arg(long = "record-name", alias = "recordName", value_name = "RECORD")]
    pub record_name: String,

    /// Cloudflare API token
    #[arg(long, env = "CLOUDFLARE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Time between checks (e.g. 90s, 2m, 1h30m; bare numbers are seconds)
    #[arg(long, default_value = "1m", value_parser = parse_duration)]
    pub interval: Duration,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// TTL for a newly created record, in seconds
    #[arg(long, default_value_t = 60)]
    pub ttl: u32,

    /// Upper bound for one setup attempt or update cycle
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub cycle_timeout: Duration,

    /// Delay between failed setup attempts
    #[arg(long, default_value = "1m", value_parser = parse_duration)]
    pub setup_retry_delay: Duration,

    /// IP-echo endpoint answering with key=value lines
    #[arg(long, default_value = DEFAULT_TRACE_URL)]
    pub ip_url: String,
}

impl Args {
    /// Validate the flags and assemble the engine configuration
    ///
    /// Returns the configuration together with the API token.
    pub fn into_config(self) -> Result<(DdnsConfig, String)> {
        let token = self.token.unwrap_or_default();
        if token.trim().is_empty() {
            anyhow::bail!(
                "Cloudflare API token is required. \
                Pass --token or set it via: export CLOUDFLARE_TOKEN=your_token"
            );
        }

        validate_domain_name(&self.zone_name)?;
        validate_domain_name(&self.record_name)?;

        if !self.ip_url.starts_with("https://") && !self.ip_url.starts_with("http://") {
            anyhow::bail!("--ip-url must use HTTP or HTTPS scheme. Got: {}", self.ip_url);
        }

        let config = DdnsConfig {
            record: RecordConfig::new(self.zone_name, self.record_name).with_ttl(self.ttl),
            engine: EngineConfig {
                interval_secs: self.interval.as_secs(),
                cycle_timeout_secs: self.cycle_timeout.as_secs(),
                bootstrap_timeout_secs: self.cycle_timeout.as_secs(),
                bootstrap_retry_delay_secs: self.setup_retry_delay.as_secs(),
                ..EngineConfig::default()
            },
        };
        config.validate()?;

        Ok((config, token))
    }
}

/// Parse durations like `90s`, `2m`, `1h30m` or a bare number of seconds
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    if let Ok(secs) = input.parse::<u64>() {
        return positive(secs, input);
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            _ => return Err(format!("unknown unit '{}' in duration '{}'", c, input)),
        };
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("missing number before '{}' in duration '{}'", c, input))?;
        total = value
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| format!("duration '{}' is too large", input))?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(format!("missing unit after '{}' in duration '{}'", digits, input));
    }

    positive(total, input)
}

fn positive(secs: u64, input: &str) -> Result<Duration, String> {
    if secs == 0 {
        return Err(format!("duration '{}' must be at least one second", input));
    }
    Ok(Duration::from_secs(secs))
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// A single trailing dot is accepted.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::pipeline::DEFAULT_SHUTDOWN_TIMEOUT;

/// Configuration for the fn_enricher module (`modules.fn_enricher`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FnEnricherConfig {
    #[serde(default = "default_brokers")]
    pub brokers: Vec<String>,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_rejection_topic")]
    pub rejection_topic: String,
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,
    #[serde(default = "default_workers_count")]
    pub workers_count: usize,
    #[serde(default = "default_age_url")]
    pub age_url: String,
    #[serde(default = "default_gender_url")]
    pub gender_url: String,
    #[serde(default = "default_nationality_url")]
    pub nationality_url: String,
    #[serde(default = "default_lookup_timeout", with = "humantime_serde")]
    pub lookup_timeout: Duration,
    #[serde(default = "default_rejection_send_timeout", with = "humantime_serde")]
    pub rejection_send_timeout: Duration,
    #[serde(default = "default_shutdown_timeout", with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for FnEnricherConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            topic: default_topic(),
            rejection_topic: default_rejection_topic(),
            consumer_group: default_consumer_group(),
            workers_count: default_workers_count(),
            age_url: default_age_url(),
            gender_url: default_gender_url(),
            nationality_url: default_nationality_url(),
            lookup_timeout: default_lookup_timeout(),
            rejection_send_timeout: default_rejection_send_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl FnEnricherConfig {
    /// Reject settings the service cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.brokers.iter().all(|b| b.trim().is_empty()) {
            bail!("fn_enricher.brokers must list at least one broker");
        }
        if self.topic.is_empty() {
            bail!("fn_enricher.topic must not be empty");
        }
        if self.rejection_topic.is_empty() {
            bail!("fn_enricher.rejection_topic must not be empty");
        }
        if self.workers_count == 0 {
            bail!("fn_enricher.workers_count must be at least 1");
        }
        for (key, raw) in [
            ("age_url", &self.age_url),
            ("gender_url", &self.gender_url),
            ("nationality_url", &self.nationality_url),
        ] {
            parse_endpoint(key, raw)?;
        }
        Ok(())
    }

    pub fn age_endpoint(&self) -> anyhow::Result<Url> {
        parse_endpoint("age_url", &self.age_url)
    }

    pub fn gender_endpoint(&self) -> anyhow::Result<Url> {
        parse_endpoint("gender_url", &self.gender_url)
    }

    pub fn nationality_endpoint(&self) -> anyhow::Result<Url> {
        parse_endpoint("nationality_url", &self.nationality_url)
    }
}

fn parse_endpoint(key: &str, raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("fn_enricher.{key} is not a valid URL"))?;
    if url.cannot_be_a_base() {
        bail!("fn_enricher.{key} cannot be used as a base URL: {raw}");
    }
    Ok(url)
}

fn default_brokers() -> Vec<String> {
    vec!["localhost:9092".to_string()]
}

fn default_topic() -> String {
    "FN".to_string()
}

fn default_rejection_topic() -> String {
    "WRONG_FN".to_string()
}

fn default_consumer_group() -> String {
    "fn_enricher".to_string()
}

fn default_workers_count() -> usize {
    1
}

fn default_age_url() -> String {
    "https://api.agify.io/?name=".to_string()
}

fn default_gender_url() -> String {
    "https://api.genderize.io/?name=".to_string()
}

fn default_nationality_url() -> String {
    "https://api.nationalize.io/?name=".to_string()
}

fn default_lookup_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_rejection_send_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_shutdown_timeout() -> Duration {
    DEFAULT_SHUTDOWN_TIMEOUT
}

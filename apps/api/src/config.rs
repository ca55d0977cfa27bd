use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::{LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, MAX_RETRIES_CAP};
use crate::ranking::generative::{FailurePolicy, GenerativeConfig, GenerativeMode};
use crate::ranking::ScoringStrategy;

/// Application configuration loaded from environment variables.
/// Start-up fails if a value is present but invalid, or if the generative
/// strategy is selected without an API key.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub strategy: ScoringStrategy,
    /// Default shortlist size when a request does not carry its own.
    pub top_k: i64,
    pub generative: GenerativeConfig,
    pub llm: LlmConfig,
    pub candidates_file: PathBuf,
    /// When set, the roster is read from PostgreSQL instead of `candidates_file`.
    pub database_url: Option<String>,
    pub candidate_cache: bool,
    /// Fixed seed for the heuristic tie-break perturbation. `None` = entropy.
    pub heuristic_seed: Option<u64>,
    /// `false` turns the tie-break perturbation off entirely.
    pub heuristic_jitter: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let strategy: ScoringStrategy = parse_or(&lookup, "MATCH_STRATEGY", ScoringStrategy::Heuristic)?;

        let top_k: i64 = parse_or(&lookup, "MATCH_TOP_K", 3)?;
        if top_k < 0 {
            bail!("MATCH_TOP_K must be >= 0, got {top_k}");
        }

        let concurrency: usize = parse_or(&lookup, "LLM_CONCURRENCY", 4)?;
        if concurrency == 0 {
            bail!("LLM_CONCURRENCY must be at least 1");
        }

        let timeout_secs: u64 = parse_or(&lookup, "LLM_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            bail!("LLM_TIMEOUT_SECS must be at least 1");
        }

        let max_retries: u32 = parse_or(&lookup, "LLM_MAX_RETRIES", 2)?;
        if max_retries > MAX_RETRIES_CAP {
            bail!("LLM_MAX_RETRIES must be <= {MAX_RETRIES_CAP}, got {max_retries}");
        }

        let batch_top_n = match lookup("BATCH_TOP_N") {
            Some(raw) => Some(
                raw.parse::<usize>()
                    .with_context(|| format!("BATCH_TOP_N must be a non-negative integer, got '{raw}'"))?,
            ),
            None => None,
        };

        let heuristic_seed = match lookup("HEURISTIC_SEED") {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("HEURISTIC_SEED must be an unsigned integer, got '{raw}'"))?,
            ),
            None => None,
        };

        let api_key = lookup("LLM_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        if strategy == ScoringStrategy::Generative && api_key.is_none() {
            bail!("Required environment variable 'LLM_API_KEY' (or 'OPENAI_API_KEY') is not set");
        }

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            strategy,
            top_k,
            generative: GenerativeConfig {
                mode: parse_or(&lookup, "GENERATIVE_MODE", GenerativeMode::Batch)?,
                failure_policy: parse_or(&lookup, "PARTIAL_FAILURE_POLICY", FailurePolicy::Skip)?,
                batch_top_n,
                max_output_tokens: parse_or(&lookup, "LLM_MAX_OUTPUT_TOKENS", 1500)?,
                concurrency,
                call_timeout: Duration::from_secs(timeout_secs),
            },
            llm: LlmConfig {
                api_key: api_key.unwrap_or_default(),
                base_url: lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_retries,
                backoff_base: Duration::from_secs(1),
            },
            candidates_file: lookup("CANDIDATES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/candidates.json")),
            database_url: lookup("DATABASE_URL"),
            candidate_cache: parse_or(&lookup, "CANDIDATE_CACHE", false)?,
            heuristic_seed,
            heuristic_jitter: parse_or(&lookup, "HEURISTIC_JITTER", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.strategy, ScoringStrategy::Heuristic);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.generative.mode, GenerativeMode::Batch);
        assert_eq!(config.generative.failure_policy, FailurePolicy::Skip);
        assert_eq!(config.generative.concurrency, 4);
        assert_eq!(config.generative.call_timeout, Duration::from_secs(30));
        assert_eq!(config.llm.max_retries, 2);
        assert!(config.database_url.is_none());
        assert!(!config.candidate_cache);
        assert!(config.heuristic_seed.is_none());
        assert!(config.heuristic_jitter);
    }

    #[test]
    fn test_generative_requires_api_key() {
        assert!(load(&[("MATCH_STRATEGY", "generative")]).is_err());

        let config = load(&[
            ("MATCH_STRATEGY", "generative"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert_eq!(config.strategy, ScoringStrategy::Generative);
        assert_eq!(config.llm.api_key, "sk-test");
    }

    #[test]
    fn test_generative_options_parse() {
        let config = load(&[
            ("MATCH_STRATEGY", "generative"),
            ("LLM_API_KEY", "sk-test"),
            ("GENERATIVE_MODE", "per_candidate"),
            ("PARTIAL_FAILURE_POLICY", "fail_fast"),
            ("LLM_CONCURRENCY", "8"),
            ("LLM_TIMEOUT_SECS", "10"),
            ("BATCH_TOP_N", "5"),
        ])
        .unwrap();
        assert_eq!(config.generative.mode, GenerativeMode::PerCandidate);
        assert_eq!(config.generative.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.generative.concurrency, 8);
        assert_eq!(config.generative.call_timeout, Duration::from_secs(10));
        assert_eq!(config.generative.batch_top_n, Some(5));
    }

    #[test]
    fn test_invalid_values_fail_startup() {
        assert!(load(&[("MATCH_TOP_K", "-1")]).is_err());
        assert!(load(&[("MATCH_TOP_K", "three")]).is_err());
        assert!(load(&[("LLM_CONCURRENCY", "0")]).is_err());
        assert!(load(&[("LLM_MAX_RETRIES", "50")]).is_err());
        assert!(load(&[("MATCH_STRATEGY", "magic")]).is_err());
        assert!(load(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn test_seed_and_store_settings() {
        let config = load(&[
            ("HEURISTIC_SEED", "42"),
            ("DATABASE_URL", "postgres://localhost/talent"),
            ("CANDIDATE_CACHE", "true"),
            ("HEURISTIC_JITTER", "false"),
        ])
        .unwrap();
        assert_eq!(config.heuristic_seed, Some(42));
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/talent")
        );
        assert!(config.candidate_cache);
        assert!(!config.heuristic_jitter);
    }
}

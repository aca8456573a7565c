use crate::error::ConfigError;

/// Process configuration, built once at startup and passed by reference into
/// the components that need it. Nothing in the core reads the environment
/// after construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,

    /// Corporation id applicants must belong to.
    pub corp_id: i64,

    /// Public base URL of the portal, used in activation/recovery links.
    pub public_url: String,

    /// Maximum age of an outstanding recovery code, in seconds.
    pub recovery_ttl_secs: i64,

    /// Lifetime of a pending registration held between the verify and
    /// confirm steps, in seconds.
    pub session_ttl_secs: i64,

    /// Upper bound on the character API round trip, in seconds.
    pub verifier_timeout_secs: u64,

    /// Override for the character API endpoint; the production default is
    /// used when unset.
    pub verifier_url: Option<String>,

    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: Option<String>,
}

const DEFAULT_RECOVERY_TTL_SECS: i64 = 86_400;
const DEFAULT_SESSION_TTL_SECS: i64 = 1_800;
const DEFAULT_VERIFIER_TIMEOUT_SECS: u64 = 10;

/// Values may arrive quoted from dotenv-style tooling; strip one layer of
/// matched quotes and surrounding whitespace. Empty means unset.
pub fn normalize_value(raw: String) -> String {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return inner.trim().to_string();
    }

    trimmed.to_string()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(normalize_value)
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            corp_id: parse_i64("CORP_ID", require("CORP_ID")?)?,
            public_url: require("PUBLIC_URL")?
                .trim_end_matches('/')
                .to_string(),
            recovery_ttl_secs: match get("RECOVERY_TTL_SECS") {
                Some(v) => parse_i64("RECOVERY_TTL_SECS", v)?,
                None => DEFAULT_RECOVERY_TTL_SECS,
            },
            session_ttl_secs: match get("SESSION_TTL_SECS") {
                Some(v) => parse_i64("SESSION_TTL_SECS", v)?,
                None => DEFAULT_SESSION_TTL_SECS,
            },
            verifier_timeout_secs: match get("VERIFIER_TIMEOUT_SECS") {
                Some(v) => parse_u64("VERIFIER_TIMEOUT_SECS", v)?,
                None => DEFAULT_VERIFIER_TIMEOUT_SECS,
            },
            verifier_url: get("VERIFIER_URL"),
            mail: MailConfig {
                api_key: require("BREVO_API_KEY")?,
                sender_email: require("BREVO_SENDER_EMAIL")?,
                sender_name: get("BREVO_SENDER_NAME"),
            },
        })
    }
}

fn parse_i64(key: &'static str, value: String) -> Result<i64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn parse_u64(key: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("CORP_ID", "98000001"),
            ("PUBLIC_URL", "https://portal.example.com/"),
            ("BREVO_API_KEY", "key"),
            ("BREVO_SENDER_EMAIL", "noreply@example.com"),
        ])
    }

    fn build(vars: HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn normalize_strips_quotes_and_whitespace() {
        assert_eq!(normalize_value("  plain  ".into()), "plain");
        assert_eq!(normalize_value("\" quoted \"".into()), "quoted");
        assert_eq!(normalize_value("'single'".into()), "single");
        assert_eq!(normalize_value("\"unbalanced".into()), "\"unbalanced");
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = build(base_vars()).unwrap();
        assert_eq!(config.corp_id, 98000001);
        assert_eq!(config.recovery_ttl_secs, 86_400);
        assert_eq!(config.session_ttl_secs, 1_800);
        assert_eq!(config.verifier_timeout_secs, 10);
        assert!(config.verifier_url.is_none());
        // Trailing slash is dropped so link joining stays predictable.
        assert_eq!(config.public_url, "https://portal.example.com");
    }

    #[test]
    fn missing_required_key_is_reported() {
        let mut vars = base_vars();
        vars.remove("CORP_ID");
        assert!(matches!(
            build(vars),
            Err(ConfigError::Missing("CORP_ID"))
        ));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("BREVO_API_KEY", "  ");
        assert!(matches!(
            build(vars),
            Err(ConfigError::Missing("BREVO_API_KEY"))
        ));
    }

    #[test]
    fn non_numeric_corp_id_is_rejected() {
        let mut vars = base_vars();
        vars.insert("CORP_ID", "not-a-number");
        assert!(matches!(
            build(vars),
            Err(ConfigError::Invalid { key: "CORP_ID", .. })
        ));
    }
}

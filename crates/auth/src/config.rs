//! Runtime configuration for the access gate, read from the environment.

/// Which gate decisions are written to the log.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DecisionLog {
    Off,
    #[default]
    Denied,
    All,
}

impl DecisionLog {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Some(DecisionLog::Off),
            "denied" => Some(DecisionLog::Denied),
            "all" => Some(DecisionLog::All),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct AuthzConfig {
    pub decision_log: DecisionLog,
    /// Attach a full per-grant explanation to every denial.
    pub explain_denials: bool,
}

pub const DECISION_LOG_VAR: &str = "KEYSTONE_AUTHZ_DECISION_LOG";
pub const EXPLAIN_DENIALS_VAR: &str = "KEYSTONE_AUTHZ_EXPLAIN_DENIALS";

impl AuthzConfig {
    /// Read `KEYSTONE_AUTHZ_DECISION_LOG` and `KEYSTONE_AUTHZ_EXPLAIN_DENIALS`.
    ///
    /// Unset or invalid values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(DECISION_LOG_VAR) {
            match DecisionLog::parse(&raw) {
                Some(level) => config.decision_log = level,
                None => tracing::warn!(value = %raw, "{DECISION_LOG_VAR} not recognized; using default"),
            }
        }

        if let Some(raw) = lookup(EXPLAIN_DENIALS_VAR) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.explain_denials = true,
                "0" | "false" | "no" => config.explain_denials = false,
                _ => tracing::warn!(value = %raw, "{EXPLAIN_DENIALS_VAR} not recognized; using default"),
            }
        }

        config
    }
}

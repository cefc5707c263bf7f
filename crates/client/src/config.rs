use common::{Environment, env_opt};
use std::{path::PathBuf, time::Duration};

/// Where the service listens when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/predict";

/// Preferred label font; system fonts are tried after it.
pub const DEFAULT_FONT_PATH: &str = "arial.ttf";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    pub endpoint: String,
    pub font_path: PathBuf,
    /// `None` waits for the service indefinitely.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let timeout = match env_opt("CLIENT_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("CLIENT_TIMEOUT_SECS={raw:?}: {e}"))?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            environment: Environment::from_env(),
            endpoint: env_opt("PREDICT_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            font_path: env_opt("FONT_PATH")
                .unwrap_or_else(|| DEFAULT_FONT_PATH.to_string())
                .into(),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear() {
        unsafe {
            env::remove_var("PREDICT_ENDPOINT");
            env::remove_var("FONT_PATH");
            env::remove_var("CLIENT_TIMEOUT_SECS");
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();

        let config = ClientConfig::from_env().unwrap();

        assert_eq!(config.endpoint, "http://localhost:8000/predict");
        assert_eq!(config.font_path, PathBuf::from("arial.ttf"));
        assert!(config.timeout.is_none());
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear();
        unsafe {
            env::set_var("PREDICT_ENDPOINT", "http://detector:9000/predict");
            env::set_var("CLIENT_TIMEOUT_SECS", "45");
        }

        let config = ClientConfig::from_env().unwrap();
        clear();

        assert_eq!(config.endpoint, "http://detector:9000/predict");
        assert_eq!(config.timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    #[serial]
    fn test_bad_timeout_is_rejected() {
        clear();
        unsafe {
            env::set_var("CLIENT_TIMEOUT_SECS", "soon");
        }

        let result = ClientConfig::from_env();
        clear();

        assert!(result.is_err());
    }
}

//! Session configuration: execution mode, cookie name and signing secrets.

use anyhow::{anyhow, Result};
use secrecy::SecretString;
use std::{fmt, str::FromStr};

pub const DEFAULT_COOKIE_NAME: &str = "AUTH";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(anyhow!("invalid environment: {other}")),
        }
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    environment: Environment,
    cookie_name: String,
    secrets: Vec<SecretString>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secrets: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cookie_name(mut self, cookie_name: String) -> Self {
        self.cookie_name = cookie_name;
        self
    }

    /// Signing secrets, newest first. The first one signs, all of them verify.
    #[must_use]
    pub fn with_secrets(mut self, secrets: Vec<SecretString>) -> Self {
        self.secrets = secrets;
        self
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn secrets(&self) -> &[SecretString] {
        &self.secrets
    }

    /// Cookies are only marked `Secure` in production.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.environment.is_production()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("environment", &self.environment)
            .field("cookie_name", &self.cookie_name)
            .field("secrets", &format_args!("[***; {}]", self.secrets.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_names() -> Result<()> {
        assert_eq!("production".parse::<Environment>()?, Environment::Production);
        assert_eq!(" Development ".parse::<Environment>()?, Environment::Development);
        assert!("staging".parse::<Environment>().is_err());
        Ok(())
    }

    #[test]
    fn cookie_secure_only_in_production() {
        assert!(!AuthConfig::new(Environment::Development).cookie_secure());
        assert!(AuthConfig::new(Environment::Production).cookie_secure());
    }

    #[test]
    fn debug_hides_secrets() {
        let config = AuthConfig::new(Environment::Production)
            .with_secrets(vec![SecretString::from("hunter2".to_string())]);
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[***; 1]"));
        assert_eq!(config.cookie_name(), DEFAULT_COOKIE_NAME);
    }
}

use crate::auth::{AuthConfig, Environment, DEFAULT_COOKIE_NAME};
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_COOKIE_NAME: &str = "cookie-name";
pub const ARG_AUTH_SECRET: &str = "auth-secret";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .short('e')
                .long("environment")
                .help("Execution mode: development or production")
                .long_help(
                    "Execution mode. Production marks the session cookie Secure and refuses to start without --auth-secret.",
                )
                .env("TIMEKEEP_ENV")
                .default_value("development")
                .value_parser(|value: &str| value.parse::<Environment>().map_err(|err| err.to_string())),
        )
        .arg(
            Arg::new(ARG_COOKIE_NAME)
                .long("cookie-name")
                .help("Session cookie name")
                .env("TIMEKEEP_COOKIE_NAME")
                .default_value(DEFAULT_COOKIE_NAME),
        )
        .arg(
            Arg::new(ARG_AUTH_SECRET)
                .long("auth-secret")
                .help("Session signing secrets, comma separated, newest first")
                .long_help(
                    "Session signing secrets, comma separated. The first secret signs new sessions, every secret is accepted when validating, which allows rotation.",
                )
                .env("TIMEKEEP_AUTH_SECRET")
                .hide_env_values(true)
                .value_delimiter(','),
        )
}

#[derive(Debug)]
pub struct Options {
    pub environment: Environment,
    pub cookie_name: String,
    pub secrets: Vec<SecretString>,
}

impl Options {
    /// Read auth arguments out of validated matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let environment = matches
            .get_one::<Environment>(ARG_ENVIRONMENT)
            .copied()
            .context("missing required argument: --environment")?;
        let cookie_name = matches
            .get_one::<String>(ARG_COOKIE_NAME)
            .cloned()
            .context("missing required argument: --cookie-name")?;
        let secrets = matches
            .get_many::<String>(ARG_AUTH_SECRET)
            .map(|values| {
                values
                    .map(|secret| secret.trim().to_string())
                    .filter(|secret| !secret.is_empty())
                    .map(SecretString::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            environment,
            cookie_name,
            secrets,
        })
    }

    #[must_use]
    pub fn into_config(self) -> AuthConfig {
        AuthConfig::new(self.environment)
            .with_cookie_name(self.cookie_name)
            .with_secrets(self.secrets)
    }
}

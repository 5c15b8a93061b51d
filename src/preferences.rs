//! Currency and timezone preferences owned by the registered user.
//!
//! Both sets are closed: the wizard offers exactly these options and the
//! database rejects anything else.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
}

impl Currency {
    pub const ALL: [Self; 3] = [Self::Gbp, Self::Usd, Self::Eur];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Gbp => "GBP",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gbp => "Great British Pound",
            Self::Usd => "United States Dollar",
            Self::Eur => "Euro",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Gbp => "£",
            Self::Usd => "$",
            Self::Eur => "€",
        }
    }

    /// Display template; `{amount}` is replaced by the formatted value.
    #[must_use]
    pub const fn format(self) -> &'static str {
        match self {
            Self::Gbp => "£{amount}",
            Self::Usd => "${amount}",
            Self::Eur => "€{amount}",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = UnknownCode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|currency| currency.code() == value)
            .ok_or_else(|| UnknownCode(value.to_string()))
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timezone {
    #[serde(rename = "GMT")]
    Gmt,
    #[serde(rename = "EST")]
    Est,
    #[serde(rename = "PST")]
    Pst,
    #[serde(rename = "CET")]
    Cet,
}

impl Timezone {
    pub const ALL: [Self; 4] = [Self::Gmt, Self::Est, Self::Pst, Self::Cet];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Gmt => "GMT",
            Self::Est => "EST",
            Self::Pst => "PST",
            Self::Cet => "CET",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gmt => "Greenwich Mean Time",
            Self::Est => "Eastern Time (US & Canada)",
            Self::Pst => "Pacific Time (US & Canada)",
            Self::Cet => "Central European Time",
        }
    }

    #[must_use]
    pub const fn iana(self) -> &'static str {
        match self {
            Self::Gmt => "Etc/GMT",
            Self::Est => "America/New_York",
            Self::Pst => "America/Los_Angeles",
            Self::Cet => "Europe/Berlin",
        }
    }

    /// Clock format used when displaying times in this zone.
    #[must_use]
    pub const fn clock_format(self) -> &'static str {
        match self {
            Self::Gmt | Self::Cet => "HH:mm z",
            Self::Est | Self::Pst => "h:mm a z",
        }
    }

    #[must_use]
    pub const fn uses_dst(self) -> bool {
        !matches!(self, Self::Gmt)
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Timezone {
    type Err = UnknownCode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|timezone| timezone.code() == value)
            .ok_or_else(|| UnknownCode(value.to_string()))
    }
}

/// A code outside the supported enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown code: {0}")]
pub struct UnknownCode(pub String);

/// Preferences created together with the user.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub currency: Currency,
    pub timezone: Timezone,
}

/// Currency select option as rendered by the registration wizard.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CurrencyOption {
    pub code: Currency,
    pub name: String,
    pub symbol: String,
    pub format: String,
}

impl From<Currency> for CurrencyOption {
    fn from(currency: Currency) -> Self {
        Self {
            code: currency,
            name: currency.name().to_string(),
            symbol: currency.symbol().to_string(),
            format: currency.format().to_string(),
        }
    }
}

/// Timezone select option as rendered by the registration wizard.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TimezoneOption {
    pub code: Timezone,
    pub name: String,
    pub iana: String,
    pub format: String,
    pub uses_dst: bool,
}

impl From<Timezone> for TimezoneOption {
    fn from(timezone: Timezone) -> Self {
        Self {
            code: timezone,
            name: timezone.name().to_string(),
            iana: timezone.iana().to_string(),
            format: timezone.clock_format().to_string(),
            uses_dst: timezone.uses_dst(),
        }
    }
}

#[must_use]
pub fn currency_options() -> Vec<CurrencyOption> {
    Currency::ALL.into_iter().map(CurrencyOption::from).collect()
}

#[must_use]
pub fn timezone_options() -> Vec<TimezoneOption> {
    Timezone::ALL.into_iter().map(TimezoneOption::from).collect()
}

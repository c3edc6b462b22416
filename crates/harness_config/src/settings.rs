use crate::errors::Error;
use core::fmt::Display;
use log::warn;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Value of a harness setting. On disk every value carries a one letter type prefix:
///
/// ```text
/// b:true  i:-12  u:3000  s:Data state  m:xmlViolation.test,other.test
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Setting {
    SInt(isize),
    UInt(usize),
    String(String),
    Bool(bool),
    /// List of strings, comma separated on disk. `m:` is the empty list.
    Map(Vec<String>),
}

impl Setting {
    fn kind(&self) -> &'static str {
        match self {
            Self::SInt(_) => "signed integer",
            Self::UInt(_) => "unsigned integer",
            Self::String(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Map(_) => "map",
        }
    }

    /// Conversions never fail, but a setting read as another type than it holds is most likely
    /// a mistake in a settings file.
    fn expect_kind(&self, wanted: &str) {
        if self.kind() != wanted {
            warn!("config: {} setting {self} is read as {wanted}", self.kind());
        }
    }

    #[must_use]
    pub fn to_bool(&self) -> bool {
        self.expect_kind("boolean");

        match self {
            Self::Bool(value) => *value,
            Self::String(value) => {
                matches!(value.to_ascii_lowercase().as_str(), "yes" | "on" | "true" | "1")
            }
            Self::SInt(value) => *value != 0,
            Self::UInt(value) => *value != 0,
            Self::Map(values) => !values.is_empty(),
        }
    }

    #[must_use]
    pub fn to_uint(&self) -> usize {
        self.expect_kind("unsigned integer");

        match self {
            Self::UInt(value) => *value,
            Self::SInt(value) => usize::try_from(*value).unwrap_or(0),
            Self::Bool(value) => usize::from(*value),
            Self::String(value) => value.trim().parse().unwrap_or(0),
            Self::Map(values) => values.len(),
        }
    }

    /// Plain string form of the value, without type prefix
    #[allow(clippy::inherent_to_string_shadow_display)]
    #[must_use]
    pub fn to_string(&self) -> String {
        self.expect_kind("string");
        self.untyped()
    }

    #[must_use]
    pub fn to_map(&self) -> Vec<String> {
        self.expect_kind("map");

        match self {
            Self::Map(values) => values.clone(),
            other => vec![other.untyped()],
        }
    }

    fn untyped(&self) -> String {
        match self {
            Self::SInt(value) => value.to_string(),
            Self::UInt(value) => value.to_string(),
            Self::String(value) => value.clone(),
            Self::Bool(value) => value.to_string(),
            Self::Map(values) => values.join(","),
        }
    }
}

impl<'de> Deserialize<'de> for Setting {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_str(&value).map_err(serde::de::Error::custom)
    }
}

impl Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self {
            Self::SInt(_) => 'i',
            Self::UInt(_) => 'u',
            Self::String(_) => 's',
            Self::Bool(_) => 'b',
            Self::Map(_) => 'm',
        };

        write!(f, "{prefix}:{}", self.untyped())
    }
}

fn parse<T>(value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|err| Error::Config(format!("cannot parse {value:?}: {err}")))
}

impl FromStr for Setting {
    type Err = Error;

    fn from_str(typed: &str) -> Result<Self, Error> {
        let Some((prefix, value)) = typed.split_once(':') else {
            return Err(Error::Config(format!("setting without type prefix: {typed}")));
        };

        Ok(match prefix {
            "b" => Self::Bool(parse(value)?),
            "i" => Self::SInt(parse(value)?),
            "u" => Self::UInt(parse(value)?),
            "s" => Self::String(value.to_string()),
            "m" => Self::Map(
                value
                    .split(',')
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            _ => return Err(Error::Config(format!("unknown setting type: {typed}"))),
        })
    }
}

/// Declared key of the store, with its description and default value
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SettingInfo {
    /// Dotted key, ie: runner.timeout_ms
    pub key: String,
    pub description: String,
    pub default: Setting,
}

//! Named connection profiles
//!
//! Loading configuration is left to the caller: any serde format can produce
//! a [`Config`], which is then handed to a [`Session`](crate::Session) or a
//! [`Mailer`](crate::Mailer) as plain values.
//!
//! ```
//! # #[cfg(feature = "serde")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use postie::{Config, Security};
//!
//! let config: Config = serde_json::from_str(
//!     r#"{
//!         "default": "primary",
//!         "connections": {
//!             "primary": {
//!                 "host": "smtp.example.com",
//!                 "port": 587,
//!                 "secure": "tls",
//!                 "auth": true,
//!                 "user": "user",
//!                 "pass": "secret",
//!                 "from": "noreply@example.com",
//!                 "sender": "Example"
//!             }
//!         }
//!     }"#,
//! )?;
//!
//! assert_eq!(config.profile("primary")?.security, Security::Tls);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "serde"))]
//! # fn main() {}
//! ```

use std::{collections::HashMap, env};

use crate::{
    address::Address,
    smtp::{
        authentication::Credentials,
        error::{self, Error},
        SMTP_PORT,
    },
};

/// How the connection to the server is secured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Security {
    /// Plaintext connection
    #[default]
    None,
    /// TLS from the start of the connection (implicit TLS)
    Ssl,
    /// Plaintext connection upgraded with `STARTTLS`
    Tls,
}

/// Settings for one SMTP server
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionProfile {
    /// Server host name
    pub host: String,
    /// Server port
    #[cfg_attr(feature = "serde", serde(default = "default_port"))]
    pub port: u16,
    /// Connection security, `null`, `"ssl"` or `"tls"`
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "secure",
            default,
            deserialize_with = "deserialize_security"
        )
    )]
    pub security: Security,
    /// Whether `AUTH LOGIN` is performed
    #[cfg_attr(feature = "serde", serde(rename = "auth", default))]
    pub auth_required: bool,
    /// Username for `AUTH LOGIN`
    #[cfg_attr(feature = "serde", serde(default))]
    pub user: String,
    /// Password for `AUTH LOGIN`
    #[cfg_attr(feature = "serde", serde(default))]
    pub pass: String,
    /// Default `From` email
    #[cfg_attr(feature = "serde", serde(default))]
    pub from: String,
    /// Default `Reply-To` email
    #[cfg_attr(feature = "serde", serde(default))]
    pub reply: String,
    /// Display name used for both the default `From` and `Reply-To`
    #[cfg_attr(feature = "serde", serde(default))]
    pub sender: String,
}

#[cfg(feature = "serde")]
fn default_port() -> u16 {
    SMTP_PORT
}

#[cfg(feature = "serde")]
fn deserialize_security<'de, D>(deserializer: D) -> Result<Security, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    Ok(Option::<Security>::deserialize(deserializer)?.unwrap_or_default())
}

impl ConnectionProfile {
    /// Creates a profile for the given server with no security and no authentication
    pub fn new<H: Into<String>>(host: H, port: u16) -> Self {
        ConnectionProfile {
            host: host.into(),
            port,
            security: Security::None,
            auth_required: false,
            user: String::new(),
            pass: String::new(),
            from: String::new(),
            reply: String::new(),
            sender: String::new(),
        }
    }

    /// Credentials used for `AUTH LOGIN`
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.user.clone(), self.pass.clone())
    }

    /// The default `From` address
    pub fn default_from(&self) -> Address {
        Address::new(self.from.clone(), Some(self.sender.clone()))
    }

    /// The default `Reply-To` address
    pub fn default_reply_to(&self) -> Address {
        Address::new(self.reply.clone(), Some(self.sender.clone()))
    }
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        ConnectionProfile::new("", SMTP_PORT)
    }
}

/// Connection profiles by name, plus the name of the default one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Profile used when none is selected explicitly
    #[cfg_attr(feature = "serde", serde(default))]
    pub default: String,
    /// Name sent with `HELO`/`EHLO`; empty means use the ambient server name
    #[cfg_attr(feature = "serde", serde(default))]
    pub localhost: Option<String>,
    /// Named profiles
    #[cfg_attr(feature = "serde", serde(default))]
    pub connections: HashMap<String, ConnectionProfile>,
}

impl Config {
    /// Creates an empty configuration
    pub fn new() -> Self {
        Config::default()
    }

    /// Adds a named profile
    pub fn with_profile<N: Into<String>>(mut self, name: N, profile: ConnectionProfile) -> Self {
        self.connections.insert(name.into(), profile);
        self
    }

    /// Sets the default profile name
    pub fn with_default<N: Into<String>>(mut self, name: N) -> Self {
        self.default = name.into();
        self
    }

    /// Looks up a profile by name
    pub fn profile(&self, name: &str) -> Result<&ConnectionProfile, Error> {
        self.connections.get(name).ok_or_else(|| {
            error::configuration(format!(
                "a valid config name is required to load connection settings, got {name:?}"
            ))
        })
    }

    /// The default profile
    pub fn default_profile(&self) -> Result<&ConnectionProfile, Error> {
        self.profile(&self.default)
    }

    /// The configured `HELO`/`EHLO` name, if set and not empty
    pub fn localhost(&self) -> Option<&str> {
        self.localhost.as_deref().filter(|name| !name.is_empty())
    }
}

/// The name this machine presents itself with when none is configured
///
/// Reads `SERVER_NAME` from the environment first, then falls back to the
/// machine hostname and finally to `localhost`.
pub fn ambient_server_name() -> String {
    if let Some(name) = env::var("SERVER_NAME").ok().filter(|name| !name.is_empty()) {
        return name;
    }

    #[cfg(feature = "hostname")]
    {
        if let Some(name) = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty())
        {
            return name;
        }
    }

    "localhost".to_owned()
}

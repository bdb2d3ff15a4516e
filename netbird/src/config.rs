//! Provider configuration
//!
//! Every attribute falls back to an environment variable when it is unset or
//! empty in the provider block.

use std::fmt;

use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::value::{ObjectReader, Value};

pub const DEFAULT_SERVER_URL: &str = "https://api.netbird.io";

pub const ENV_SERVER_URL: &str = "NETBIRD_SERVER_URL";
pub const ENV_TOKEN: &str = "NETBIRD_TOKEN";
pub const ENV_OAUTH_CREDENTIALS: &str = "NETBIRD_OAUTH_CREDENTIALS";
pub const ENV_OAUTH_ISSUER: &str = "NETBIRD_OAUTH_ISSUER";

pub fn provider_schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("Interact with the NetBird management API")
        .attribute(
            AttributeBuilder::new("server_url", AttributeType::String)
                .description("NetBird management API URL (defaults to https://api.netbird.io, or NETBIRD_SERVER_URL)")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("token_auth", AttributeType::String)
                .description("Personal access token (or NETBIRD_TOKEN)")
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("oauth_credentials", AttributeType::String)
                .description("Path to a JSON file with OAuth client credentials (or NETBIRD_OAUTH_CREDENTIALS)")
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("oauth_issuer", AttributeType::String)
                .description("OAuth token endpoint (or NETBIRD_OAUTH_ISSUER)")
                .optional()
                .build(),
        )
        .build()
}

/// How the provider authenticates once configuration is resolved
#[derive(Clone, PartialEq)]
pub enum AuthMode {
    Token(String),
    OAuth { credentials_path: String, issuer: String },
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Token(_) => write!(f, "AuthMode::Token(<redacted>)"),
            AuthMode::OAuth {
                credentials_path,
                issuer,
            } => f
                .debug_struct("AuthMode::OAuth")
                .field("credentials_path", credentials_path)
                .field("issuer", issuer)
                .finish(),
        }
    }
}

/// Resolved provider configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub server_url: String,
    pub auth: AuthMode,
}

impl ProviderConfig {
    /// Resolve the provider block against the environment
    pub fn resolve(config: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut reader = ObjectReader::new(config);
        let server_url: Value<String> = reader.get("server_url");
        let token: Value<String> = reader.get("token_auth");
        let oauth_credentials: Value<String> = reader.get("oauth_credentials");
        let oauth_issuer: Value<String> = reader.get("oauth_issuer");
        reader.finish()?;

        let server_url = setting(&server_url, ENV_SERVER_URL)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        if let Err(e) = url::Url::parse(&server_url) {
            return Err(vec![Diagnostic::error(
                "Invalid server_url",
                format!("{} is not a valid URL: {}", server_url, e),
            )
            .with_attribute(AttributePath::new("server_url"))]);
        }

        let auth = match (
            setting(&oauth_credentials, ENV_OAUTH_CREDENTIALS),
            setting(&oauth_issuer, ENV_OAUTH_ISSUER),
            setting(&token, ENV_TOKEN),
        ) {
            (Some(credentials_path), Some(issuer), _) => AuthMode::OAuth {
                credentials_path,
                issuer,
            },
            (Some(_), None, _) => {
                return Err(vec![Diagnostic::error(
                    "Missing OAuth issuer",
                    format!(
                        "oauth_issuer (or {}) is required when oauth_credentials is set",
                        ENV_OAUTH_ISSUER
                    ),
                )
                .with_attribute(AttributePath::new("oauth_issuer"))])
            }
            (None, _, Some(token)) => AuthMode::Token(token),
            (None, _, None) => {
                return Err(vec![Diagnostic::error(
                    "Missing NetBird credentials",
                    format!(
                        "Set token_auth (or {}) or oauth_credentials (or {}) in the provider configuration",
                        ENV_TOKEN, ENV_OAUTH_CREDENTIALS
                    ),
                )])
            }
        };

        Ok(Self { server_url, auth })
    }
}

/// A known, non-empty attribute, else the non-empty environment variable
fn setting(value: &Value<String>, env: &str) -> Option<String> {
    value
        .as_known()
        .filter(|s| !s.is_empty())
        .cloned()
        .or_else(|| std::env::var(env).ok().filter(|s| !s.is_empty()))
}

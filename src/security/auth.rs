//! Per-host authentication schemes.
//!
//! An ordered table of `(hostname matcher, header templates)` rows. The first
//! row whose matcher accepts the target hostname decides which headers carry
//! the caller's API key. Unmatched hosts get the fallback row, which sets
//! both `Authorization: Bearer` and `X-API-Key`.

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

use crate::config::AuthProviderConfig;
use crate::config::validation::validate_provider;
use crate::routing::matcher::{AnyHost, HostContains, HostMatcher};

/// Placeholder replaced with the API key in header value templates.
pub const KEY_PLACEHOLDER: &str = "{key}";

/// Notion API version pinned for every Notion request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// A header to set, with `{key}` standing in for the API key.
#[derive(Debug, Clone)]
pub struct HeaderTemplate {
    name: HeaderName,
    value: String,
}

impl HeaderTemplate {
    pub fn new(name: HeaderName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    fn render(&self, api_key: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.value.replace(KEY_PLACEHOLDER, api_key))
    }
}

/// One row of the authentication table.
#[derive(Debug)]
pub struct AuthScheme {
    name: String,
    matcher: Box<dyn HostMatcher>,
    headers: Vec<HeaderTemplate>,
}

impl AuthScheme {
    pub fn new(
        name: impl Into<String>,
        matcher: impl HostMatcher + 'static,
        headers: Vec<HeaderTemplate>,
    ) -> Self {
        Self {
            name: name.into(),
            matcher: Box::new(matcher),
            headers,
        }
    }

    fn bearer(name: &str, host: &str) -> Self {
        Self::new(
            name,
            HostContains::new(host),
            vec![HeaderTemplate::new(
                axum::http::header::AUTHORIZATION,
                "Bearer {key}",
            )],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, hostname: &str) -> bool {
        self.matcher.matches(hostname)
    }

    /// Set this scheme's headers, replacing any existing values.
    pub fn apply(&self, api_key: &str, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        for template in &self.headers {
            headers.insert(template.name.clone(), template.render(api_key)?);
        }
        Ok(())
    }
}

/// Ordered authentication table with a fallback row.
#[derive(Debug)]
pub struct AuthTable {
    schemes: Vec<AuthScheme>,
    fallback: AuthScheme,
}

impl AuthTable {
    /// The built-in provider rows.
    pub fn builtin() -> Self {
        let schemes = vec![
            AuthScheme::new(
                "notion",
                HostContains::new("notion.com"),
                vec![
                    HeaderTemplate::new(axum::http::header::AUTHORIZATION, "Bearer {key}"),
                    HeaderTemplate::new(HeaderName::from_static("notion-version"), NOTION_VERSION),
                ],
            ),
            AuthScheme::bearer("openai", "openai.com"),
            AuthScheme::new(
                "anthropic",
                HostContains::new("anthropic.com"),
                vec![HeaderTemplate::new(HeaderName::from_static("x-api-key"), "{key}")],
            ),
            AuthScheme::bearer("google", "googleapis.com"),
            AuthScheme::new(
                "github",
                HostContains::new("github.com"),
                vec![HeaderTemplate::new(axum::http::header::AUTHORIZATION, "token {key}")],
            ),
        ];

        Self {
            schemes,
            fallback: default_scheme(),
        }
    }

    /// Built-in rows preceded by the configured ones.
    ///
    /// Rows that fail validation are skipped with a warning; `load_config`
    /// has already rejected them for file-based configs.
    pub fn with_providers(providers: &[AuthProviderConfig]) -> Self {
        let mut table = Self::builtin();
        let mut custom = Vec::with_capacity(providers.len());

        for provider in providers {
            if let Err(reason) = validate_provider(provider) {
                tracing::warn!(provider = %provider.name, %reason, "Skipping auth provider");
                continue;
            }
            let headers = provider
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    HeaderName::from_bytes(name.as_bytes())
                        .ok()
                        .map(|name| HeaderTemplate::new(name, value.clone()))
                })
                .collect();
            custom.push(AuthScheme::new(
                provider.name.clone(),
                HostContains::new(provider.host_contains.clone()),
                headers,
            ));
        }

        custom.append(&mut table.schemes);
        table.schemes = custom;
        table
    }

    /// The scheme for a hostname: first matching row, else the fallback.
    pub fn select(&self, hostname: &str) -> &AuthScheme {
        self.schemes
            .iter()
            .find(|scheme| scheme.matches(hostname))
            .unwrap_or(&self.fallback)
    }

    /// Number of rows, fallback excluded.
    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

impl Default for AuthTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn default_scheme() -> AuthScheme {
    AuthScheme::new(
        "default",
        AnyHost,
        vec![
            HeaderTemplate::new(axum::http::header::AUTHORIZATION, "Bearer {key}"),
            HeaderTemplate::new(HeaderName::from_static("x-api-key"), "{key}"),
        ],
    )
}

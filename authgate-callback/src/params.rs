//! Query parameters delivered with the redirect.

use url::{form_urlencoded, Url};

/// The parameters an identity provider appends to the callback URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    /// One-time authorization code.
    pub code: Option<String>,
    /// Provider error, e.g. `access_denied`.
    pub error: Option<String>,
    /// Human-readable provider error.
    pub error_description: Option<String>,
    /// Opaque state echoed by the provider.
    pub state: Option<String>,
}

impl RedirectParams {
    /// Empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters carrying only `code`.
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Parse a query string, with or without the leading `?`.
    ///
    /// When a key repeats, the first value wins.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "code" => &mut params.code,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                "state" => &mut params.state,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Parse the query of a full callback URL.
    pub fn from_url(url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(url)?;
        Ok(Self::from_query(url.query().unwrap_or_default()))
    }

    /// The code to exchange.
    ///
    /// `None` when the code is absent or empty, or when the provider reported
    /// an error.
    pub fn code(&self) -> Option<&str> {
        if self.error.is_some() {
            return None;
        }
        self.code.as_deref().filter(|c| !c.is_empty())
    }
}

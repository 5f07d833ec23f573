//! Lookup payload sent to the remote configuration endpoint as query parameters.

use crate::country::CountryCode;

/// App code sent when the host does not override it.
pub const DEFAULT_APPCODE: &str = "22win_android";

/// Panel name sent when the host does not override it.
pub const DEFAULT_PANEL: &str = "main";

/// Fixed-order key/value payload. `m_country` and `ip_country` always carry the same code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPayload {
    country: CountryCode,
    appcode: String,
    panel: String,
}

impl LookupPayload {
    pub fn new(country: CountryCode, appcode: impl Into<String>, panel: impl Into<String>) -> Self {
        Self {
            country,
            appcode: appcode.into(),
            panel: panel.into(),
        }
    }

    /// Payload with the default appcode and panel.
    pub fn for_country(country: CountryCode) -> Self {
        Self::new(country, DEFAULT_APPCODE, DEFAULT_PANEL)
    }

    pub fn country(&self) -> CountryCode {
        self.country
    }

    /// Pairs in declaration order: m_country, ip_country, appcode, panel.
    pub fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("m_country", self.country.as_str()),
            ("ip_country", self.country.as_str()),
            ("appcode", &self.appcode),
            ("panel", &self.panel),
        ]
    }

    /// `?k=v&k=v...` with no trailing separator.
    ///
    /// Values are NOT percent-encoded. Country codes are ASCII letters, so this only matters
    /// if a host configures an appcode or panel containing reserved characters.
    pub fn query_string(&self) -> String {
        build_query(self.pairs())
    }

    /// Endpoint with the query string appended.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", endpoint, self.query_string())
    }
}

/// Join pairs in iteration order: `?` before the first, `&` before each later one.
pub fn build_query<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    for (idx, (key, value)) in pairs.into_iter().enumerate() {
        out.push(if idx == 0 { '?' } else { '&' });
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out
}

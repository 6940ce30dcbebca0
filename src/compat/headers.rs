//! Deprecation metadata attached to responses.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::http::ApiResponse;

pub const X_DEPRECATED: &str = "x-deprecated";
pub const X_DEPRECATED_ROUTE: &str = "x-deprecated-route";
pub const X_REPLACEMENT_ROUTE: &str = "x-replacement-route";
pub const X_REPLACEMENT_URL: &str = "x-replacement-url";
pub const DEPRECATION: &str = "deprecation";
pub const SUNSET: &str = "sunset";
pub const LINK: &str = "link";
pub const X_NAMESPACE_DEPRECATED: &str = "x-namespace-deprecated";
pub const X_CANONICAL_NAMESPACE: &str = "x-canonical-namespace";

/// Body key holding the injected deprecation block.
pub const DEPRECATED_BODY_KEY: &str = "_deprecated";

/// Everything a shadow response is decorated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationNotice {
    pub legacy_route: String,
    pub replacement: String,
    pub replacement_url: String,
    pub sunset: DateTime<Utc>,
    pub documentation: String,
}

impl DeprecationNotice {
    /// Attach headers and, for object payloads, the `_deprecated` block.
    ///
    /// The status code is left untouched.
    pub fn apply(&self, response: &mut ApiResponse) {
        response.set_header(X_DEPRECATED, "true");
        response.set_header(X_DEPRECATED_ROUTE, &self.legacy_route);
        response.set_header(X_REPLACEMENT_ROUTE, &self.replacement);
        response.set_header(X_REPLACEMENT_URL, &self.replacement_url);
        response.set_header(DEPRECATION, &deprecation_value(self.sunset));
        response.set_header(SUNSET, &http_date(self.sunset));
        response.set_header(
            LINK,
            &format!("<{}>; rel=\"successor-version\"", self.replacement_url),
        );

        if let Some(body) = response.body_object_mut() {
            body.insert(DEPRECATED_BODY_KEY.to_string(), self.body_block());
        }
    }

    fn body_block(&self) -> Value {
        json!({
            "message": format!(
                "The route {} is deprecated and will be removed after {}. Use {} instead.",
                self.legacy_route,
                self.sunset.format("%Y-%m-%d"),
                self.replacement
            ),
            "legacy_route": self.legacy_route,
            "replacement": self.replacement,
            "replacement_url": self.replacement_url,
            "sunset": self.sunset.format("%Y-%m-%d").to_string(),
            "documentation": self.documentation,
        })
    }
}

/// Flag a response served from a legacy namespace.
pub fn flag_namespace(response: &mut ApiResponse, canonical_namespace: &str) {
    response.set_header(X_NAMESPACE_DEPRECATED, "true");
    response.set_header(X_CANONICAL_NAMESPACE, canonical_namespace);
}

/// `Deprecation` structured-field date: `@<unix seconds>`.
pub fn deprecation_value(at: DateTime<Utc>) -> String {
    format!("@{}", at.timestamp())
}

/// IMF-fixdate, as used by `Sunset`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

//! App scopes.
//!
//! A scope is always evaluated against the app that requested the flow,
//! never against the owner of the key.

use serde::{Deserialize, Serialize};

use crate::apps::AppIdentityResolver;

/// Names one app, either directly or through the app manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SingleAppScope {
    BundleId(String),
    AppSlug(String),
}

/// The set of requesting apps a key or suspension applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "app", rename_all = "camelCase")]
pub enum AppScope {
    Unrestricted,
    WebBrowsersOnly,
    Single(SingleAppScope),
}

impl AppScope {
    pub fn matches(&self, bundle_id: Option<&str>, apps: &dyn AppIdentityResolver) -> bool {
        match self {
            AppScope::Unrestricted => true,
            AppScope::WebBrowsersOnly => bundle_id.is_some_and(|b| apps.resolve(b).is_browser),
            AppScope::Single(SingleAppScope::BundleId(expected)) => bundle_id == Some(expected.as_str()),
            AppScope::Single(SingleAppScope::AppSlug(slug)) => {
                bundle_id.is_some_and(|b| apps.resolve(b).is_identified_by(slug))
            }
        }
    }
}

//! App-identity manifest delivered by rules sync.
//!
//! The manifest lists, per app slug, the bundle ids that identify the app,
//! and groups slugs into categories. Slugs in the `browser` category are
//! web browsers.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::identity::{AppDescriptor, AppIdentityResolver};

/// Category name marking web browsers.
pub const BROWSER_CATEGORY: &str = "browser";

/// Wire form of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIdManifest {
    /// slug -> bundle ids
    #[serde(default)]
    pub apps: HashMap<String, HashSet<String>>,
    /// category -> slugs
    #[serde(default)]
    pub categories: HashMap<String, HashSet<String>>,
}

/// Bundle-id indexed view of an [`AppIdManifest`].
#[derive(Debug, Clone, Default)]
pub struct AppIndex {
    slugs: HashMap<String, String>,
    browsers: HashSet<String>,
}

impl AppIndex {
    pub fn new(manifest: &AppIdManifest) -> Self {
        let mut slugs = HashMap::new();
        for (slug, bundle_ids) in &manifest.apps {
            for bundle_id in bundle_ids {
                if let Some(previous) = slugs.insert(bundle_id.clone(), slug.clone()) {
                    log::warn!(
                        "APP_MANIFEST_DUPLICATE bundle_id={} slugs={:?}",
                        bundle_id,
                        [previous.as_str(), slug.as_str()]
                    );
                }
            }
        }

        let browsers = manifest
            .categories
            .get(BROWSER_CATEGORY)
            .cloned()
            .unwrap_or_default();

        Self { slugs, browsers }
    }

    pub fn app_count(&self) -> usize {
        self.slugs.len()
    }
}

impl AppIdentityResolver for AppIndex {
    fn resolve(&self, bundle_id: &str) -> AppDescriptor {
        match self.slugs.get(bundle_id) {
            Some(slug) => AppDescriptor {
                bundle_id: bundle_id.to_string(),
                slug: Some(slug.clone()),
                is_browser: self.browsers.contains(slug),
            },
            None => AppDescriptor::unidentified(bundle_id),
        }
    }
}

//! App identity resolution.

/// What the filter knows about a requesting app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppDescriptor {
    pub bundle_id: String,
    pub slug: Option<String>,
    pub is_browser: bool,
}

impl AppDescriptor {
    pub fn unidentified(bundle_id: &str) -> Self {
        Self {
            bundle_id: bundle_id.to_string(),
            slug: None,
            is_browser: false,
        }
    }

    pub fn is_identified_by(&self, slug: &str) -> bool {
        self.slug.as_deref() == Some(slug)
    }
}

/// Resolves a bundle id to an [`AppDescriptor`].
///
/// Called on the evaluation path, so implementations must answer from
/// memory.
pub trait AppIdentityResolver: Send + Sync {
    fn resolve(&self, bundle_id: &str) -> AppDescriptor;
}

//! Keys and key matching.

use uuid::Uuid;

use crate::apps::AppIdentityResolver;
use crate::flow::{FlowDescriptor, FlowTarget};

use super::domain::{domain_matches, subdomain_matches, DomainPattern};
use super::path::PathPattern;
use super::scope::AppScope;

/// One allow-rule: a locator matcher plus the scope it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Domain { domain: String, scope: AppScope },
    AnySubdomain { domain: String, scope: AppScope },
    /// Whole-app key: no locator predicate, only the scope.
    Skeleton { scope: AppScope },
    DomainRegex { pattern: DomainPattern, scope: AppScope },
    Path { path: PathPattern, scope: AppScope },
    IpAddress { ip: String, scope: AppScope },
}

impl Key {
    pub fn scope(&self) -> &AppScope {
        match self {
            Key::Domain { scope, .. }
            | Key::AnySubdomain { scope, .. }
            | Key::Skeleton { scope }
            | Key::DomainRegex { scope, .. }
            | Key::Path { scope, .. }
            | Key::IpAddress { scope, .. } => scope,
        }
    }

    /// Short variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Key::Domain { .. } => "domain",
            Key::AnySubdomain { .. } => "anySubdomain",
            Key::Skeleton { .. } => "skeleton",
            Key::DomainRegex { .. } => "domainRegex",
            Key::Path { .. } => "path",
            Key::IpAddress { .. } => "ipAddress",
        }
    }

    fn matches_locator(&self, target: &FlowTarget<'_>) -> bool {
        match self {
            Key::Domain { domain, .. } => target.host().is_some_and(|h| domain_matches(domain, h)),
            Key::AnySubdomain { domain, .. } => {
                target.host().is_some_and(|h| subdomain_matches(domain, h))
            }
            Key::Skeleton { .. } => true,
            Key::DomainRegex { pattern, .. } => target.host().is_some_and(|h| pattern.is_match(h)),
            Key::Path { path, .. } => target.url().is_some_and(|u| path.matches_url(u)),
            Key::IpAddress { ip, .. } => target.ip_address() == Some(ip.as_str()),
        }
    }

    /// Match against locators already derived from the flow.
    pub fn matches_target(&self, target: &FlowTarget<'_>, apps: &dyn AppIdentityResolver) -> bool {
        self.matches_locator(target) && self.scope().matches(target.bundle_id(), apps)
    }

    pub fn matches(&self, flow: &FlowDescriptor, apps: &dyn AppIdentityResolver) -> bool {
        self.matches_target(&FlowTarget::of(flow), apps)
    }
}

/// A key with the stable id reported when it allows a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKey {
    pub id: Uuid,
    pub key: Key,
}

impl FilterKey {
    pub fn new(key: Key) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
        }
    }

    pub fn with_id(id: Uuid, key: Key) -> Self {
        Self { id, key }
    }

    pub fn matches(&self, flow: &FlowDescriptor, apps: &dyn AppIdentityResolver) -> bool {
        self.key.matches(flow, apps)
    }

    pub fn matches_target(&self, target: &FlowTarget<'_>, apps: &dyn AppIdentityResolver) -> bool {
        self.key.matches_target(target, apps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::{AppIdManifest, AppIndex};
    use crate::keys::SingleAppScope;

    fn apps() -> AppIndex {
        let mut manifest = AppIdManifest::default();
        manifest
            .apps
            .insert("safari".to_string(), ["com.apple.Safari".to_string()].into());
        manifest
            .categories
            .insert("browser".to_string(), ["safari".to_string()].into());
        AppIndex::new(&manifest)
    }

    fn host_flow(host: &str, bundle_id: &str) -> FlowDescriptor {
        FlowDescriptor {
            hostname: Some(host.to_string()),
            bundle_id: Some(bundle_id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_domain_key() {
        let key = Key::Domain {
            domain: "safe.com".to_string(),
            scope: AppScope::Unrestricted,
        };
        let apps = apps();
        assert!(key.matches(&host_flow("www.safe.com", "com.x"), &apps));
        assert!(!key.matches(&host_flow("bad.safe.com", "com.x"), &apps));
    }

    #[test]
    fn test_domain_key_uses_url_host() {
        let key = Key::Domain {
            domain: "safe.com".to_string(),
            scope: AppScope::Unrestricted,
        };
        let flow = FlowDescriptor {
            url: Some("https://safe.com/page".to_string()),
            ..Default::default()
        };
        assert!(key.matches(&flow, &apps()));
    }

    #[test]
    fn test_shared_target_matches_like_flow() {
        let apps = apps();
        let flow = FlowDescriptor {
            url: Some("https://github.com/htc/monkey".to_string()),
            bundle_id: Some("com.apple.Safari".to_string()),
            ..Default::default()
        };
        let keys = [
            Key::Domain { domain: "github.com".to_string(), scope: AppScope::Unrestricted },
            Key::AnySubdomain { domain: "gitlab.com".to_string(), scope: AppScope::Unrestricted },
            Key::Path {
                path: PathPattern::parse("github.com/htc/*").unwrap(),
                scope: AppScope::WebBrowsersOnly,
            },
        ];

        let target = FlowTarget::of(&flow);
        for key in &keys {
            assert_eq!(key.matches_target(&target, &apps), key.matches(&flow, &apps), "{:?}", key);
        }
        assert!(keys[2].matches_target(&target, &apps));
    }

    #[test]
    fn test_ip_key() {
        let key = Key::IpAddress {
            ip: "1.2.3.4".to_string(),
            scope: AppScope::Unrestricted,
        };
        let apps = apps();
        let flow = FlowDescriptor {
            ip_address: Some("1.2.3.4".to_string()),
            ..Default::default()
        };
        assert!(key.matches(&flow, &apps));
        assert!(!key.matches(&FlowDescriptor::default(), &apps));

        let v6 = Key::IpAddress {
            ip: "2607:f8b0::200e".to_string(),
            scope: AppScope::Unrestricted,
        };
        let flow = FlowDescriptor {
            ip_address: Some("2607:f8b0::200e".to_string()),
            ..Default::default()
        };
        assert!(v6.matches(&flow, &apps));
    }

    #[test]
    fn test_skeleton_key_matches_whole_app() {
        let key = Key::Skeleton {
            scope: AppScope::Single(SingleAppScope::BundleId("com.apple.Safari".to_string())),
        };
        let apps = apps();
        assert!(key.matches(&host_flow("anything.example", "com.apple.Safari"), &apps));
        assert!(key.matches(
            &FlowDescriptor {
                ip_address: Some("9.9.9.9".to_string()),
                bundle_id: Some("com.apple.Safari".to_string()),
                ..Default::default()
            },
            &apps
        ));
        assert!(!key.matches(&host_flow("anything.example", "com.other"), &apps));
    }

    #[test]
    fn test_regex_key_scoped_to_browsers() {
        let key = Key::DomainRegex {
            pattern: DomainPattern::new("preview--*.netlify.app").unwrap(),
            scope: AppScope::WebBrowsersOnly,
        };
        let apps = apps();
        assert!(key.matches(&host_flow("preview--33.netlify.app", "com.apple.Safari"), &apps));
        assert!(!key.matches(&host_flow("preview--33.netlify.app", "com.example.cli"), &apps));
    }

    #[test]
    fn test_path_key_needs_url() {
        let key = Key::Path {
            path: PathPattern::parse("github.com/htc/*").unwrap(),
            scope: AppScope::Unrestricted,
        };
        let apps = apps();
        assert!(!key.matches(&host_flow("github.com", "com.apple.Safari"), &apps));
        let flow = FlowDescriptor {
            url: Some("https://github.com/htc/monkey".to_string()),
            ..Default::default()
        };
        assert!(key.matches(&flow, &apps));
    }

    #[test]
    fn test_filter_key_ids_are_unique() {
        let a = FilterKey::new(Key::Skeleton { scope: AppScope::Unrestricted });
        let b = FilterKey::new(Key::Skeleton { scope: AppScope::Unrestricted });
        assert_ne!(a.id, b.id);
    }
}

//! End-to-end filter scenarios through the engine facade.

use chrono::Duration;
use gertrude_filter_core::apps::AppIdManifest;
use gertrude_filter_core::buffer::BufferedDecision;
use gertrude_filter_core::flow::{IpProtocol, Port};
use gertrude_filter_core::keys::{AppScope, DomainPattern, FilterKey, Key, PathPattern};
use gertrude_filter_core::suspension::FilterSuspension;
use gertrude_filter_core::{
    DecisionReason, DecisionReporter, EngineConfig, FilterDecision, FilterEngine, FlowDescriptor,
    Verdict,
};
use parking_lot::Mutex;

const SAFARI: &str = "com.apple.Safari";
const TERMINAL: &str = "com.apple.Terminal";

#[derive(Default)]
struct Recorder {
    immediate: Mutex<Vec<FilterDecision>>,
    buffered: Mutex<Vec<BufferedDecision>>,
}

impl DecisionReporter for Recorder {
    fn report_decision(&self, decision: &FilterDecision) {
        self.immediate.lock().push(decision.clone());
    }

    fn report_buffered(&self, entries: Vec<BufferedDecision>) {
        self.buffered.lock().extend(entries);
    }
}

fn engine_with(keys: Vec<Key>) -> (FilterEngine<Recorder>, Vec<FilterKey>) {
    let engine = FilterEngine::new(EngineConfig::default(), Recorder::default());

    let mut manifest = AppIdManifest::default();
    manifest.apps.insert("safari".to_string(), [SAFARI.to_string()].into());
    manifest
        .categories
        .insert("browser".to_string(), ["safari".to_string()].into());
    engine.state().replace_manifest(&manifest);

    let keys: Vec<FilterKey> = keys.into_iter().map(FilterKey::new).collect();
    engine.state().replace_keys(501, keys.clone());
    (engine, keys)
}

fn flow(host: Option<&str>, ip: Option<&str>, bundle_id: &str) -> FlowDescriptor {
    FlowDescriptor {
        hostname: host.map(str::to_string),
        ip_address: ip.map(str::to_string),
        bundle_id: Some(bundle_id.to_string()),
        port: Some(Port::Https),
        protocol: Some(IpProtocol::Tcp),
        user_id: Some(501),
        ..Default::default()
    }
}

fn url_flow(url: &str) -> FlowDescriptor {
    FlowDescriptor {
        url: Some(url.to_string()),
        bundle_id: Some(SAFARI.to_string()),
        user_id: Some(501),
        ..Default::default()
    }
}

fn verdict(engine: &FilterEngine<Recorder>, flow: &FlowDescriptor) -> Verdict {
    engine
        .evaluate_flow(flow, true)
        .expect("completed flows always decide")
        .verdict
}

#[test]
fn test_domain_scoping_exactness() {
    let (engine, _) = engine_with(vec![Key::Domain {
        domain: "safe.com".to_string(),
        scope: AppScope::Unrestricted,
    }]);

    for host in ["safe.com", "www.safe.com", "Safe.com"] {
        assert_eq!(verdict(&engine, &flow(Some(host), None, SAFARI)), Verdict::Allow, "{}", host);
    }
    for host in ["bad.safe.com", "safe.com.evil"] {
        assert_eq!(verdict(&engine, &flow(Some(host), None, SAFARI)), Verdict::Block, "{}", host);
    }
}

#[test]
fn test_subdomain_generality() {
    let (engine, _) = engine_with(vec![Key::AnySubdomain {
        domain: "safe.com".to_string(),
        scope: AppScope::Unrestricted,
    }]);

    for host in ["safe.com", "a.safe.com", "deep.er.safe.com"] {
        assert_eq!(verdict(&engine, &flow(Some(host), None, SAFARI)), Verdict::Allow, "{}", host);
    }
    assert_eq!(verdict(&engine, &flow(Some("unsafe.com"), None, SAFARI)), Verdict::Block);
}

#[test]
fn test_no_cross_locator_authorization() {
    let (engine, _) = engine_with(vec![Key::Domain {
        domain: "safe.com".to_string(),
        scope: AppScope::Unrestricted,
    }]);

    let first = engine
        .evaluate_flow(&flow(Some("safe.com"), Some("1.2.3.4"), SAFARI), false)
        .unwrap();
    assert_eq!(first.verdict, Verdict::Allow);

    let bare_ip = flow(None, Some("1.2.3.4"), SAFARI);
    assert!(engine.evaluate_flow(&bare_ip, false).is_none(), "new flow defers");
    assert_eq!(
        engine.evaluate_flow(&bare_ip, true).unwrap().reason,
        DecisionReason::DefaultNotAllowed
    );

    let other_host = flow(Some("other.com"), Some("1.2.3.4"), SAFARI);
    assert_eq!(verdict(&engine, &other_host), Verdict::Block);
}

#[test]
fn test_suspension_scope_isolation() {
    let (engine, _) = engine_with(vec![Key::Domain {
        domain: "safe.com".to_string(),
        scope: AppScope::Unrestricted,
    }]);
    let browser = flow(Some("bad.com"), None, SAFARI);
    let terminal = flow(Some("bad.com"), None, TERMINAL);

    engine.state().suspensions().set(
        501,
        FilterSuspension::lasting(AppScope::WebBrowsersOnly, Duration::minutes(10)),
    );
    assert!(engine.evaluate_user_phase(Some(501)).is_none());
    assert_eq!(verdict(&engine, &browser), Verdict::Allow);
    assert_eq!(verdict(&engine, &terminal), Verdict::Block);

    engine.state().suspensions().set(
        501,
        FilterSuspension::lasting(AppScope::Unrestricted, Duration::minutes(10)),
    );
    assert_eq!(
        engine.evaluate_user_phase(Some(501)).unwrap().reason,
        DecisionReason::FilterSuspended
    );
    assert_eq!(verdict(&engine, &browser), Verdict::Allow);
    assert_eq!(verdict(&engine, &terminal), Verdict::Allow);
}

#[test]
fn test_user_phase_precedence() {
    let (engine, _) = engine_with(vec![]);
    engine.state().replace_exempt_users([0, 501]);
    engine.state().suspensions().set(
        0,
        FilterSuspension::lasting(AppScope::Unrestricted, Duration::minutes(10)),
    );

    let missing = engine.evaluate_user_phase(None).unwrap();
    assert_eq!(missing.verdict, Verdict::Block);
    assert_eq!(missing.reason, DecisionReason::MissingUserId);

    assert_eq!(
        engine.evaluate_user_phase(Some(0)).unwrap().reason,
        DecisionReason::SystemUser
    );
    assert_eq!(
        engine.evaluate_user_phase(Some(501)).unwrap().reason,
        DecisionReason::UserIsExempt
    );
}

#[test]
fn test_own_app_bypass_without_keys() {
    let (engine, _) = engine_with(vec![]);
    let own = flow(Some("api.gertrude.app"), None, "com.netrivet.gertrude.app");
    let decision = engine.evaluate_flow(&own, false).unwrap();
    assert_eq!(decision.reason, DecisionReason::FromGertrudeApp);

    let other = flow(Some("api.gertrude.app"), None, SAFARI);
    assert_eq!(
        engine.evaluate_flow(&other, false).unwrap().reason,
        DecisionReason::MissingKeychains
    );
}

#[test]
fn test_spoofed_own_app_bundle_ids_are_filtered() {
    let (engine, _) = engine_with(vec![Key::Domain {
        domain: "safe.com".to_string(),
        scope: AppScope::Unrestricted,
    }]);

    for bundle_id in [
        "EVILTEAM00.evil.com.netrivet.gertrude.app",
        "com.attacker.com.netrivet.gertrude.app",
    ] {
        let decision = engine
            .evaluate_flow(&flow(Some("porn.example"), None, bundle_id), true)
            .unwrap();
        assert_eq!(decision.verdict, Verdict::Block, "{}", bundle_id);
        assert_eq!(decision.reason, DecisionReason::DefaultNotAllowed);
    }
    assert_eq!(engine.pending_decisions(), 2);
}

#[test]
fn test_path_key_round_trip() {
    let (engine, keys) = engine_with(vec![Key::Path {
        path: PathPattern::parse("github.com/htc/*").unwrap(),
        scope: AppScope::Unrestricted,
    }]);

    let allowed = engine
        .evaluate_flow(&url_flow("https://github.com/htc/monkey"), true)
        .unwrap();
    assert_eq!(allowed.verdict, Verdict::Allow);
    assert_eq!(allowed.reason, DecisionReason::PathAllowed);
    assert_eq!(allowed.responsible_key_id, Some(keys[0].id));

    let blocked = engine
        .evaluate_flow(&url_flow("https://github.com/bad-repo/htc"), true)
        .unwrap();
    assert_eq!(blocked.verdict, Verdict::Block);
    assert_eq!(blocked.reason, DecisionReason::DefaultNotAllowed);
}

#[test]
fn test_regex_key_browser_scope() {
    let (engine, _) = engine_with(vec![Key::DomainRegex {
        pattern: DomainPattern::new("preview--*.netlify.app").unwrap(),
        scope: AppScope::WebBrowsersOnly,
    }]);

    let host = Some("preview--33.netlify.app");
    let allowed = engine.evaluate_flow(&flow(host, None, SAFARI), true).unwrap();
    assert_eq!(allowed.verdict, Verdict::Allow);
    assert_eq!(allowed.reason, DecisionReason::AppUnrestricted);
    assert_eq!(verdict(&engine, &flow(host, None, TERMINAL)), Verdict::Block);
}

#[test]
fn test_http_completion_recovers_hostname() {
    let (engine, keys) = engine_with(vec![Key::Domain {
        domain: "safe.com".to_string(),
        scope: AppScope::Unrestricted,
    }]);

    let new_flow = flow(None, Some("93.184.216.34"), SAFARI);
    assert!(engine.evaluate_flow(&new_flow, false).is_none());

    let completed = new_flow.completed_with(b"GET /index.html HTTP/1.1\r\nHost: safe.com\r\n\r\n");
    let decision = engine.evaluate_flow(&completed, true).unwrap();
    assert_eq!(decision.reason, DecisionReason::DomainAllowed);
    assert_eq!(decision.responsible_key_id, Some(keys[0].id));
}

#[test]
fn test_decision_buffer_flush() {
    let (engine, _) = engine_with(vec![Key::Domain {
        domain: "safe.com".to_string(),
        scope: AppScope::Unrestricted,
    }]);

    for ip in ["1.1.1.1", "2.2.2.2", "3.3.3.3"] {
        engine.evaluate_flow(&flow(Some("bad.com"), Some(ip), SAFARI), true);
    }
    engine.evaluate_flow(&flow(Some("safe.com"), None, SAFARI), true);

    assert_eq!(engine.flush_decisions(), 2);
    let recorder = engine.reporter();
    let buffered = recorder.buffered.lock();
    assert_eq!(buffered[0].decision.verdict, Verdict::Allow);
    assert_eq!(buffered[0].count, 1);
    assert_eq!(buffered[1].decision.reason, DecisionReason::DefaultNotAllowed);
    assert_eq!(buffered[1].count, 3);
    assert!(recorder.immediate.lock().is_empty());
}

//! Tests for host persistence.

mod helpers;

use rsmachine::RsmachineError;
use rsmachine::config::{ClusterConfig, Node};
use rsmachine::persist::save_host;

use helpers::{FakeApi, RecordingConfigStore, valid_host};

#[test]
fn test_save_records_driver_ip_on_node() {
    let api = FakeApi::new();
    let store = RecordingConfigStore::default();
    let host = valid_host("kvm2", "minikube", Some("192.168.39.10"));
    let mut cfg = ClusterConfig::new("minikube", "kvm2");
    let mut node = Node::new("minikube");

    save_host(&api, &host, &mut cfg, &mut node, &store).unwrap();

    assert_eq!(node.ip, "192.168.39.10");
    assert_eq!(api.saved(), ["minikube"]);
    let saved = store.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].node("minikube").unwrap().ip, "192.168.39.10");
    assert_eq!(cfg.nodes.len(), 1);
}

#[test]
fn test_save_twice_keeps_one_node_entry() {
    let api = FakeApi::new();
    let store = RecordingConfigStore::default();
    let host = valid_host("kvm2", "minikube", Some("192.168.39.10"));
    let mut cfg = ClusterConfig::new("minikube", "kvm2");
    let mut node = Node::new("minikube");

    save_host(&api, &host, &mut cfg, &mut node, &store).unwrap();
    save_host(&api, &host, &mut cfg, &mut node, &store).unwrap();

    assert_eq!(cfg.nodes.len(), 1);
    assert_eq!(store.saved().len(), 2);
}

#[test]
fn test_ip_failure_after_host_save_leaves_node_unchanged() {
    let api = FakeApi::new();
    let store = RecordingConfigStore::default();
    let host = valid_host("kvm2", "minikube", None);
    let mut cfg = ClusterConfig::new("minikube", "kvm2");
    let mut node = Node::new("minikube");
    node.ip = "192.168.39.9".to_string();

    let err = save_host(&api, &host, &mut cfg, &mut node, &store).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<RsmachineError>(),
        Some(RsmachineError::Driver(_))
    ));
    assert_eq!(api.saved(), ["minikube"]);
    assert_eq!(node.ip, "192.168.39.9");
    assert!(store.saved().is_empty());
    assert!(cfg.nodes.is_empty());
}

#[test]
fn test_host_save_failure_is_wrapped() {
    let api = FakeApi::new().failing_save();
    let store = RecordingConfigStore::default();
    let host = valid_host("kvm2", "minikube", Some("192.168.39.10"));
    let mut cfg = ClusterConfig::new("minikube", "kvm2");
    let mut node = Node::new("minikube");

    let err = save_host(&api, &host, &mut cfg, &mut node, &store).unwrap_err();

    assert_eq!(err.to_string(), "save");
    assert_eq!(format!("{:#}", err), "save: simulated save failure");
    assert!(node.ip.is_empty());
    assert!(store.saved().is_empty());
}

#[test]
fn test_saved_record_reflects_live_driver_state() {
    let api = FakeApi::new();
    let store = RecordingConfigStore::default();
    let host = valid_host("docker", "minikube", Some("192.168.49.2"));
    let mut cfg = ClusterConfig::new("minikube", "docker");
    let mut node = Node::new("minikube");

    save_host(&api, &host, &mut cfg, &mut node, &store).unwrap();

    let record = api.record("minikube").unwrap();
    assert_eq!(record.driver_name, "docker");
    let raw = record.driver.unwrap();
    assert_eq!(raw["ip_address"].as_str(), Some("192.168.49.2"));
}

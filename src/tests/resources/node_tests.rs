use crate::{
    core::domain::{
        error::FailureKind,
        model::{device::DeviceIdentity, field::Field, record::ResourceRecord},
        registry::DeviceRegistry,
    },
    monitor::application::coordinator::{
        CoordinatorTarget,
        runner::{CoordinatorHandle, CoordinatorState},
    },
    tests::common::{fixture, mount_json},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn mount_online_node(server: &MockServer) {
    mount_json(
        server,
        "GET",
        "/api2/json/nodes",
        json!([
            {"node": "pve1", "status": "online", "cpu": 0.12, "maxdisk": 1000, "disk": 250},
            {"node": "pve2", "status": "offline"}
        ]),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/api2/json/nodes/pve1/status",
        json!({
            "uptime": 86400,
            "cpuinfo": {"model": "AMD EPYC 7302P"},
            "memory": {"total": 1000, "used": 500, "free": 500},
            "swap": {"total": 0, "used": 0, "free": 0}
        }),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/api2/json/nodes/pve1/version",
        json!({"version": "8.2.4", "release": "8.2"}),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/api2/json/nodes/pve1/qemu",
        json!([
            {"vmid": 101, "name": "web", "status": "running"},
            {"vmid": 102, "name": "db", "status": "stopped"}
        ]),
    )
    .await;
    mount_json(server, "GET", "/api2/json/nodes/pve1/lxc", json!([])).await;
}

#[tokio::test]
async fn test_online_node_lists_running_guests() {
    let server = MockServer::start().await;
    mount_online_node(&server).await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Node("pve1".to_string()),
        fixture.context.clone(),
    );

    handle.refresh().await.unwrap();
    assert_eq!(handle.state(), CoordinatorState::Ready);
    let record = handle.current_record().unwrap();
    let node = record.as_node().unwrap();
    assert_eq!(node.status, Field::Value("online".to_string()));
    assert_eq!(node.version, Field::Value("8.2.4".to_string()));
    assert_eq!(node.model, Field::Value("AMD EPYC 7302P".to_string()));
    assert_eq!(node.qemu_on, 1);
    assert_eq!(node.qemu_on_list, Field::Value(vec!["web (101)".to_string()]));
    assert_eq!(node.lxc_on, 0);
    assert_eq!(node.memory_used_percentage(), Field::Value(50.0));
    assert_eq!(node.disk_used_percentage(), Field::Value(25.0));

    let device = fixture
        .devices
        .get(&DeviceIdentity::node("entry1", "pve1"))
        .await
        .unwrap();
    assert_eq!(device.info.name.as_deref(), Some("Node pve1"));
    assert!(device.via_device_id.is_none());
}

#[tokio::test]
async fn test_offline_node_skips_detail_reads() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/api2/json/nodes",
        json!([{"node": "pve2", "status": "offline"}]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve2/status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve2/version"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Node("pve2".to_string()),
        fixture.context.clone(),
    );

    handle.refresh().await.unwrap();
    let record = handle.current_record().unwrap();
    let node = record.as_node().unwrap();
    assert_eq!(node.status, Field::Value("offline".to_string()));
    assert_eq!(node.qemu_on, 0);
    assert!(node.uptime.is_absent());
    assert!(node.memory_used_percentage().is_absent());
}

#[tokio::test]
async fn test_absent_counters_never_read_as_zero() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/api2/json/nodes",
        json!([{"node": "pve1", "status": "online"}]),
    )
    .await;
    mount_json(&server, "GET", "/api2/json/nodes/pve1/status", json!({"uptime": 10})).await;
    mount_json(&server, "GET", "/api2/json/nodes/pve1/version", json!(null)).await;
    mount_json(&server, "GET", "/api2/json/nodes/pve1/qemu", json!([])).await;
    mount_json(&server, "GET", "/api2/json/nodes/pve1/lxc", json!([])).await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Node("pve1".to_string()),
        fixture.context.clone(),
    );

    handle.refresh().await.unwrap();
    let percentage = handle.read(|record| match record {
        ResourceRecord::Node(node) => node.memory_used_percentage(),
        _ => Field::Absent,
    });
    assert!(percentage.is_absent());
    assert_ne!(percentage, Field::Value(0.0));
    assert!(handle
        .read(|record| record.as_node().map_or(Field::Absent, |n| n.version.clone()))
        .is_absent());
}

#[tokio::test]
async fn test_unreachable_node_listing_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "busy"})))
        .mount(&server)
        .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Node("pve1".to_string()),
        fixture.context.clone(),
    );

    let error = handle.refresh().await.unwrap_err();
    assert_eq!(error.failure_kind(), FailureKind::Transient);
    assert_eq!(handle.state(), CoordinatorState::Uninitialized);
    assert!(!fixture.context.needs_reauth());
}

#[tokio::test]
async fn test_empty_node_listing_fails_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_json(&server, "GET", "/api2/json/nodes", json!(null)).await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Node("pve1".to_string()),
        fixture.context.clone(),
    );

    for _ in 0..2 {
        let error = handle.refresh().await.unwrap_err();
        assert_eq!(error.failure_kind(), FailureKind::Transient);
        assert_eq!(handle.state(), CoordinatorState::Uninitialized);
        assert!(handle.current_record().is_none());
    }
}

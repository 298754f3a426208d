use crate::{
    core::domain::{
        model::{
            device::{DeviceIdentity, DeviceInfo},
            field::Field,
            resource_kind::ResourceKind,
        },
        registry::{DeviceRegistry, IssueRegistry},
    },
    monitor::application::coordinator::{
        CoordinatorTarget,
        runner::{CoordinatorHandle, CoordinatorState},
    },
    tests::common::{fixture, mount_forbidden, mount_json},
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn listing(guest_node: &str, node_status: &str) -> Value {
    json!([
        {"type": "node", "id": "node/pve1", "node": "pve1", "status": "online"},
        {"type": "node", "id": "node/pve2", "node": "pve2", "status": node_status},
        {"type": "qemu", "id": "qemu/101", "node": guest_node, "vmid": 101, "name": "web"},
        {"type": "lxc", "id": "lxc/200", "node": guest_node, "vmid": 200, "name": "dns"}
    ])
}

#[tokio::test]
async fn test_suspended_vm_reports_suspended() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/api2/json/cluster/resources", listing("pve1", "online")).await;
    mount_json(
        &server,
        "GET",
        "/api2/json/nodes/pve1/qemu/101/status/current",
        json!({
            "status": "stopped", "lock": "suspended", "name": "web", "qmpstatus": "stopped",
            "maxmem": 2048, "mem": 512, "cpu": 0.0
        }),
    )
    .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(CoordinatorTarget::Qemu(101), fixture.context.clone());

    handle.refresh().await.unwrap();
    let record = handle.current_record().unwrap();
    let vm = record.as_vm().unwrap();
    assert_eq!(vm.node, "pve1");
    assert_eq!(vm.status, Field::Value("suspended".to_string()));
    assert_eq!(vm.memory_free, Field::Value(1536));
    assert_eq!(vm.memory_used_percentage(), Field::Value(25.0));

    let device = fixture
        .devices
        .get(&DeviceIdentity::new("entry1", ResourceKind::Qemu, "101"))
        .await
        .unwrap();
    assert_eq!(device.info.name.as_deref(), Some("QEMU web (101)"));
}

#[tokio::test]
async fn test_migration_relinks_guest_device() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/cluster/resources"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": listing("pve1", "online")})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_json(&server, "GET", "/api2/json/cluster/resources", listing("pve2", "online")).await;
    for node in ["pve1", "pve2"] {
        mount_json(
            &server,
            "GET",
            &format!("/api2/json/nodes/{}/qemu/101/status/current", node),
            json!({"status": "running", "name": "web"}),
        )
        .await;
    }
    let fixture = fixture(&server);
    let pve1 = fixture
        .devices
        .get_or_create(&DeviceIdentity::node("entry1", "pve1"), DeviceInfo::default())
        .await;
    let pve2 = fixture
        .devices
        .get_or_create(&DeviceIdentity::node("entry1", "pve2"), DeviceInfo::default())
        .await;
    let handle = CoordinatorHandle::new(CoordinatorTarget::Qemu(101), fixture.context.clone());
    let identity = DeviceIdentity::new("entry1", ResourceKind::Qemu, "101");

    handle.refresh().await.unwrap();
    let device = fixture.devices.get(&identity).await.unwrap();
    assert_eq!(device.via_device_id, Some(pve1.id.clone()));

    handle.refresh().await.unwrap();
    let device = fixture.devices.get(&identity).await.unwrap();
    assert_eq!(device.via_device_id, Some(pve2.id.clone()));
    assert_eq!(handle.current_record().unwrap().owning_node(), Some("pve2"));
    assert_eq!(fixture.devices.via_write_count(), 2);

    handle.refresh().await.unwrap();
    assert_eq!(fixture.devices.via_write_count(), 2);
}

#[tokio::test]
async fn test_guest_on_offline_node_fails_transiently() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/api2/json/cluster/resources", listing("pve2", "offline")).await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve2/lxc/200/status/current"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(CoordinatorTarget::Lxc(200), fixture.context.clone());

    let error = handle.refresh().await.unwrap_err();
    assert!(!error.is_fatal());
    assert!(error.to_string().contains("pve2"));
    assert_eq!(handle.state(), CoordinatorState::Uninitialized);
    assert!(!fixture.context.needs_reauth());
}

#[tokio::test]
async fn test_container_swap_counters() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/api2/json/cluster/resources", listing("pve1", "online")).await;
    mount_json(
        &server,
        "GET",
        "/api2/json/nodes/pve1/lxc/200/status/current",
        json!({
            "status": "running", "name": "dns", "maxswap": 1024, "swap": 256,
            "maxmem": 512, "mem": 128, "maxdisk": 8192, "disk": 2048
        }),
    )
    .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(CoordinatorTarget::Lxc(200), fixture.context.clone());

    handle.refresh().await.unwrap();
    let record = handle.current_record().unwrap();
    let ct = record.as_lxc().unwrap();
    assert_eq!(ct.status, Field::Value("running".to_string()));
    assert_eq!(ct.swap_free, Field::Value(768));
    assert_eq!(ct.swap_used_percentage(), Field::Value(25.0));
    assert_eq!(ct.disk_used_percentage(), Field::Value(25.0));
}

#[tokio::test]
async fn test_forbidden_guest_status_raises_issue() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/api2/json/cluster/resources", listing("pve1", "online")).await;
    mount_forbidden(
        &server,
        "/api2/json/nodes/pve1/qemu/101/status/current",
        "/vms/101, VM.Audit",
    )
    .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(CoordinatorTarget::Qemu(101), fixture.context.clone());

    assert!(handle.refresh().await.is_err());
    let issue = fixture.issues.get("entry1_101_forbidden").await.unwrap();
    assert_eq!(issue.placeholder("user"), Some("monitor@pve"));
    assert_eq!(
        issue.placeholder("permission"),
        Some("['perm','/vms/101',['VM.Audit']]")
    );
    assert!(issue.persistent);
}

#[tokio::test]
async fn test_forbidden_guest_does_not_block_sibling() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/api2/json/cluster/resources",
        json!([
            {"type": "node", "id": "node/pve1", "node": "pve1", "status": "online"},
            {"type": "qemu", "id": "qemu/101", "node": "pve1", "vmid": 101, "name": "web"},
            {"type": "qemu", "id": "qemu/102", "node": "pve1", "vmid": 102, "name": "db"}
        ]),
    )
    .await;
    mount_forbidden(
        &server,
        "/api2/json/nodes/pve1/qemu/101/status/current",
        "/vms/101, VM.Audit",
    )
    .await;
    mount_json(
        &server,
        "GET",
        "/api2/json/nodes/pve1/qemu/102/status/current",
        json!({"status": "running", "name": "db", "maxmem": 4096, "mem": 1024}),
    )
    .await;
    let fixture = fixture(&server);
    let web = CoordinatorHandle::new(CoordinatorTarget::Qemu(101), fixture.context.clone());
    let db = CoordinatorHandle::new(CoordinatorTarget::Qemu(102), fixture.context.clone());

    let (web_result, db_result) = tokio::join!(web.refresh(), db.refresh());
    assert!(web_result.is_err());
    db_result.unwrap();

    assert!(fixture.issues.contains("entry1_101_forbidden"));
    assert!(!fixture.issues.contains("entry1_102_forbidden"));
    assert_ne!(web.state(), CoordinatorState::Ready);
    assert!(web.current_record().is_none());
    assert_eq!(db.state(), CoordinatorState::Ready);
    let record = db.current_record().unwrap();
    let vm = record.as_vm().unwrap();
    assert_eq!(vm.status, Field::Value("running".to_string()));
    assert_eq!(vm.memory_used_percentage(), Field::Value(25.0));
    assert!(!fixture.context.needs_reauth());
}

use crate::{
    core::domain::model::{disk::DiskType, field::Field},
    monitor::application::coordinator::{
        CoordinatorTarget,
        runner::{CoordinatorHandle, CoordinatorState},
    },
    tests::common::{fixture, mount_forbidden, mount_json},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

async fn mount_disks(server: &MockServer) {
    mount_json(
        server,
        "GET",
        "/api2/json/nodes/pve1/disks/list",
        json!([
            {
                "devpath": "/dev/sda", "serial": "WD-WCC4N0", "wwn": "0x50014ee2",
                "model": "WDC WD40EFRX", "vendor": "ATA", "type": "hdd",
                "size": 4000787030016u64, "health": "PASSED", "rpm": 5400, "wearout": "N/A"
            },
            {
                "devpath": "/dev/nvme0n1", "serial": "S4EWNF0M", "wwn": "unknown",
                "model": "Samsung SSD 970 EVO Plus", "type": "nvme",
                "size": 500107862016u64, "health": "PASSED", "wearout": 97
            }
        ]),
    )
    .await;
}

fn target(disk_id: &str) -> CoordinatorTarget {
    CoordinatorTarget::Disk {
        node: "pve1".to_string(),
        disk_id: disk_id.to_string(),
    }
}

#[tokio::test]
async fn test_ata_text_report_temperature() {
    let server = MockServer::start().await;
    mount_disks(&server).await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/disks/smart"))
        .and(query_param("disk", "/dev/sda"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {
            "type": "text",
            "health": "PASSED",
            "text": "Temperature_Celsius: 194 34 (Min/Max 20/60)\nPower_Cycle_Count: 12 88\n"
        }})))
        .expect(1)
        .mount(&server)
        .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(target("WD-WCC4N0"), fixture.context.clone());

    handle.refresh().await.unwrap();
    let record = handle.current_record().unwrap();
    let disk = record.as_disk().unwrap();
    assert_eq!(disk.temperature, Field::Value(34));
    assert_eq!(disk.power_cycles, Field::Value(88));
    assert_eq!(disk.disk_type, Some(DiskType::Hdd));
    assert_eq!(disk.rpm, Field::Value(5400.0));
    assert!(disk.wearout.is_absent());
    assert_eq!(disk.path.as_deref(), Some("/dev/sda"));
}

#[tokio::test]
async fn test_refused_smart_keeps_disk_available() {
    let server = MockServer::start().await;
    mount_disks(&server).await;
    mount_forbidden(&server, "/api2/json/nodes/pve1/disks/smart", "/, Sys.Audit").await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(target("S4EWNF0M"), fixture.context.clone());

    handle.refresh().await.unwrap();
    assert_eq!(handle.state(), CoordinatorState::Ready);
    let record = handle.current_record().unwrap();
    let disk = record.as_disk().unwrap();
    assert_eq!(disk.wearout, Field::Value(97.0));
    assert!(disk.rpm.is_absent());
    assert!(disk.temperature.is_absent());
    assert!(fixture.issues.is_empty());
}

#[tokio::test]
async fn test_forbidden_disk_list_gives_unknown_record() {
    let server = MockServer::start().await;
    mount_forbidden(&server, "/api2/json/nodes/pve1/disks/list", "/nodes/pve1, Sys.Audit").await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(target("/dev/sda"), fixture.context.clone());

    handle.refresh().await.unwrap();
    assert!(fixture.issues.contains("entry1_pve1_/dev/sda_forbidden"));
    let record = handle.current_record().unwrap();
    assert!(record.as_disk().unwrap().health.is_absent());
}

#[tokio::test]
async fn test_removed_disk_fails_cycle() {
    let server = MockServer::start().await;
    mount_disks(&server).await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(target("/dev/sdz"), fixture.context.clone());

    let error = handle.refresh().await.unwrap_err();
    assert!(!error.is_fatal());
    assert_eq!(handle.state(), CoordinatorState::Uninitialized);
}

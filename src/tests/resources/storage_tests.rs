use crate::{
    core::domain::{model::field::Field, registry::IssueRegistry},
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

fn storages() -> serde_json::Value {
    json!([
        {
            "type": "storage", "id": "storage/pve1/local", "node": "pve1",
            "storage": "local", "content": "iso,vztmpl,backup",
            "maxdisk": 1000, "disk": 750, "status": "available"
        },
        {
            "type": "storage", "id": "storage/pve1/local-lvm", "node": "pve1",
            "storage": "local-lvm", "content": "images,rootdir"
        }
    ])
}

#[tokio::test]
async fn test_storage_by_name_and_by_id() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/api2/json/cluster/resources", storages()).await;
    let fixture = fixture(&server);

    for selected in ["local", "storage/pve1/local"] {
        let handle = CoordinatorHandle::new(
            CoordinatorTarget::Storage(selected.to_string()),
            fixture.context.clone(),
        );
        handle.refresh().await.unwrap();
        let record = handle.current_record().unwrap();
        let storage = record.as_storage().unwrap();
        assert_eq!(storage.storage_id, "storage/pve1/local");
        assert_eq!(storage.name, "Storage pve1/local");
        assert_eq!(storage.content, Field::Value("iso,vztmpl,backup".to_string()));
        assert_eq!(storage.disk_free(), Field::Value(250));
        assert_eq!(storage.disk_used_percentage(), Field::Value(75.0));
    }
}

#[tokio::test]
async fn test_forbidden_storage_raises_then_clears_issue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/cluster/resources"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "data": null,
            "message": "Permission check failed (/storage/local, Datastore.Audit)"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_json(&server, "GET", "/api2/json/cluster/resources", storages()).await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Storage("local".to_string()),
        fixture.context.clone(),
    );

    assert!(handle.refresh().await.is_err());
    assert_ne!(handle.state(), CoordinatorState::Ready);
    let issue = fixture.issues.get("entry1_local_forbidden").await.unwrap();
    assert!(issue.placeholder("permission").unwrap().contains("/storage/local"));
    assert_eq!(issue.placeholder("user"), Some("monitor@pve"));

    handle.refresh().await.unwrap();
    assert_eq!(handle.state(), CoordinatorState::Ready);
    assert!(!fixture.issues.contains("entry1_local_forbidden"));
}

#[tokio::test]
async fn test_storage_without_content_fails_cycle() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/api2/json/cluster/resources",
        json!([{"type": "storage", "id": "storage/pve1/nfs", "node": "pve1", "storage": "nfs"}]),
    )
    .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Storage("nfs".to_string()),
        fixture.context.clone(),
    );

    let error = handle.refresh().await.unwrap_err();
    assert!(!error.is_fatal());
    assert!(handle.current_record().is_none());
}

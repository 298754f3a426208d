use crate::{
    core::domain::model::field::Field,
    monitor::application::coordinator::{CoordinatorTarget, runner::CoordinatorHandle},
    tests::common::{fixture, mount_forbidden, mount_json},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn mount_nodes(server: &MockServer) {
    mount_json(
        server,
        "GET",
        "/api2/json/nodes",
        json!([
            {"node": "pve1", "status": "online"},
            {"node": "pve2", "status": "offline"}
        ]),
    )
    .await;
}

#[tokio::test]
async fn test_updates_sorted_and_counted() {
    let server = MockServer::start().await;
    mount_nodes(&server).await;
    mount_json(
        &server,
        "GET",
        "/api2/json/nodes/pve1/apt/update",
        json!([
            {"Package": "pve-manager", "Title": "Proxmox VE Manager", "Version": "8.2.4"},
            {"Package": "libc6", "Title": "GNU C Library", "Version": "2.36-9"},
            {"Package": "zstd", "Version": "1.5.4"}
        ]),
    )
    .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Update("pve1".to_string()),
        fixture.context.clone(),
    );

    handle.refresh().await.unwrap();
    let record = handle.current_record().unwrap();
    let update = record.as_update().unwrap();
    assert_eq!(
        update.updates_list,
        Field::Value(vec![
            "GNU C Library - 2.36-9".to_string(),
            "Proxmox VE Manager - 8.2.4".to_string(),
            "zstd - 1.5.4".to_string(),
        ])
    );
    assert_eq!(update.total, Field::Value(3));
    assert_eq!(update.update_available, Field::Value(true));
}

#[tokio::test]
async fn test_no_pending_updates() {
    let server = MockServer::start().await;
    mount_nodes(&server).await;
    mount_json(&server, "GET", "/api2/json/nodes/pve1/apt/update", json!([])).await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Update("pve1".to_string()),
        fixture.context.clone(),
    );

    handle.refresh().await.unwrap();
    let record = handle.current_record().unwrap();
    let update = record.as_update().unwrap();
    assert_eq!(update.total, Field::Value(0));
    assert_eq!(update.update_available, Field::Value(false));
}

#[tokio::test]
async fn test_offline_node_has_unknown_updates() {
    let server = MockServer::start().await;
    mount_nodes(&server).await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve2/apt/update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Update("pve2".to_string()),
        fixture.context.clone(),
    );

    handle.refresh().await.unwrap();
    let record = handle.current_record().unwrap();
    let update = record.as_update().unwrap();
    assert!(update.total.is_absent());
    assert!(update.update_available.is_absent());
}

#[tokio::test]
async fn test_forbidden_update_list_raises_issue() {
    let server = MockServer::start().await;
    mount_nodes(&server).await;
    mount_forbidden(&server, "/api2/json/nodes/pve1/apt/update", "/nodes/pve1, Sys.Modify").await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Update("pve1".to_string()),
        fixture.context.clone(),
    );

    handle.refresh().await.unwrap();
    assert!(fixture.issues.contains("entry1_update_pve1_forbidden"));
    let record = handle.current_record().unwrap();
    assert!(record.as_update().unwrap().updates_list.is_absent());
}

#[tokio::test]
async fn test_empty_node_listing_is_not_offline() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/api2/json/nodes", json!([])).await;
    let fixture = fixture(&server);
    let handle = CoordinatorHandle::new(
        CoordinatorTarget::Update("pve1".to_string()),
        fixture.context.clone(),
    );

    assert!(handle.refresh().await.is_err());
    assert!(handle.current_record().is_none());
    assert!(!handle.last_refresh_ok());
}

mod common;

use common::{Reject, Step, provisioner};
use std::time::Duration;
use stratus_cloud::model::AddInterfaceOpts;
use stratus_cloud::{CloudError, ResourceKind, ResourceState, ResourceStatus};
use tokio::time::Instant;

fn subnet(id: &str) -> AddInterfaceOpts {
    AddInterfaceOpts {
        subnet_id: Some(id.to_string()),
        port_id: None,
    }
}

fn record() -> ResourceState {
    ResourceState::untracked(ResourceKind::RouterInterface)
}

#[tokio::test(start_paused = true)]
async fn test_create_router_interface() {
    let (fake, provisioner) = provisioner();
    fake.script(
        "port-1",
        &[Step::State("BUILD"), Step::State("PENDING_CREATE"), Step::State("ACTIVE")],
    );

    let mut record = record();
    let port = provisioner
        .create_router_interface("router-1", &subnet("subnet-a"), &mut record)
        .await
        .unwrap();

    assert_eq!(port.id, "port-1");
    assert_eq!(fake.count("get_port port-1"), 3);
    assert_eq!(record.id, "port-1");
    assert_eq!(record.status, ResourceStatus::Ready);
    assert_eq!(
        record.get_attribute::<String>("router_id").as_deref(),
        Some("router-1")
    );
    assert_eq!(
        record.get_attribute::<String>("subnet_id").as_deref(),
        Some("subnet-a")
    );
    assert_eq!(provisioner.locks().active_keys(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_create_router_interface_requires_one_of_subnet_or_port() {
    let (fake, provisioner) = provisioner();

    let mut record = record();
    let err = provisioner
        .create_router_interface("router-1", &AddInterfaceOpts::default(), &mut record)
        .await
        .unwrap_err();

    assert!(matches!(err, CloudError::InvalidConfig(_)));
    assert!(fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_same_router_is_serialized() {
    let (fake, provisioner) = provisioner();
    fake.script("port-1", &[Step::State("BUILD"), Step::State("ACTIVE")]);
    fake.script("port-2", &[Step::State("BUILD"), Step::State("ACTIVE")]);

    let started = Instant::now();
    let (mut first, mut second) = (record(), record());
    let (subnet_a, subnet_b) = (subnet("subnet-a"), subnet("subnet-b"));
    let (a, b) = tokio::join!(
        provisioner.create_router_interface("router-1", &subnet_a, &mut first),
        provisioner.create_router_interface("router-1", &subnet_b, &mut second),
    );
    a.unwrap();
    b.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(10));
    let calls = fake.calls();
    let last_probe = calls
        .iter()
        .rposition(|c| c == "get_port port-1")
        .unwrap();
    let second_add = fake
        .position("add_router_interface router-1 subnet-b")
        .unwrap();
    assert!(second_add > last_probe);
}

#[tokio::test(start_paused = true)]
async fn test_different_routers_run_concurrently() {
    let (fake, provisioner) = provisioner();
    fake.script("port-1", &[Step::State("BUILD"), Step::State("ACTIVE")]);
    fake.script("port-2", &[Step::State("BUILD"), Step::State("ACTIVE")]);

    let started = Instant::now();
    let (mut first, mut second) = (record(), record());
    let (subnet_a, subnet_b) = (subnet("subnet-a"), subnet("subnet-b"));
    let (a, b) = tokio::join!(
        provisioner.create_router_interface("router-1", &subnet_a, &mut first),
        provisioner.create_router_interface("router-2", &subnet_b, &mut second),
    );
    a.unwrap();
    b.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_delete_router_interface_retries_while_in_use() {
    let (fake, provisioner) = provisioner();
    fake.reject(
        "remove_router_interface",
        &[Reject::Conflict, Reject::Conflict],
    );
    fake.script(
        "port-1",
        &[Step::State("ACTIVE"), Step::State("ACTIVE"), Step::Missing],
    );

    let mut record = ResourceState::new("port-1", ResourceKind::RouterInterface)
        .with_attribute("router_id", serde_json::json!("router-1"));
    provisioner.delete_router_interface(&mut record).await.unwrap();

    assert_eq!(fake.count("remove_router_interface router-1 port-1"), 3);
    assert_eq!(fake.count("get_port port-1"), 3);
    assert!(!record.is_tracked());
}

#[tokio::test(start_paused = true)]
async fn test_delete_router_interface_needs_router() {
    let (fake, provisioner) = provisioner();

    let mut record = ResourceState::new("port-1", ResourceKind::RouterInterface);
    let err = provisioner
        .delete_router_interface(&mut record)
        .await
        .unwrap_err();

    assert!(matches!(err, CloudError::InvalidId(_)));
    assert!(fake.calls().is_empty());
    assert!(record.is_tracked());
}

#[tokio::test(start_paused = true)]
async fn test_delete_router_interface_server_error_stops() {
    let (fake, provisioner) = provisioner();
    fake.reject("remove_router_interface", &[Reject::Server]);
    fake.script("port-1", &[Step::State("ACTIVE")]);

    let mut record = ResourceState::new("port-1", ResourceKind::RouterInterface)
        .with_attribute("router_id", serde_json::json!("router-1"));
    let err = provisioner
        .delete_router_interface(&mut record)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("internal error"));
    assert_eq!(fake.count("get_port"), 0);
    assert_eq!(record.id, "port-1");
    assert_eq!(
        record.get_attribute::<String>("router_id").as_deref(),
        Some("router-1")
    );
}

#[tokio::test(start_paused = true)]
async fn test_read_router_interface() {
    let (fake, provisioner) = provisioner();
    fake.script("port-1", &[Step::State("ACTIVE")]);
    provisioner
        .create_router_interface("router-9", &subnet("subnet-z"), &mut record())
        .await
        .unwrap();

    let mut record = ResourceState::new("port-1", ResourceKind::RouterInterface);
    provisioner.read_router_interface(&mut record).await.unwrap();

    assert_eq!(
        record.get_attribute::<String>("router_id").as_deref(),
        Some("router-9")
    );
    assert_eq!(
        record.get_attribute::<String>("subnet_id").as_deref(),
        Some("subnet-z")
    );
}

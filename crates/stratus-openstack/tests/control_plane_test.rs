//! Integration tests for the OpenStack client against a mock API.

use serde_json::json;
use stratus_cloud::model::{AddInterfaceOpts, AttachVolumeOpts, CreateClusterOpts, CreateNetworkOpts};
use stratus_cloud::{CloudError, ControlPlane, RemoteObject};
use stratus_openstack::{Endpoints, OpenStackClient, OpenStackError, Service};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "gAAAAAB-test-token";

fn client(server: &MockServer) -> OpenStackClient {
    let mut endpoints = Endpoints::new();
    for service in Service::ALL {
        let base = format!("{}/{}", server.uri(), service.service_type());
        endpoints = endpoints.with(service, &base).unwrap();
    }
    OpenStackClient::new(endpoints, TOKEN).unwrap()
}

#[tokio::test]
async fn test_get_network_sends_token_and_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/network/v2.0/networks/n-1"))
        .and(header("X-Auth-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "network": {
                "id": "n-1",
                "name": "web",
                "status": "BUILD",
                "admin_state_up": true,
                "shared": false,
                "subnets": [],
                "mtu": 1450
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let network = client(&server).get_network("n-1").await.unwrap();
    assert_eq!(network.id, "n-1");
    assert_eq!(network.status(), "BUILD");
}

#[tokio::test]
async fn test_create_network_wraps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/network/v2.0/networks"))
        .and(body_json(json!({ "network": { "name": "web" } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "network": { "id": "n-2", "name": "web", "status": "BUILD" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let opts = CreateNetworkOpts {
        name: "web".to_string(),
        ..Default::default()
    };
    let network = client(&server).create_network(&opts).await.unwrap();
    assert_eq!(network.id, "n-2");
}

#[tokio::test]
async fn test_not_found_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/volumev3/volumes/v-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "itemNotFound": { "code": 404, "message": "Volume v-404 could not be found." }
        })))
        .mount(&server)
        .await;

    let err = client(&server).get_volume("v-404").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("could not be found"));
}

#[tokio::test]
async fn test_remove_router_interface_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/network/v2.0/routers/r-1/remove_router_interface"))
        .and(body_json(json!({ "port_id": "p-1" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "NeutronError": { "type": "RouterInUse", "message": "Router r-1 still has ports" }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .remove_router_interface("r-1", "p-1")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_add_router_interface_unwrapped_response() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/network/v2.0/routers/r-1/add_router_interface"))
        .and(body_json(json!({ "subnet_id": "s-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "r-1",
            "subnet_id": "s-1",
            "port_id": "p-9",
            "tenant_id": "t-1"
        })))
        .mount(&server)
        .await;

    let opts = AddInterfaceOpts {
        subnet_id: Some("s-1".to_string()),
        port_id: None,
    };
    let interface = client(&server)
        .add_router_interface("r-1", &opts)
        .await
        .unwrap();
    assert_eq!(interface.port_id, "p-9");
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/network/v2.0/networks/n-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client(&server).delete_network("n-1").await.unwrap_err();
    assert!(matches!(
        err,
        CloudError::Api { status: 503, ref message } if message == "upstream unavailable"
    ));
}

#[tokio::test]
async fn test_attach_volume_camel_case() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compute/servers/srv-1/os-volume_attachments"))
        .and(body_json(json!({ "volumeAttachment": { "volumeId": "v-1" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "volumeAttachment": {
                "id": "att-1",
                "serverId": "srv-1",
                "volumeId": "v-1",
                "device": "/dev/vdb"
            }
        })))
        .mount(&server)
        .await;

    let opts = AttachVolumeOpts {
        server_id: "srv-1".to_string(),
        volume_id: "v-1".to_string(),
        device: None,
    };
    let attachment = client(&server).attach_volume(&opts).await.unwrap();
    assert_eq!(attachment.id, "att-1");
    assert_eq!(attachment.device.as_deref(), Some("/dev/vdb"));
}

#[tokio::test]
async fn test_cluster_lifecycle_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/container-infra/v1/clusters"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "uuid": "c-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "c-1",
            "name": "k8s",
            "status": "CREATE_IN_PROGRESS",
            "node_count": 3,
            "master_count": 1,
            "cluster_template_id": "tpl-1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/container-infra/v1/clusters/c-1"))
        .and(body_json(json!([{ "op": "replace", "path": "/node_count", "value": 5 }])))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "uuid": "c-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let opts = CreateClusterOpts {
        name: "k8s".to_string(),
        cluster_template_id: "tpl-1".to_string(),
        ..Default::default()
    };
    let id = client.create_cluster(&opts).await.unwrap();
    assert_eq!(id, "c-1");

    let cluster = client.get_cluster(&id).await.unwrap();
    assert_eq!(cluster.status, "CREATE_IN_PROGRESS");

    client.resize_cluster(&id, 5).await.unwrap();
}

#[tokio::test]
async fn test_cascade_delete_query() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/load-balancer/v2/lbaas/loadbalancers/lb-1"))
        .and(query_param("cascade", "true"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .delete_loadbalancer("lb-1", true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_endpoint_is_config_error() {
    let client = OpenStackClient::new(Endpoints::new(), TOKEN).unwrap();
    let err = client.get_keypair("deploy").await.unwrap_err();
    assert!(matches!(err, CloudError::InvalidConfig(_)));
}

#[test]
fn test_empty_token_rejected() {
    assert!(matches!(
        OpenStackClient::new(Endpoints::new(), "  "),
        Err(OpenStackError::MissingToken)
    ));
}

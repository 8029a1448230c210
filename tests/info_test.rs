mod common;

use planets::planets::planet_info;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use common::{PLANETS_PATH, capture_log, instance_client, mount_planets, mount_token};

#[tokio::test]
async fn test_info_logs_each_planet() {
    let log = capture_log();
    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;
    mount_planets(
        &server,
        vec![json!({
            "id": "e-3",
            "name": "Earth",
            "type": "un_planet",
            "properties": {"diameter": 12756, "length_of_day": 24.0, "number_of_moons": 1, "mean_temperature": 15}
        })],
    )
    .await;

    let instances = planet_info(&instance_client(&server)).await.unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].properties["diameter"], json!(12756));

    let output = log.contents();
    assert!(output.contains("INFO Id: e-3\n"));
    assert!(output.contains("INFO Name: Earth\n"));
    assert!(output.contains("INFO Diameter (km): 12756\n"));
    assert!(output.contains("INFO Length of day (hours): 24.0\n"));
    assert!(output.contains("INFO Number of moons: 1\n"));
    assert!(output.contains("INFO Mean temperature (°C): 15\n"));
}

#[tokio::test]
async fn test_info_on_empty_collection_says_so() {
    let log = capture_log();
    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;
    Mock::given(method("GET"))
        .and(path(PLANETS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let instances = planet_info(&instance_client(&server)).await.unwrap();
    assert!(instances.is_empty());
    assert!(
        log.contents()
            .contains(" INFO No instances of type un_planet found\n")
    );
}

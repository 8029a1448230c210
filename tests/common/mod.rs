#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::Write,
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use planets::{
    cms::InstanceClient,
    config::{self, CmsConfig},
    http::RetryPolicy,
    logger::{self, Level, Logger},
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const TENANT: &str = "tenant-1";
pub const TOKEN_PATH: &str = "/tenants/tenant-1/oauth2/token";
pub const PLANETS_PATH: &str = "/cms/instances/object/un_planet";

/// Configuration pointing at `server` with short retry waits.
pub fn cms_config(server: &MockServer) -> CmsConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        (config::VAR_BASE_URL, server.uri()),
        (config::VAR_TENANT_ID, TENANT.to_string()),
        (config::VAR_CONF_CLIENT_ID, "client-1".to_string()),
        (config::VAR_CLIENT_SECRET, "s3cret".to_string()),
    ]);

    let mut config = CmsConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
    config.http.timeout = Duration::from_secs(5);
    config.http.retry = RetryPolicy {
        max_retries: 3,
        min_wait: Duration::from_millis(10),
        max_wait: Duration::from_millis(50),
    };
    config
}

pub fn instance_client(server: &MockServer) -> InstanceClient {
    InstanceClient::from_config(&cms_config(server)).unwrap()
}

/// Serves `token` from the token endpoint, expecting `times` requests.
pub async fn mount_token(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": token, "expires_in": 3600})),
        )
        .expect(times)
        .mount(server)
        .await;
}

pub fn planet(server: &MockServer, id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "un_planet",
        "properties": {"diameter": 4879, "length_of_day": 4222.6},
        "_links": {
            "urn:eim:linkrel:delete": {"href": format!("{}{}/{}", server.uri(), PLANETS_PATH, id)}
        }
    })
}

pub fn collection(instances: Vec<Value>) -> Value {
    json!({"_embedded": {"collection": instances}})
}

pub async fn mount_planets(server: &MockServer, instances: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(PLANETS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection(instances)))
        .mount(server)
        .await;
}

/// Writes `records` to a temporary sample data file.
pub fn sample_file(records: Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, records.to_string().as_bytes()).unwrap();
    file
}

/// Log output collected in memory.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Routes the process-wide logger into memory. Must run before anything in
/// the test binary logs.
pub fn capture_log() -> &'static LogCapture {
    static CAPTURE: OnceLock<LogCapture> = OnceLock::new();
    CAPTURE.get_or_init(|| {
        let capture = LogCapture::default();
        assert!(logger::init(Logger::with_writer(Level::Info, capture.clone())));
        capture
    })
}

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use tokio::{
    sync::Semaphore,
    task::JoinHandle,
    time::{Instant, timeout_at},
};

use crate::{
    Error, Res,
    cms::AuthClient,
    config::{CmsConfig, DeleteSettings},
    error,
    http::{HttpClient, HttpRequest, HttpResponse},
    info,
    types::{BatchReport, Instance, InstanceBody, InstanceCollection},
    warning,
};

/// Client for the `/instances/{category}/{type}` collections of the CMS.
#[derive(Debug, Clone)]
pub struct InstanceClient {
    http: HttpClient,
    auth: AuthClient,
    cms_host: String,
    delete: DeleteSettings,
}

impl InstanceClient {
    pub fn new(http: HttpClient, auth: AuthClient, cms_host: String, delete: DeleteSettings) -> Self {
        Self {
            http,
            auth,
            cms_host: cms_host.trim_end_matches('/').to_string(),
            delete,
        }
    }

    pub fn from_config(config: &CmsConfig) -> Res<Self> {
        let http = HttpClient::new(&config.http)?;
        let auth = AuthClient::new(http.clone(), config);
        Ok(Self::new(http, auth, config.cms_host(), config.delete.clone()))
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn instances_url(&self, category: &str, type_name: &str) -> String {
        format!("{}/instances/{}/{}", self.cms_host, category, type_name)
    }

    /// Lists every instance of a type. An empty collection is not an error.
    pub async fn list_by_type(&self, category: &str, type_name: &str) -> Res<Vec<Instance>> {
        let url = self.instances_url(category, type_name);
        let response = self
            .send_authorized(HttpRequest::new(Method::GET, url.as_str()), false)
            .await?;
        let response = ensure_success(Method::GET, &url, response)?;

        let collection: InstanceCollection = serde_json::from_str(&response.body)?;
        Ok(collection.into_instances())
    }

    pub async fn create<P: Serialize>(
        &self,
        category: &str,
        type_name: &str,
        body: &InstanceBody<P>,
    ) -> Res<HttpResponse> {
        info!(
            "Creating instance of type {} with name: {}",
            type_name, body.name
        );

        let url = self.instances_url(category, type_name);
        let request = HttpRequest::with_json_body(Method::POST, url.as_str(), serde_json::to_string(body)?);
        let response = self.send_authorized(request, false).await?;
        ensure_success(Method::POST, &url, response)
    }

    pub async fn update<P: Serialize>(
        &self,
        category: &str,
        type_name: &str,
        body: &InstanceBody<P>,
        id: &str,
    ) -> Res<HttpResponse> {
        if id.is_empty() {
            return Err(Error::InstanceNotFound {
                name: body.name.clone(),
            });
        }

        info!(
            "Updating instance of type {} with name: {}",
            type_name, body.name
        );

        let url = format!("{}/{}", self.instances_url(category, type_name), id);
        let request = HttpRequest::with_json_body(Method::PUT, url.as_str(), serde_json::to_string(body)?);
        let response = self.send_authorized(request, false).await?;
        ensure_success(Method::PUT, &url, response)
    }

    /// Deletes every instance of a type.
    ///
    /// Deletes run as separate tasks, at most `delete.concurrency` at a time,
    /// through the retrying path. Each dispatched task yields exactly one
    /// outcome in the report; tasks still running when the batch deadline
    /// passes are reported as failed.
    pub async fn delete_all_of_type(&self, category: &str, type_name: &str) -> Res<BatchReport> {
        let instances = self.list_by_type(category, type_name).await?;
        let collection_url = self.instances_url(category, type_name);

        let semaphore = Arc::new(Semaphore::new(self.delete.concurrency.max(1)));
        let deadline = Instant::now() + self.delete.timeout;
        let deadline_secs = self.delete.timeout.as_secs();

        let mut tasks: Vec<(String, JoinHandle<Res<()>>)> = Vec::with_capacity(instances.len());
        for instance in instances {
            info!(
                "Deleting instance of type {} with id: {} and name: {}",
                instance.type_name, instance.id, instance.name
            );

            let client = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let url = match instance.delete_href() {
                Some(href) => href.to_string(),
                None => {
                    warning!(
                        "Instance {} has no delete link, using the collection url",
                        instance.id
                    );
                    format!("{}/{}", collection_url, instance.id)
                }
            };

            let task = tokio::spawn(async move {
                let work = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| Error::Cancelled("delete permits are no longer available"))?;
                    client.delete_instance(&url).await
                };

                match timeout_at(deadline, work).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::DeadlineElapsed(deadline_secs)),
                }
            });
            tasks.push((instance.id, task));
        }

        let mut report = BatchReport::default();
        for (id, task) in tasks {
            match task.await {
                Ok(Ok(())) => {
                    info!("Item with id {} deleted", id);
                    report.record_success(id);
                }
                Ok(Err(e)) => {
                    error!("Unable to delete item with id {}: {}", id, e);
                    report.record_failure(id, e);
                }
                Err(e) => {
                    error!("Unable to delete item with id {}: {}", id, e);
                    report.record_failure(id, e);
                }
            }
        }

        info!("Finished deleting instances for type {}", type_name);
        Ok(report)
    }

    async fn delete_instance(&self, url: &str) -> Res<()> {
        let response = self
            .send_authorized(HttpRequest::new(Method::DELETE, url), true)
            .await?;
        ensure_success(Method::DELETE, url, response).map(|_| ())
    }

    /// Sends `request` with the current bearer token. A 401 drops the cached
    /// token, unless a concurrent caller already replaced it, and the request
    /// is sent once more.
    async fn send_authorized(&self, request: HttpRequest, with_retry: bool) -> Res<HttpResponse> {
        let authorized = self.auth.authorize(request.clone()).await?;
        let response = self.http.execute(&authorized, with_retry).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warning!("Access token was rejected, fetching a new one");
        match authorized.bearer_token() {
            Some(rejected) => self.auth.invalidate_rejected(rejected).await,
            None => self.auth.invalidate_cache().await,
        }
        let authorized = self.auth.authorize(request).await?;
        Ok(self.http.execute(&authorized, with_retry).await?)
    }
}

fn ensure_success(method: Method, url: &str, response: HttpResponse) -> Res<HttpResponse> {
    if response.is_error() {
        return Err(Error::Status {
            method,
            url: url.to_string(),
            status: response.status.as_u16(),
            body: response.body,
        });
    }
    Ok(response)
}

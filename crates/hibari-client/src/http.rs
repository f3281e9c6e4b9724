use crate::{Error, NotificationApi, Result};
use bytes::Bytes;
use hibari_type::{Notification, NotificationId};
use http::{Method, Request, Response, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{client::legacy::Client as HyperClient, rt::TokioExecutor};
use smol_str::SmolStr;
use std::time::Duration;
use tower::{
    timeout::TimeoutLayer, util::BoxCloneSyncService, BoxError as TowerBoxError, ServiceBuilder,
    ServiceExt,
};

/// Default request timeout for confirmation calls
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

type Body = Full<Bytes>;
type HttpService = BoxCloneSyncService<Request<Body>, Response<Incoming>, TowerBoxError>;

/// REST backend of the notification API
///
/// A thin tower stack over a hyper client: every request runs under a short
/// timeout so a wedged confirmation call can never hold the caller hostage.
pub struct HttpNotificationApi {
    base_url: SmolStr,
    inner: HttpService,
}

impl HttpNotificationApi {
    /// Build a client against the given base URL
    ///
    /// # Errors
    ///
    /// - Native TLS roots failed to load
    pub fn new(base_url: impl AsRef<str>, timeout: Option<Duration>) -> Result<Self> {
        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|err| Error::Transport(err.into()))?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();

        let client = HyperClient::builder(TokioExecutor::new()).build(connector);
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(
                timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            ))
            .service(client);

        Ok(Self {
            base_url: SmolStr::new(base_url),
            inner: BoxCloneSyncService::new(service),
        })
    }

    fn uri(&self, path: &str) -> Result<Uri> {
        format!("{}{path}", self.base_url)
            .parse()
            .map_err(Error::from)
    }

    async fn execute(&self, method: Method, path: &str) -> Result<Response<Incoming>> {
        let request = Request::builder()
            .method(method)
            .uri(self.uri(path)?)
            .body(Body::new(Bytes::new()))
            .map_err(|err| Error::Transport(err.into()))?;

        let response = self
            .inner
            .clone()
            .oneshot(request)
            .await
            .map_err(Error::Transport)?;

        if !response.status().is_success() {
            return Err(Error::BadStatus(response.status()));
        }

        Ok(response)
    }

    async fn execute_empty(&self, method: Method, path: &str) -> Result<()> {
        self.execute(method, path).await.map(|_| ())
    }
}

impl NotificationApi for HttpNotificationApi {
    async fn list(&self) -> Result<Vec<Notification>> {
        let response = self.execute(Method::GET, "/notifications").await?;
        let mut body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| Error::Transport(err.into()))?
            .to_bytes()
            .to_vec();

        simd_json::from_slice(&mut body).map_err(Error::from)
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<()> {
        self.execute_empty(Method::PATCH, &format!("/notifications/{id}/read"))
            .await
    }

    async fn mark_unread(&self, id: &NotificationId) -> Result<()> {
        self.execute_empty(Method::PATCH, &format!("/notifications/{id}/unread"))
            .await
    }

    async fn mark_all_read(&self) -> Result<()> {
        self.execute_empty(Method::PATCH, "/notifications/read-all")
            .await
    }

    async fn delete(&self, id: &NotificationId) -> Result<()> {
        self.execute_empty(Method::DELETE, &format!("/notifications/{id}"))
            .await
    }
}

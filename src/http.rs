//! HTTP transport used by the routing client.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Method, Request, Response};
use std::time::Duration;

/// Sends a prepared request. Decorators such as [`QueryKey`] wrap an inner
/// client and alter the request before passing it on.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// `reqwest` client with both connect and total timeouts set.
pub struct TimedClient(reqwest::Client);

impl TimedClient {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for TimedClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}

/// Appends an API key to every request URL as `name=value`.
///
/// The key is given at construction, so no call site reads it from the
/// environment.
pub struct QueryKey<C> {
    inner: C,
    name: String,
    value: String,
}

impl<C> QueryKey<C> {
    pub fn new(inner: C, name: &str, value: &str) -> Self {
        Self {
            inner,
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn sign(&self, req: &mut Request) {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.name, &self.value);
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for QueryKey<C> {
    async fn execute(&self, mut req: Request) -> reqwest::Result<Response> {
        self.sign(&mut req);
        self.inner.execute(req).await
    }
}

/// GETs `url` and returns the body; non-2xx statuses are errors.
pub async fn get_body<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = Request::new(Method::GET, url.parse()?);
    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

use crate::trace_context::inject_traceparent;
use tracing::{field, Instrument, Level};

/// reqwest wrapper that runs each request inside an `outgoing_http` span and
/// injects a `traceparent` header.
#[derive(Clone)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Execute a built request. Status is recorded on the span; 4xx/5xx also
    /// set `error = true`. The response is returned as-is regardless of status.
    pub async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let span = tracing::span!(
            Level::INFO,
            "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            http.status_code = field::Empty,
            error = field::Empty,
            otel.kind = "client",
        );

        inject_traceparent(req.headers_mut());

        let response = self
            .inner
            .execute(req)
            .instrument(span.clone())
            .await?;

        let status = response.status();
        span.record("http.status_code", status.as_u16());
        if status.is_client_error() || status.is_server_error() {
            span.record("error", true);
        }

        Ok(response)
    }

    pub async fn get(&self, url: &str) -> reqwest::Result<reqwest::Response> {
        let req = self.inner.get(url).build()?;
        self.execute(req).await
    }

    /// Start a request; finish it with `.build()` and pass it to [`execute`](Self::execute).
    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.inner.request(method, url)
    }
}

impl From<reqwest::Client> for TracedClient {
    fn from(c: reqwest::Client) -> Self {
        Self::new(c)
    }
}

impl Default for TracedClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn injects_traceparent_header() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/ping").header_exists("traceparent");
            then.status(200).body("ok");
        });

        let client = TracedClient::from(reqwest::Client::new());
        let resp = client.get(&format!("{}/ping", server.base_url())).await.unwrap();

        assert!(resp.status().is_success());
        m.assert();
    }

    #[tokio::test]
    async fn error_statuses_are_returned_not_raised() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(DELETE).path("/gone");
            then.status(404).body("missing");
        });

        let client = TracedClient::default();
        let req = client
            .request(reqwest::Method::DELETE, &format!("{}/gone", server.base_url()))
            .build()
            .unwrap();
        let resp = client.execute(req).await.unwrap();

        assert_eq!(resp.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn caller_supplied_traceparent_is_preserved() {
        let tp = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/ping").header("traceparent", tp);
            then.status(204);
        });

        let client = TracedClient::default();
        let req = client
            .request(reqwest::Method::GET, &format!("{}/ping", server.base_url()))
            .header("traceparent", tp)
            .build()
            .unwrap();
        client.execute(req).await.unwrap();

        m.assert();
    }
}

//! HTTP transport for controller web panels, using reqwest.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use log::{debug, trace};
use url::Url;

use super::config::{HttpConfig, TlsMode};
use crate::error::{Result, TransportError};

/// Build the URL of a panel page.
pub fn page_url(address: &str, route: &str, https: bool) -> Result<Url> {
    let scheme = if https { "https" } else { "http" };
    Url::parse(&format!("{scheme}://{address}/"))
        .and_then(|base| base.join(route))
        .map_err(|e| {
            TransportError::ConnectionFailed {
                host: address.to_string(),
                message: format!("invalid URL: {e}"),
            }
            .into()
        })
}

/// Shared HTTP client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Build a client from configuration.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("trafficctl/", env!("CARGO_PKG_VERSION")));

        match &config.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path).map_err(TransportError::Io)?;
                let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|e| {
                    TransportError::Protocol(format!("invalid CA certificate: {e}"))
                })?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Protocol(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch a page and return its body.
    pub async fn get(&self, url: &Url, timeout: Duration) -> Result<String> {
        debug!("HTTP GET {url}");
        let request = self.client.get(url.clone()).timeout(timeout);
        self.execute(url, request, timeout).await
    }

    /// Post a form and return the response body.
    pub async fn post(
        &self,
        url: &Url,
        form: &[(String, String)],
        timeout: Duration,
    ) -> Result<String> {
        debug!("HTTP POST {url} ({} fields)", form.len());
        let request = self.client.post(url.clone()).form(form).timeout(timeout);
        self.execute(url, request, timeout).await
    }

    async fn execute(
        &self,
        url: &Url,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<String> {
        let host = url.host_str().unwrap_or_default();
        let response = request
            .send()
            .await
            .map_err(|e| classify(host, &e, timeout))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(TransportError::ConnectionFailed {
                host: host.to_string(),
                message: format!("HTTP {status}"),
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify(host, &e, timeout))?;
        trace!("HTTP {url} body: {} bytes", body.len());
        Ok(body)
    }
}

fn classify(host: &str, err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(timeout);
    }
    if err.is_connect() && is_tls_failure(err) {
        return TransportError::BadControllerType {
            host: host.to_string(),
            message: err.to_string(),
        };
    }
    TransportError::ConnectionFailed {
        host: host.to_string(),
        message: err.to_string(),
    }
}

/// Whether a rustls error is anywhere in the source chain.
fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<rustls::Error>() {
            return true;
        }
        // io::Error::source() skips the error it wraps
        current = match e.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
            Some(inner) => Some(inner as &(dyn StdError + 'static)),
            None => e.source(),
        };
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> HttpClient {
        HttpClient::new(&HttpConfig::default()).unwrap()
    }

    fn url(server: &MockServer, route: &str) -> Url {
        Url::parse(&server.uri()).unwrap().join(route).unwrap()
    }

    #[test]
    fn test_page_url() {
        let url = page_url("10.1.2.3:8080", "hvi?file=m001a.hvi&pos1=0&pos2=-1", false).unwrap();
        assert_eq!(url.as_str(), "http://10.1.2.3:8080/hvi?file=m001a.hvi&pos1=0&pos2=-1");
        assert_eq!(url.query_pairs().count(), 3);
    }

    #[tokio::test]
    async fn test_get_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hvi"))
            .and(query_param("file", "m001a.hvi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(":SUBTITLE;X;\n"))
            .mount(&server)
            .await;

        let body = client()
            .get(&url(&server, "hvi?file=m001a.hvi"), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(body, ":SUBTITLE;X;\n");
    }

    #[tokio::test]
    async fn test_post_sends_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hvi"))
            .and(body_string_contains("par_name=XIN.R20%2F3"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let form = vec![
            ("par_name".to_string(), "XIN.R20/3".to_string()),
            ("par_value".to_string(), "1".to_string()),
        ];
        client()
            .post(&url(&server, "hvi?file=data.hvi"), &form, Duration::from_secs(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_200_is_connection_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client()
            .get(&url(&server, "hvi"), Duration::from_secs(2))
            .await
            .unwrap_err();
        match err {
            crate::Error::Transport(TransportError::ConnectionFailed { message, .. }) => {
                assert!(message.contains("503"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_tls_failure_found_behind_io_errors() {
        let handshake = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::InvalidMessage(rustls::InvalidMessage::InvalidContentType),
        );
        let wrapped = io::Error::other(handshake);
        assert!(is_tls_failure(&wrapped));

        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert!(!is_tls_failure(&io::Error::other(refused)));
    }

    #[tokio::test]
    async fn test_plain_http_on_https_is_bad_controller_type() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut hello = [0u8; 2048];
                let _ = stream.read(&mut hello).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\n\r\n")
                    .await;
                let _ = stream.read(&mut hello).await;
            }
        });

        let url = Url::parse(&format!("https://127.0.0.1:{port}/hvi")).unwrap();
        let err = client().get(&url, Duration::from_secs(2)).await.unwrap_err();
        assert!(
            matches!(
                err,
                crate::Error::Transport(TransportError::BadControllerType { .. })
            ),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_refused_is_connection_failure() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let url = Url::parse(&format!("https://127.0.0.1:{port}/hvi")).unwrap();
        let err = client().get(&url, Duration::from_secs(2)).await.unwrap_err();
        assert!(
            matches!(
                err,
                crate::Error::Transport(TransportError::ConnectionFailed { .. })
            ),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_slow_panel_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let err = client()
            .get(&url(&server, "hvi"), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Transport(TransportError::Timeout(_))
        ));
    }
}

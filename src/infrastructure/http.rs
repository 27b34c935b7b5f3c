use crate::config::TerminalConfig;
use crate::domain::payment::{ApiErrorBody, Authorization, PaymentRequest, QrIntent, QrSimulation};
use crate::domain::ports::PaymentGateway;
use crate::domain::transaction::Transaction;
use crate::error::{PosError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// JSON-over-HTTP adapter for the payment API.
#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

impl HttpGateway {
    /// Builds a gateway for `config.api_url` with the configured request timeout.
    pub fn new(config: &TerminalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(config.api_url.clone(), client))
    }

    /// Create a gateway with a custom reqwest client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &PaymentRequest) -> Result<T> {
        let url = self.url(path);
        debug!(%url, idempotency_key = %body.idempotency_key, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        read_json(response).await
    }
}

/// Decodes a 2xx body as `T`; anything else becomes `PosError::Api` carrying
/// the server's `message` when the body has one.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
    warn!(status = status.as_u16(), message = ?body.message, "payment API rejected request");
    Err(PosError::Api {
        status: status.as_u16(),
        message: body.message,
    })
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn authorize(&self, request: &PaymentRequest) -> Result<Authorization> {
        self.post_json("/payments/", request).await
    }

    async fn create_qr_payment(&self, request: &PaymentRequest) -> Result<QrIntent> {
        self.post_json("/payments/createQrPayment", request).await
    }

    async fn simulate_qr_payment(&self, transaction_id: &str) -> Result<QrSimulation> {
        let url = self.url(&format!("/payments/QrPayment/simulate/{transaction_id}"));
        debug!(%url, "POST");
        let response = self.client.post(&url).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        match serde_json::from_slice::<QrSimulation>(&bytes) {
            Ok(simulation) => Ok(simulation),
            Err(err) if status.is_success() => Err(PosError::Json(err)),
            Err(_) => Err(PosError::Api {
                status: status.as_u16(),
                message: None,
            }),
        }
    }

    async fn transactions(&self, machine_id: &str) -> Result<Vec<Transaction>> {
        let url = self.url(&format!("/transections/{machine_id}"));
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_creation() {
        let gateway = HttpGateway::new(&TerminalConfig::default()).unwrap();
        assert_eq!(gateway.base_url(), crate::config::DEFAULT_API_URL);
    }

    #[test]
    fn test_url_normalization() {
        let gateway = HttpGateway::with_client("http://localhost:5000/api/", Client::new());
        assert_eq!(gateway.base_url(), "http://localhost:5000/api");
        assert_eq!(gateway.url("/payments/"), "http://localhost:5000/api/payments/");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is closed on any sane test host.
        let gateway = HttpGateway::with_client("http://127.0.0.1:9/api", Client::new());
        let err = gateway.transactions("m-1").await.unwrap_err();
        assert!(err.is_transport(), "{err:?}");
    }
}

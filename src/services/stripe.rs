use async_trait::async_trait;

use crate::error::AppError;

/// The only thing the refund workflow needs from the payment provider.
/// Charge creation happens on the client side; orders arrive with a
/// transaction id already attached.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn reverse_charge(&self, transaction_id: &str) -> Result<(), AppError>;
}

pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn reverse_charge(&self, transaction_id: &str) -> Result<(), AppError> {
        let resp = self
            .http
            .post("https://api.stripe.com/v1/refunds")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[("charge", transaction_id)])
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Stripe request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "Stripe refund rejected ({}): {}",
                status, body
            )));
        }

        Ok(())
    }
}

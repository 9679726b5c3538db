//! Payment settlement stub.

use crate::error::{Result, SafraError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the user is asked to pay for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub session_token: Option<String>,
    pub energy_kwh: f64,
    pub amount: f64,
    pub currency_symbol: String,
    pub duration_secs: u64,
}

/// Acknowledgement from the processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    /// Processor-side reference, distinct from the kiosk transaction id
    pub reference: String,
    pub settled_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn settle(&self, summary: &PaymentSummary) -> Result<PaymentConfirmation>;
}

/// Accepts (or declines) every payment after a fixed delay
#[derive(Debug, Clone, Copy)]
pub struct SimulatedPaymentProcessor {
    delay: Duration,
    decline: bool,
}

impl SimulatedPaymentProcessor {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            decline: false,
        }
    }

    #[must_use]
    pub const fn declining(mut self) -> Self {
        self.decline = true;
        self
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedPaymentProcessor {
    async fn settle(&self, summary: &PaymentSummary) -> Result<PaymentConfirmation> {
        tokio::time::sleep(self.delay).await;
        if self.decline {
            return Err(SafraError::payment(format!(
                "payment of {}{:.2} was declined",
                summary.currency_symbol, summary.amount
            )));
        }
        Ok(PaymentConfirmation {
            reference: uuid::Uuid::new_v4().to_string(),
            settled_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> PaymentSummary {
        PaymentSummary {
            session_token: None,
            energy_kwh: 50.0,
            amount: 600.0,
            currency_symbol: "₹".to_string(),
            duration_secs: 50,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn settles_after_delay() {
        let processor = SimulatedPaymentProcessor::new(Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        let confirmation = processor.settle(&summary()).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert!(!confirmation.reference.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn declining_processor_fails() {
        let processor = SimulatedPaymentProcessor::new(Duration::ZERO).declining();
        let err = processor.settle(&summary()).await.unwrap_err();
        assert!(err.to_string().contains("₹600.00"));
    }
}

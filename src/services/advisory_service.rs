// src/services/advisory_service.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing;

use crate::errors::{AcikError, AcikResult};
use crate::models::child::Child;
use crate::models::driver::Driver;
use crate::models::trip::{Trip, TripStatus};

pub const FALLBACK_QUICK_REPLIES: [&str; 3] = ["Okay", "On my way", "Call driver"];
pub const FALLBACK_RECOMMENDATION: &str = "Continuous monitoring enabled.";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SafetyAssessment {
    pub is_safe: bool,
    pub alert_message: Option<String>,
    pub recommendation: String,
}

impl SafetyAssessment {
    pub fn fallback() -> Self {
        Self {
            is_safe: true,
            alert_message: None,
            recommendation: FALLBACK_RECOMMENDATION.to_string(),
        }
    }
}

/// The external language-model collaborator. Best effort only: everything
/// behind this trait can disappear and the core keeps working on fallbacks.
#[async_trait]
pub trait AdvisoryOperations: Send + Sync {
    /// Exactly three one-tap replies for the guardian chat.
    async fn suggest_quick_replies(&self, trip: &Trip, child_name: &str)
        -> AcikResult<Vec<String>>;
    async fn analyze_trip_safety(
        &self,
        trip: &Trip,
        child: &Child,
        driver: &Driver,
    ) -> AcikResult<SafetyAssessment>;
    /// Short reassuring status line for the guardian.
    async fn compose_status_update(&self, status: TripStatus, eta: &str) -> AcikResult<String>;
}

/// Remote advisory endpoint speaking JSON over HTTP.
pub struct HttpAdvisoryService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAdvisoryService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AdvisoryOperations for HttpAdvisoryService {
    async fn suggest_quick_replies(
        &self,
        trip: &Trip,
        child_name: &str,
    ) -> AcikResult<Vec<String>> {
        let response = self
            .client
            .post(format!("{}/quick-replies", self.base_url))
            .json(&json!({
                "trip_status": trip.status.to_string(),
                "child_name": child_name,
                "coordination_signal": trip.coordination_signal,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AcikError::AdvisoryUnavailable(format!(
                "quick-replies returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn analyze_trip_safety(
        &self,
        trip: &Trip,
        child: &Child,
        driver: &Driver,
    ) -> AcikResult<SafetyAssessment> {
        let response = self
            .client
            .post(format!("{}/analyze-safety", self.base_url))
            .json(&json!({
                "trip_status": trip.status.to_string(),
                "child_name": child.name,
                "child_age": child.age,
                "driver_name": driver.name,
                "vehicle": driver.vehicle,
                "current_lat": trip.current_lat,
                "current_lng": trip.current_lng,
                "route_deviation": trip.route_deviation,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AcikError::AdvisoryUnavailable(format!(
                "analyze-safety returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn compose_status_update(&self, status: TripStatus, eta: &str) -> AcikResult<String> {
        let response = self
            .client
            .post(format!("{}/status-update", self.base_url))
            .json(&json!({ "status": status.to_string(), "eta": eta }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AcikError::AdvisoryUnavailable(format!(
                "status-update returned {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

/// Canned advisory for local runs and tests.
pub struct MockAdvisoryService;

#[async_trait]
impl AdvisoryOperations for MockAdvisoryService {
    async fn suggest_quick_replies(
        &self,
        _trip: &Trip,
        child_name: &str,
    ) -> AcikResult<Vec<String>> {
        Ok(vec![
            "Okay".to_string(),
            format!("Is {} buckled in?", child_name),
            "Call driver".to_string(),
        ])
    }

    async fn analyze_trip_safety(
        &self,
        trip: &Trip,
        _child: &Child,
        _driver: &Driver,
    ) -> AcikResult<SafetyAssessment> {
        Ok(SafetyAssessment {
            is_safe: !trip.route_deviation,
            alert_message: trip
                .route_deviation
                .then(|| "Route deviation under review.".to_string()),
            recommendation: FALLBACK_RECOMMENDATION.to_string(),
        })
    }

    async fn compose_status_update(&self, status: TripStatus, eta: &str) -> AcikResult<String> {
        Ok(format!("All good — ride is {}, arriving around {}.", status, eta))
    }
}

/// Timeout-and-fallback wrapper around whichever advisory backs the
/// deployment. These methods cannot fail: a slow, broken or absent advisory
/// degrades to canned copy and nothing else.
pub struct Advisory {
    inner: Arc<dyn AdvisoryOperations>,
    timeout: Duration,
}

impl Advisory {
    pub fn new(inner: Arc<dyn AdvisoryOperations>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub async fn quick_replies(&self, trip: &Trip, child_name: &str) -> Vec<String> {
        match tokio::time::timeout(self.timeout, self.inner.suggest_quick_replies(trip, child_name))
            .await
        {
            Ok(Ok(replies)) if replies.len() == 3 => replies,
            Ok(Ok(replies)) => {
                tracing::warn!("Advisory returned {} quick replies, using fallback", replies.len());
                Self::fallback_replies()
            }
            Ok(Err(err)) => {
                tracing::warn!("Advisory quick replies failed: {}", err);
                Self::fallback_replies()
            }
            Err(_) => {
                tracing::warn!("Advisory quick replies timed out");
                Self::fallback_replies()
            }
        }
    }

    pub async fn safety(&self, trip: &Trip, child: &Child, driver: &Driver) -> SafetyAssessment {
        match tokio::time::timeout(self.timeout, self.inner.analyze_trip_safety(trip, child, driver))
            .await
        {
            Ok(Ok(assessment)) => assessment,
            Ok(Err(err)) => {
                tracing::warn!("Advisory safety analysis failed: {}", err);
                SafetyAssessment::fallback()
            }
            Err(_) => {
                tracing::warn!("Advisory safety analysis timed out");
                SafetyAssessment::fallback()
            }
        }
    }

    pub async fn status_update(&self, status: TripStatus, eta: &str) -> String {
        match tokio::time::timeout(self.timeout, self.inner.compose_status_update(status, eta)).await
        {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            _ => format!(
                "Update: your child's ride is currently {}. Estimated arrival: {}.",
                status, eta
            ),
        }
    }

    fn fallback_replies() -> Vec<String> {
        FALLBACK_QUICK_REPLIES.iter().map(|s| s.to_string()).collect()
    }
}

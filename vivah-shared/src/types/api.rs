use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }
}

/// Failure envelope: `{ "success": false, "error": { "code", "message" } }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

// --- Health ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// One probed dependency.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthCheck {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheck>,
}

impl HealthResponse {
    pub fn healthy(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            service: service.into(),
            version: version.into(),
            checks: Vec::new(),
        }
    }

    /// Overall status is the worst individual check.
    pub fn with_checks(mut self, checks: Vec<HealthCheck>) -> Self {
        self.status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);
        self.checks = checks;
        self
    }

    /// Load balancers only look at the status line.
    pub fn http_status(&self) -> StatusCode {
        match self.status {
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_check_wins() {
        let resp = HealthResponse::healthy("svc", "0.1.0").with_checks(vec![
            HealthCheck::healthy("postgres"),
            HealthCheck::unhealthy("rabbitmq", "channel closed"),
        ]);
        assert_eq!(resp.status, HealthStatus::Unhealthy);
        assert_eq!(resp.http_status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn no_checks_is_healthy() {
        let resp = HealthResponse::healthy("svc", "0.1.0").with_checks(Vec::new());
        assert_eq!(resp.status, HealthStatus::Healthy);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("checks").is_none());
    }

    #[test]
    fn error_envelope_shape() {
        let json = serde_json::to_value(ApiErrorResponse::new("E3001", "bad action")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "E3001");
        assert!(json["error"].get("details").is_none());
    }
}

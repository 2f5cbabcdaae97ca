use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the health endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service shared by the REST server and the command-line tool
///
/// This service provides a standardised way to check that the clinic service is up.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Clinic records service is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_serialises_ok_flag() {
        let body = serde_json::to_value(HealthService::check_health()).expect("serialise");
        assert_eq!(body["ok"], serde_json::Value::Bool(true));
    }
}

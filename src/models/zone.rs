use serde::{Deserialize, Serialize};

/// An availability zone as listed by `/v1/zones`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    /// Zone identifier
    pub zone_id: String,
    /// Human-readable zone name
    pub zone_name: String,
    /// Provisioning status (e.g. `available`)
    pub status: String,
    /// Free-form description lines shown in the dashboard
    #[serde(default)]
    pub content: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_deserialization() {
        let json = r#"{
            "zone_id": "kr-central-1",
            "zone_name": "KR Central",
            "status": "available",
            "content": ["NVMe storage", "10G network"]
        }"#;

        let zone: Zone = serde_json::from_str(json).expect("Deserialization should succeed");
        assert_eq!(zone.zone_id, "kr-central-1");
        assert_eq!(zone.status, "available");
        assert_eq!(zone.content.len(), 2);
    }

    #[test]
    fn test_zone_content_defaults_to_empty() {
        let json = r#"{"zone_id": "kr-2", "zone_name": "KR 2", "status": "preparing"}"#;
        let zone: Zone = serde_json::from_str(json).expect("Deserialization should succeed");
        assert!(zone.content.is_empty());
    }
}

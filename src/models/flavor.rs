use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hardware profile of a flavor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlavorSpec {
    /// Profile class (e.g. `standard`, `compute`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Virtual CPU count
    pub vcpu: u32,
    /// Memory in MB
    pub memory: u64,
    /// Root disk in GB
    pub disk: u64,
    /// Network bandwidth in Mbps
    pub network: u64,
    /// GPU model, if the flavor carries one
    pub gpu: Option<String>,
}

/// KRW amounts for one billing arrangement.
///
/// Monetary values are `Decimal` to keep arithmetic exact; on the wire they
/// stay plain JSON numbers, matching what the provider sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAmount {
    /// Base price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Value-added tax
    #[serde(with = "rust_decimal::serde::float")]
    pub vat: Decimal,
    /// Price including VAT
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// One pricing option (`full` or `partial` commitment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    /// Billing period type (e.g. `month`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Amounts in Korean won
    #[serde(rename = "KRW")]
    pub krw: PriceAmount,
}

/// Pricing options attached to a flavor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlavorPrice {
    pub full: Price,
    pub partial: Price,
}

/// A compute flavor as listed by `/v1/flavors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flavor {
    /// Flavor identifier
    pub flavor_id: String,
    /// Flavor name shown in the dashboard
    pub name: String,
    /// Availability of the flavor for new instances
    pub provide: String,
    /// Lifecycle status
    pub status: String,
    /// Hardware profile
    pub spec: FlavorSpec,
    /// Image identifiers this flavor can boot
    #[serde(default)]
    pub supporting_images: Vec<String>,
    /// Zones offering this flavor
    #[serde(default)]
    pub zone: Vec<String>,
    /// Pricing options
    pub price: FlavorPrice,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn sample_flavor_json() -> &'static str {
        r#"{
            "flavor_id": "f-std-2",
            "name": "Standard-2",
            "provide": "available",
            "status": "active",
            "spec": {
                "type": "standard",
                "vcpu": 2,
                "memory": 4096,
                "disk": 50,
                "network": 1000,
                "gpu": null
            },
            "supporting_images": ["img-ubuntu-22"],
            "zone": ["kr-central-1"],
            "price": {
                "full": {"type": "month", "KRW": {"price": 30000, "vat": 3000, "total": 33000}},
                "partial": {"type": "hour", "KRW": {"price": 42, "vat": 4.2, "total": 46.2}}
            }
        }"#
    }

    #[test]
    fn test_flavor_deserialization() {
        let flavor: Flavor =
            serde_json::from_str(sample_flavor_json()).expect("Deserialization should succeed");

        assert_eq!(flavor.flavor_id, "f-std-2");
        assert_eq!(flavor.spec.vcpu, 2);
        assert_eq!(flavor.spec.gpu, None);
        assert_eq!(
            flavor.price.full.krw.total,
            Decimal::from_u64(33_000).unwrap()
        );
    }

    #[test]
    fn test_price_handles_fractional_krw() {
        let flavor: Flavor =
            serde_json::from_str(sample_flavor_json()).expect("Deserialization should succeed");

        // Hourly billing produces fractional won; Decimal keeps it exact.
        assert_eq!(
            flavor.price.partial.krw.vat,
            Decimal::from_f64(4.2).unwrap()
        );
    }

    #[test]
    fn test_price_serializes_as_numbers() {
        let flavor: Flavor =
            serde_json::from_str(sample_flavor_json()).expect("Deserialization should succeed");
        let json = serde_json::to_string(&flavor).expect("Serialization should succeed");

        assert!(json.contains("\"KRW\""));
        assert!(json.contains("\"price\":30000"));
        assert!(!json.contains("\"price\":\"30000\""));
    }
}

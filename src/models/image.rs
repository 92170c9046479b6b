use serde::{Deserialize, Serialize};

/// Operating system metadata attached to an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOs {
    /// OS family (e.g. `linux`, `windows`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Distribution name
    pub name: String,
    /// Support status of this OS release
    pub status: String,
    /// Description lines shown in the dashboard
    #[serde(default)]
    pub content: Vec<String>,
    /// Distribution identifier (e.g. `ubuntu`)
    pub os_type: String,
    /// Release version
    pub version: String,
    /// Provider-internal OS identifier
    pub oid: String,
}

/// A bootable image as listed by `/v1/images`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// Image name shown in the dashboard
    pub name: String,
    /// Image identifier
    pub image_id: String,
    /// `public` or `private`
    pub visibility: String,
    /// Operating system metadata
    pub os: ImageOs,
    /// Image category (e.g. `base`, `snapshot`)
    pub image_type: String,
    /// Zones where this image is available
    #[serde(default)]
    pub zone: Vec<String>,
    /// Search tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Lifecycle status
    pub status: String,
    /// Whether deletion is blocked
    pub protected: bool,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Minimum root disk in GB
    pub min_disk: u64,
    /// Minimum memory in MB
    pub min_ram: u64,
    /// Image file size in bytes
    pub file_size: u64,
    /// Creation timestamp, provider-formatted
    pub created_at: String,
    /// Last update timestamp, provider-formatted
    pub updated_at: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_deserialization() {
        let json = r#"{
            "name": "Ubuntu 22.04 LTS",
            "image_id": "img-ubuntu-22",
            "visibility": "public",
            "os": {
                "type": "linux",
                "name": "Ubuntu",
                "status": "supported",
                "content": ["LTS release"],
                "os_type": "ubuntu",
                "version": "22.04",
                "oid": "os-114"
            },
            "image_type": "base",
            "zone": ["kr-central-1", "kr-central-2"],
            "tags": ["lts", "ubuntu"],
            "status": "active",
            "protected": true,
            "description": "Official Ubuntu cloud image",
            "min_disk": 20,
            "min_ram": 1024,
            "file_size": 648019968,
            "created_at": "2024-03-01 09:00:00",
            "updated_at": "2024-06-11 14:30:00"
        }"#;

        let image: Image = serde_json::from_str(json).expect("Deserialization should succeed");
        assert_eq!(image.image_id, "img-ubuntu-22");
        assert_eq!(image.os.version, "22.04");
        assert!(image.protected);
        assert_eq!(image.zone.len(), 2);
    }
}

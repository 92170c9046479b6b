use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::{CreateInstanceRequest, InstanceAction};

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length for instance names.
///
/// This matches the provider's limit for display names.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum length for resource identifiers in paths.
///
/// Identifiers are interpolated into the signed request path, so anything
/// longer than this almost certainly indicates a malformed request.
pub const MAX_RESOURCE_ID_LENGTH: usize = 128;

/// Minimum page number for paginated listings (the provider is 1-indexed).
pub const MIN_PAGE: u64 = 1;

/// Validate an instance name.
///
/// Rules:
/// - Must be between 1 and 255 characters
/// - Must start and end with an alphanumeric character
/// - Can contain alphanumeric characters, dots, underscores, and hyphens
/// - Cannot contain consecutive dots, underscores, or hyphens
pub fn validate_instance_name(name: &str) -> AppResult<()> {
    // Check length
    if name.is_empty() {
        return Err(AppError::BadRequest(
            "Instance name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Instance name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }

    // Check for valid characters and patterns
    let chars: Vec<char> = name.chars().collect();

    if !chars.first().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::BadRequest(
            "Instance name must start with an alphanumeric character".to_string(),
        ));
    }

    if !chars.last().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::BadRequest(
            "Instance name must end with an alphanumeric character".to_string(),
        ));
    }

    // Check each character and patterns
    let mut prev_special = false;
    for (i, &c) in chars.iter().enumerate() {
        let is_special = c == '.' || c == '_' || c == '-';

        if !c.is_ascii_alphanumeric() && !is_special {
            return Err(AppError::BadRequest(format!(
                "Instance name contains invalid character '{c}' at position {i}. \
                 Only alphanumeric characters, dots, underscores, and hyphens are allowed"
            )));
        }

        // Check for consecutive special characters
        if is_special && prev_special {
            return Err(AppError::BadRequest(format!(
                "Instance name cannot contain consecutive special characters at position {i}"
            )));
        }

        prev_special = is_special;
    }

    Ok(())
}

/// Validate a resource identifier that will be interpolated into an upstream
/// request path.
///
/// The signature covers the exact path string, so an identifier containing
/// path metacharacters would both break the route and produce a signature
/// the provider rejects. Identifiers must be printable ASCII without
/// separators.
pub fn validate_resource_id(id: &str, resource_type: &str) -> AppResult<()> {
    if id.is_empty() {
        return Err(AppError::BadRequest(format!(
            "{resource_type} ID cannot be empty"
        )));
    }

    if id.len() > MAX_RESOURCE_ID_LENGTH {
        return Err(AppError::BadRequest(format!(
            "{resource_type} ID cannot exceed {MAX_RESOURCE_ID_LENGTH} characters"
        )));
    }

    for (i, c) in id.chars().enumerate() {
        let is_separator = c == '/' || c == '?' || c == '#' || c == '%' || c == '\\';
        if !c.is_ascii_graphic() || is_separator {
            return Err(AppError::BadRequest(format!(
                "{resource_type} ID contains invalid character at position {i}"
            )));
        }
    }

    Ok(())
}

/// Validate a page number for paginated listings.
pub fn validate_page(page: u64) -> AppResult<()> {
    if page < MIN_PAGE {
        return Err(AppError::BadRequest(
            "Page number must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Validate a create-instance payload beyond what deserialization enforces.
///
/// Required identifiers must be non-empty; deserialization guarantees
/// presence but not content.
pub fn validate_create_instance(request: &CreateInstanceRequest) -> AppResult<()> {
    validate_instance_name(&request.name)?;
    require_non_empty(&request.flavor_id, "flavorId")?;
    require_non_empty(&request.image_id, "imageId")?;
    require_non_empty(&request.network_id, "networkId")?;
    require_non_empty(&request.zone, "zone")?;
    Ok(())
}

/// Parse an inbound action payload into an [`InstanceAction`].
///
/// The dashboard posts `{"action": "...", ...}`; the extra field each action
/// needs (`type` for reboot, `imageId` for rebuild, `flavorId` for resize)
/// is required and must be a non-empty string. Anything else is rejected
/// before a dispatcher is ever built.
pub fn parse_instance_action(payload: &Value) -> AppResult<InstanceAction> {
    match payload.get("action").and_then(Value::as_str) {
        Some("start") => Ok(InstanceAction::Start),
        Some("shutdown") => Ok(InstanceAction::Shutdown),
        Some("reboot") => {
            let kind = require_string_field(payload, "type", "Reboot")?;
            Ok(InstanceAction::Reboot { kind })
        }
        Some("rebuild") => {
            let image_id = require_string_field(payload, "imageId", "Rebuild")?;
            Ok(InstanceAction::Rebuild { image_id })
        }
        Some("resize") => {
            let flavor_id = require_string_field(payload, "flavorId", "Resize")?;
            Ok(InstanceAction::Resize { flavor_id })
        }
        _ => Err(AppError::BadRequest("Invalid action".to_string())),
    }
}

/// Require a non-empty string value for a field of an action payload.
fn require_string_field(payload: &Value, field: &str, action: &str) -> AppResult<String> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            AppError::BadRequest(format!("{action} requires a non-empty '{field}' field"))
        })
}

/// Require a non-empty string for a named request field.
fn require_non_empty(value: &str, field: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("'{field}' cannot be empty")));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_valid_instance_names() {
        assert!(validate_instance_name("web-01").is_ok());
        assert!(validate_instance_name("db_primary").is_ok());
        assert!(validate_instance_name("app.v2").is_ok());
        assert!(validate_instance_name("a").is_ok());
        assert!(validate_instance_name("web-01_v2.0").is_ok());
    }

    #[test]
    fn test_empty_instance_name() {
        let result = validate_instance_name("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_instance_name_too_long() {
        let long_name = "a".repeat(256);
        let result = validate_instance_name(&long_name);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot exceed"));
    }

    #[test]
    fn test_instance_name_invalid_start_character() {
        let result = validate_instance_name("-web");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("must start with an alphanumeric")
        );
    }

    #[test]
    fn test_instance_name_invalid_end_character() {
        let result = validate_instance_name("web-");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("must end with an alphanumeric")
        );
    }

    #[test]
    fn test_instance_name_invalid_characters() {
        let result = validate_instance_name("web@01");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("invalid character")
        );
    }

    #[test]
    fn test_instance_name_consecutive_special_characters() {
        let result = validate_instance_name("web--01");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("consecutive special")
        );
    }

    #[test]
    fn test_valid_resource_ids() {
        assert!(validate_resource_id("i-0a1b2c", "Instance").is_ok());
        assert!(validate_resource_id("f.std.2", "Flavor").is_ok());
        assert!(validate_resource_id("550e8400-e29b-41d4-a716-446655440000", "Image").is_ok());
    }

    #[test]
    fn test_resource_id_rejects_separators() {
        for bad in ["a/b", "a?b", "a#b", "a%2fb", "a\\b"] {
            let result = validate_resource_id(bad, "Instance");
            assert!(result.is_err(), "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn test_resource_id_rejects_whitespace_and_control() {
        assert!(validate_resource_id("a b", "Instance").is_err());
        assert!(validate_resource_id("a\nb", "Instance").is_err());
    }

    #[test]
    fn test_resource_id_rejects_empty_and_overlong() {
        assert!(validate_resource_id("", "Instance").is_err());
        assert!(validate_resource_id(&"a".repeat(129), "Instance").is_err());
    }

    #[test]
    fn test_valid_pages() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(100).is_ok());
    }

    #[test]
    fn test_invalid_page_zero() {
        let result = validate_page(0);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("at least 1"));
    }

    #[test]
    fn test_parse_action_start_and_shutdown() {
        assert_eq!(
            parse_instance_action(&json!({"action": "start"})).unwrap(),
            InstanceAction::Start
        );
        assert_eq!(
            parse_instance_action(&json!({"action": "shutdown"})).unwrap(),
            InstanceAction::Shutdown
        );
    }

    #[test]
    fn test_parse_action_reboot_with_type() {
        let action = parse_instance_action(&json!({"action": "reboot", "type": "SOFT"})).unwrap();
        assert_eq!(
            action,
            InstanceAction::Reboot {
                kind: "SOFT".to_string()
            }
        );
    }

    #[test]
    fn test_parse_action_reboot_missing_type() {
        let result = parse_instance_action(&json!({"action": "reboot"}));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("'type'"));
    }

    #[test]
    fn test_parse_action_rebuild_with_image() {
        let action =
            parse_instance_action(&json!({"action": "rebuild", "imageId": "img-9"})).unwrap();
        assert_eq!(
            action,
            InstanceAction::Rebuild {
                image_id: "img-9".to_string()
            }
        );
    }

    #[test]
    fn test_parse_action_resize_with_flavor() {
        let action =
            parse_instance_action(&json!({"action": "resize", "flavorId": "f-big"})).unwrap();
        assert_eq!(
            action,
            InstanceAction::Resize {
                flavor_id: "f-big".to_string()
            }
        );
    }

    #[test]
    fn test_parse_action_resize_empty_flavor() {
        let result = parse_instance_action(&json!({"action": "resize", "flavorId": ""}));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("'flavorId'"));
    }

    #[test]
    fn test_parse_action_unknown() {
        let result = parse_instance_action(&json!({"action": "destroy"}));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid action"));
    }

    #[test]
    fn test_parse_action_missing_field() {
        let result = parse_instance_action(&json!({"type": "SOFT"}));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid action"));
    }

    #[test]
    fn test_validate_create_instance() {
        let valid = CreateInstanceRequest {
            name: "web-01".to_string(),
            description: None,
            flavor_id: "f-std-2".to_string(),
            image_id: "img-ubuntu-22".to_string(),
            network_id: "net-1".to_string(),
            zone: "kr-central-1".to_string(),
            user_script_id: None,
        };
        assert!(validate_create_instance(&valid).is_ok());

        let empty_flavor = CreateInstanceRequest {
            flavor_id: String::new(),
            ..valid
        };
        let result = validate_create_instance(&empty_flavor);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("'flavorId'"));
    }
}

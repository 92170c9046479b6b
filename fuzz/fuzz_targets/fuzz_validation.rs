//! Fuzz testing for validation functions.
//!
//! This fuzz target tests the robustness of the validation module against
//! arbitrary input. It ensures that validation functions:
//!
//! - Never panic on any input
//! - Always return a valid Result (Ok or Err)
//! - Handle edge cases like empty strings, long strings, and special characters
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! # Install cargo-fuzz (requires nightly)
//! cargo +nightly install cargo-fuzz
//!
//! # Run the validation fuzz target
//! cargo +nightly fuzz run fuzz_validation
//!
//! # Run with a time limit (e.g., 60 seconds)
//! cargo +nightly fuzz run fuzz_validation -- -max_total_time=60
//!
//! # View coverage
//! cargo +nightly fuzz coverage fuzz_validation
//! ```
//!
//! # What This Tests
//!
//! - `validate_instance_name`: instance display-name validation
//! - `validate_resource_id`: identifiers interpolated into signed paths
//! - `validate_page`: pagination parameter validation
//! - `parse_instance_action`: inbound action payload parsing

#![no_main]

use libfuzzer_sys::fuzz_target;
use iwinv_console::validation::{
    parse_instance_action,
    validate_instance_name,
    validate_page,
    validate_resource_id,
};

fuzz_target!(|data: &[u8]| {
    // Try to interpret the bytes as a UTF-8 string for string validation
    if let Ok(s) = std::str::from_utf8(data) {
        // Test name and identifier validation (shouldn't panic)
        let _ = validate_instance_name(s);
        let _ = validate_resource_id(s, "Instance");
        let _ = validate_resource_id(s, "Flavor");

        // Arbitrary JSON payloads must never panic the action parser
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(s) {
            let _ = parse_instance_action(&value);
        }
    }

    // Test page validation with bytes interpreted as u64
    // This tests boundary conditions and all possible u64 values
    if data.len() >= 8 {
        let value = u64::from_le_bytes([
            data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
        ]);
        let _ = validate_page(value);
    }
});

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (severity level, chunk size)
//! - Reject empty identifiers that would produce unusable records
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ReporterConfig → Result<(), Vec<ValidationError>>
//! - A zero port is left to the transport, which reports it as a delivery failure

use crate::config::schema::ReporterConfig;
use crate::error::ValidationError;

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ReporterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("hostname", &config.hostname),
        ("local_app_name", &config.local_app_name),
        ("facility", &config.facility),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::Empty { field });
        }
    }

    if config.level > 7 {
        errors.push(ValidationError::LevelOutOfRange(config.level));
    }

    if config.max_chunk_size.bytes() == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkSize;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ReporterConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let config = ReporterConfig {
            hostname: String::new(),
            facility: "  ".to_string(),
            level: 9,
            max_chunk_size: ChunkSize::Bytes(0),
            ..ReporterConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::Empty { field: "hostname" },
                ValidationError::Empty { field: "facility" },
                ValidationError::LevelOutOfRange(9),
                ValidationError::ZeroChunkSize,
            ]
        );
    }

    #[test]
    fn test_port_zero_passes_validation() {
        let config = ReporterConfig { port: 0, ..ReporterConfig::default() };
        assert!(validate_config(&config).is_ok());
    }
}

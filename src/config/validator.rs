use crate::config::Config;
use crate::error::{FlowmapError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every violation
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_data(config, &mut errors);
        Self::validate_row_filter(config, &mut errors);
        Self::validate_process_map(config, &mut errors);
        Self::validate_durations(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FlowmapError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_data(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.data.dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "data.dir",
                "Data directory cannot be empty",
            ));
        }

        if config.data.timestamp_format.trim().is_empty() {
            errors.push(ValidationError::new(
                "data.timestamp_format",
                "Timestamp format cannot be empty",
            ));
        }

        if let Err(e) = config.delimiter_byte() {
            errors.push(ValidationError::new("data.delimiter", e.to_string()));
        }
    }

    fn validate_row_filter(config: &Config, errors: &mut Vec<ValidationError>) {
        if let Some(filter) = &config.row_filter {
            if filter.column.trim().is_empty() {
                errors.push(ValidationError::new(
                    "row_filter.column",
                    "Row filter column cannot be empty",
                ));
            }
        }
    }

    fn validate_process_map(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.process_map.min_edge_occurrences == 0 {
            errors.push(ValidationError::new(
                "process_map.min_edge_occurrences",
                "Minimum edge occurrences must be at least 1",
            ));
        }
    }

    fn validate_durations(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.durations.bin_count == 0 {
            errors.push(ValidationError::new(
                "durations.bin_count",
                "Bin count must be greater than 0",
            ));
        }

        let [start, end] = config.durations.work_hours;
        if start > 24 || end > 24 || start >= end {
            errors.push(ValidationError::new(
                "durations.work_hours",
                format!(
                    "Work hours must satisfy 0 <= start < end <= 24, got [{}, {}]",
                    start, end
                ),
            ));
        }
    }
}

use super::{types::Config, ConfigError};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return invalid("server.port cannot be 0");
    }

    let processor = &config.processor;
    if processor.max_concurrent == 0 {
        return invalid("processor.max_concurrent cannot be 0");
    }
    if processor.queue_capacity == 0 {
        return invalid("processor.queue_capacity cannot be 0");
    }
    if processor.download_timeout_secs == 0 {
        return invalid("processor.download_timeout_secs cannot be 0");
    }
    if processor.requeue_stuck_after_secs.is_some() && processor.requeue_scan_interval_secs == 0 {
        return invalid("processor.requeue_scan_interval_secs cannot be 0 when requeue is enabled");
    }

    if config.validation.allowed_extensions.is_empty() {
        return invalid("validation.allowed_extensions cannot be empty");
    }

    Ok(())
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message.to_string()))
}

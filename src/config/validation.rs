//! Configuration validation functions.

use super::Config;

/// Validate configuration and surface any startup-fatal problems.
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    config.websocket.validate()?;
    Ok(())
}

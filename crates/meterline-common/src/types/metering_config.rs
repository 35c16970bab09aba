//! Metering provider settings for a reporting run

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Dry-run flag and product code sent with every submission
///
/// Built once when the metering service is constructed and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteringServiceConfig {
    dry_run: bool,
    product_code: String,
}

impl MeteringServiceConfig {
    pub fn new(dry_run: bool, product_code: impl Into<String>) -> Result<Self, ValidationError> {
        let product_code = product_code.into();
        if product_code.trim().is_empty() {
            return Err(ValidationError::EmptyProductCode);
        }
        Ok(Self {
            dry_run,
            product_code,
        })
    }

    /// Provider validates but does not bill when set
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_requires_product_code() {
        assert_eq!(
            MeteringServiceConfig::new(true, "  "),
            Err(ValidationError::EmptyProductCode)
        );

        let config = MeteringServiceConfig::new(false, "prod-8x2k").unwrap();
        assert!(!config.dry_run());
        assert_eq!(config.product_code(), "prod-8x2k");
    }
}

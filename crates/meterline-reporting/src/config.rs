//! Meterline reporting configuration

use std::collections::HashMap;
use std::time::Duration;

use meterline_common::{
    MeterlineError, MeteringServiceConfig, Result, SetupError, ACTIVE_USER_HOURS,
};
use serde::{Deserialize, Serialize};

use crate::infra::bootstrap::{ProviderEnvironment, DEFAULT_REGION_VAR};

/// Prefix of environment variables read by [`ReportingConfig::load`]
pub const ENV_PREFIX: &str = "METERLINE";

/// Process-level settings for a reporting run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Provider validates but does not bill
    pub dry_run: bool,
    /// Product code registered with the metering provider
    pub product_code: String,
    /// Dimensions to report, in submission order
    pub dimensions: Vec<String>,
    /// Upper bound on each metering call
    pub call_timeout_ms: Option<u64>,
    /// Environment variable naming the provider region
    pub region_var: String,
}

impl ReportingConfig {
    /// Load configuration from `.env` and `METERLINE_*` environment variables
    ///
    /// `METERLINE_DIMENSIONS` is a comma separated list.
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();
        Self::from_environment(Self::environment())
    }

    /// Same as [`load`](Self::load) but reading variables from `vars`
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_environment(Self::environment().source(Some(vars)))
    }

    fn environment() -> ::config::Environment {
        ::config::Environment::with_prefix(ENV_PREFIX)
            .list_separator(",")
            .with_list_parse_key("dimensions")
    }

    fn from_environment(env: ::config::Environment) -> Result<Self> {
        let settings = ::config::Config::builder()
            .set_default("dry_run", true)
            .and_then(|b| b.set_default("dimensions", vec![ACTIVE_USER_HOURS.to_string()]))
            .and_then(|b| b.set_default("region_var", DEFAULT_REGION_VAR))
            .map_err(config_error)?
            .add_source(env)
            .build()
            .map_err(config_error)?;

        let cfg: ReportingConfig = settings.try_deserialize().map_err(config_error)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.dimensions.iter().all(|d| d.trim().is_empty()) {
            return Err(MeterlineError::Config("no dimensions configured".into()));
        }
        if self.call_timeout_ms == Some(0) {
            return Err(MeterlineError::Config(
                "call_timeout_ms must be positive".into(),
            ));
        }
        self.metering()?;
        Ok(())
    }

    /// Metering settings handed to the service at construction
    pub fn metering(&self) -> Result<MeteringServiceConfig> {
        Ok(MeteringServiceConfig::new(self.dry_run, self.product_code.clone())?)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Resolve the provider region from the configured variable
    pub fn provider_environment(&self) -> std::result::Result<ProviderEnvironment, SetupError> {
        ProviderEnvironment::from_env(&self.region_var)
    }
}

fn config_error(err: ::config::ConfigError) -> MeterlineError {
    MeterlineError::Config(err.to_string())
}

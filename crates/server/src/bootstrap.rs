//! Wires configuration into the runtime collaborators.

use std::sync::Arc;

use greencart_core::catalog::StaticCatalog;
use greencart_core::config::{AppConfig, ConfigError, LoadOptions};
use greencart_core::credit::MockCreditBureau;
use greencart_core::personalize::PersonalizationEngine;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::AppState;
use crate::store::ExchangeStore;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    Ok(bootstrap_with_config(config))
}

pub fn bootstrap_with_config(config: AppConfig) -> Application {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    // A configured key signals intent to reach a real credit-records
    // service, which this build does not ship. Say so rather than fail.
    if config.credit.api_key.is_some() {
        warn!(
            event_name = "system.bootstrap.credit_mock",
            api_base = %config.credit.api_base,
            "credit api key configured but live lookups are not wired; using the deterministic mock"
        );
    }

    let state = AppState {
        store: Arc::new(ExchangeStore::new(config.store.log_capacity)),
        catalog: Arc::new(StaticCatalog::new()),
        credit: Arc::new(MockCreditBureau::new()),
        engine: PersonalizationEngine::new(),
    };

    info!(
        event_name = "system.bootstrap.ready",
        send_log_capacity = config.store.log_capacity,
        "runtime collaborators initialized"
    );

    Application { config, state }
}

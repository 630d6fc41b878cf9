//! Service wiring: repositories plus the session/credential collaborators.
//!
//! `USE_PERSISTENT_STORES=true` selects Postgres; otherwise everything lives
//! in memory for the lifetime of the process.

use std::sync::Arc;

use lostfound_auth::{BcryptHasher, Hs256SessionTokens};
use lostfound_infra::workflow::accounts::AccountServices;
use lostfound_infra::{AppConfig, InMemoryStore, PostgresStore, Repositories, RepositoryError};

/// Everything a handler needs, constructed once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub repos: Repositories,
    pub accounts: AccountServices,
}

impl AppServices {
    pub fn in_memory(config: &AppConfig) -> Self {
        Self {
            repos: Repositories::from_store(InMemoryStore::arc()),
            accounts: account_services(config),
        }
    }

    pub async fn postgres(config: &AppConfig, database_url: &str) -> Result<Self, RepositoryError> {
        let store = PostgresStore::connect(database_url, config.database_max_connections).await?;
        Ok(Self {
            repos: Repositories::from_store(Arc::new(store)),
            accounts: account_services(config),
        })
    }
}

fn account_services(config: &AppConfig) -> AccountServices {
    AccountServices::new(
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        Arc::new(Hs256SessionTokens::new(config.session_secret.as_bytes(), config.session_ttl)),
    )
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, RepositoryError> {
    match (config.use_persistent_stores, config.database_url.as_deref()) {
        (true, Some(url)) => {
            tracing::info!("using Postgres stores");
            AppServices::postgres(config, url).await
        }
        (true, None) => Err(RepositoryError::Storage(
            "DATABASE_URL must be set when USE_PERSISTENT_STORES=true".to_string(),
        )),
        (false, _) => {
            tracing::info!("using in-memory stores");
            Ok(AppServices::in_memory(config))
        }
    }
}

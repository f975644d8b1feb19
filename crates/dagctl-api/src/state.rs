//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both the CLI and the
//! REST API. Services are generic over the registry and repository traits;
//! AppState pins them to the infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use dagctl_core::auth::ConfiguredVerifier;
use dagctl_core::service::lookup::LookupChain;
use dagctl_core::service::trigger::TriggerService;
use dagctl_core::service::xcom::XComService;
use dagctl_infra::dagbag::FileDagRegistry;
use dagctl_infra::filesystem::{dags_folder, ensure_data_dir};
use dagctl_infra::sqlite::pool::{DatabasePool, database_url};
use dagctl_infra::sqlite::run::SqliteRunRepository;
use dagctl_infra::sqlite::user::SqliteUserStore;
use dagctl_infra::sqlite::xcom::SqliteXComRepository;
use dagctl_types::config::DagctlConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteTriggerService = TriggerService<FileDagRegistry, SqliteRunRepository>;

pub type ConcreteLookupChain = LookupChain<FileDagRegistry, SqliteRunRepository>;

pub type ConcreteXComService = XComService<FileDagRegistry, SqliteXComRepository>;

pub type ConcreteVerifier = ConfiguredVerifier<SqliteUserStore>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub trigger_service: Arc<ConcreteTriggerService>,
    pub lookup: Arc<ConcreteLookupChain>,
    pub xcom_service: Arc<ConcreteXComService>,
    pub verifier: Arc<ConcreteVerifier>,
    pub registry: FileDagRegistry,
    pub users: SqliteUserStore,
    pub config: Arc<DagctlConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: open the database, load the DAG
    /// folder, wire services.
    pub async fn init(data_dir: PathBuf, config: DagctlConfig) -> anyhow::Result<Self> {
        ensure_data_dir(&data_dir).await?;

        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let registry = FileDagRegistry::load(&dags_folder(&data_dir, &config.dags.folder))?;

        Ok(Self::from_parts(config, db_pool, registry, data_dir))
    }

    /// Wire services over an already opened pool and registry.
    pub fn from_parts(
        config: DagctlConfig,
        db_pool: DatabasePool,
        registry: FileDagRegistry,
        data_dir: PathBuf,
    ) -> Self {
        let runs = SqliteRunRepository::new(db_pool.clone());
        let xcoms = SqliteXComRepository::new(db_pool.clone());
        let users = SqliteUserStore::new(db_pool);

        let trigger_service = TriggerService::new(registry.clone(), runs.clone());
        let lookup = LookupChain::new(registry.clone(), runs);
        let xcom_service = XComService::new(registry.clone(), xcoms);
        let verifier = ConfiguredVerifier::from_kind(config.auth.backend, users.clone());

        Self {
            trigger_service: Arc::new(trigger_service),
            lookup: Arc::new(lookup),
            xcom_service: Arc::new(xcom_service),
            verifier: Arc::new(verifier),
            registry,
            users,
            config: Arc::new(config),
            data_dir,
        }
    }
}

//! Lifecycle orchestration for publishing to EventMesh.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::cloudevents::{EventMeshBuilder, EventResolver};
use crate::cluster::{
    wait_for_cache_sync, ApplicationLister, CacheSyncError, ClusterAccessError, ClusterConnector,
};
use crate::config::{load_backend_config, BackendConfig, ConfigError, EnvSource, Options};
use crate::eventtype::{Cleaner, EventMeshCleaner};
use crate::handler::Handler;
use crate::health::Checker;
use crate::legacy::LegacyTransformer;
use crate::lifecycle::LifecycleContext;
use crate::oauth::{AuthClient, AuthError, IdleConnectionGuard};
use crate::observability::Collector;
use crate::receiver::{HttpMessageReceiver, ServeError};
use crate::sender::EventMeshSender;
use crate::subscribed::Processor;

pub const BACKEND: &str = "beb";
pub const COMMANDER_NAME: &str = "beb-commander";

/// Where a commander is in its lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommanderState {
    Uninitialized = 0,
    Initialized = 1,
    Running = 2,
    Stopped = 3,
}

impl CommanderState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CommanderState::Uninitialized,
            1 => CommanderState::Initialized,
            2 => CommanderState::Running,
            _ => CommanderState::Stopped,
        }
    }
}

/// Why a started commander could not keep running.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("failed to create auth client: {0}")]
    Auth(#[from] AuthError),

    #[error("failed to access cluster: {0}")]
    ClusterAccess(#[from] ClusterAccessError),

    #[error("failed to sync informer caches: {0}")]
    CacheSync(#[from] CacheSyncError),

    #[error("failed to start handler: {0}")]
    Serve(#[from] ServeError),
}

#[derive(Debug, Error)]
pub enum CommanderError {
    #[error("failed to read configuration for {commander}: {source}")]
    Config {
        commander: &'static str,
        #[source]
        source: ConfigError,
    },

    #[error("failed to start {commander}: {source}")]
    Start {
        commander: &'static str,
        #[source]
        source: StartError,
    },

    #[error("{commander} cannot {operation} while {state:?}")]
    InvalidState {
        commander: &'static str,
        operation: &'static str,
        state: CommanderState,
    },
}

impl CommanderError {
    fn invalid_state(operation: &'static str, state: CommanderState) -> Self {
        CommanderError::InvalidState {
            commander: COMMANDER_NAME,
            operation,
            state,
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    cancel: OnceLock<LifecycleContext>,
}

impl Shared {
    fn state(&self) -> CommanderState {
        CommanderState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn stop(&self) {
        let previous = CommanderState::from_u8(
            self.state
                .swap(CommanderState::Stopped as u8, Ordering::AcqRel),
        );
        if previous == CommanderState::Stopped {
            return;
        }
        if let Some(ctx) = self.cancel.get() {
            ctx.cancel();
        }
        tracing::info!(commander = COMMANDER_NAME, backend = BACKEND, ?previous, "Stop requested");
    }
}

/// Stops a commander from any task.
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    /// Cancel the running commander. Safe to call before start and more
    /// than once.
    pub fn stop(&self) {
        self.shared.stop();
    }
}

/// Wires configuration, cluster caches, the type resolution pipeline and
/// the HTTP handler together, then serves until stopped.
pub struct Commander {
    options: Options,
    collector: Collector,
    connector: Arc<dyn ClusterConnector>,
    config: Option<Arc<BackendConfig>>,
    shared: Arc<Shared>,
}

impl Commander {
    pub fn new(options: Options, collector: Collector, connector: Arc<dyn ClusterConnector>) -> Self {
        Self {
            options,
            collector,
            connector,
            config: None,
            shared: Arc::new(Shared {
                state: AtomicU8::new(CommanderState::Uninitialized as u8),
                cancel: OnceLock::new(),
            }),
        }
    }

    pub fn state(&self) -> CommanderState {
        self.shared.state()
    }

    /// The loaded configuration, once `init` succeeded.
    pub fn config(&self) -> Option<&BackendConfig> {
        self.config.as_deref()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: self.shared.clone(),
        }
    }

    /// Load the backend configuration from `source`.
    ///
    /// On failure nothing is stored and the commander stays uninitialized.
    pub fn init(&mut self, source: &EnvSource) -> Result<(), CommanderError> {
        let state = self.state();
        if state != CommanderState::Uninitialized {
            return Err(CommanderError::invalid_state("init", state));
        }

        let config = load_backend_config(source).map_err(|source| CommanderError::Config {
            commander: COMMANDER_NAME,
            source,
        })?;

        self.config = Some(Arc::new(config));
        self.shared
            .state
            .store(CommanderState::Initialized as u8, Ordering::Release);
        Ok(())
    }

    /// Build every component and serve until `shutdown` is cancelled or
    /// [`Commander::stop`] is called.
    ///
    /// Returns immediately with `Ok(())` if the commander is already
    /// running.
    pub async fn start(&self, shutdown: LifecycleContext) -> Result<(), CommanderError> {
        if let Err(current) = self.shared.state.compare_exchange(
            CommanderState::Initialized as u8,
            CommanderState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return match CommanderState::from_u8(current) {
                CommanderState::Running => {
                    tracing::warn!(commander = COMMANDER_NAME, backend = BACKEND, "Already running");
                    Ok(())
                }
                state => Err(CommanderError::invalid_state("start", state)),
            };
        }

        let Some(config) = self.config.clone() else {
            return Err(CommanderError::invalid_state("start", CommanderState::Uninitialized));
        };

        let ctx = shutdown.child();
        // Cannot already be set: only one caller wins the transition to Running.
        let _ = self.shared.cancel.set(ctx.clone());
        if self.state() == CommanderState::Stopped {
            ctx.cancel();
        }

        let result = self.run(config, ctx.clone()).await;

        // Tear down informers and anything else still bound to the context.
        ctx.cancel();
        self.shared
            .state
            .store(CommanderState::Stopped as u8, Ordering::Release);

        result.map_err(|source| CommanderError::Start {
            commander: COMMANDER_NAME,
            source,
        })
    }

    /// Cancel the running commander.
    pub fn stop(&self) -> Result<(), CommanderError> {
        self.shared.stop();
        Ok(())
    }

    async fn run(&self, config: Arc<BackendConfig>, ctx: LifecycleContext) -> Result<(), StartError> {
        tracing::info!(
            commander = COMMANDER_NAME,
            backend = BACKEND,
            configuration = ?config,
            options = ?self.options,
            "Starting Event Publisher"
        );

        let receiver = HttpMessageReceiver::new(config.port);

        let client = Arc::new(AuthClient::new(&config, ctx.clone())?);
        let _idle_connections = IdleConnectionGuard::new(client.clone());

        let sender = Arc::new(EventMeshSender::new(config.publish_url.clone(), client));

        let cluster = self.connector.connect().await?;

        let subscriptions = cluster.subscription_informer()?;
        let application_informer = if config.application_crd_enabled {
            tracing::info!(commander = COMMANDER_NAME, backend = BACKEND, "Application CR lister is enabled");
            Some(cluster.application_informer()?)
        } else {
            tracing::info!(commander = COMMANDER_NAME, backend = BACKEND, "Application CR lister is disabled");
            None
        };

        // Nothing downstream may read a cache before its initial sync.
        tracing::info!(commander = COMMANDER_NAME, backend = BACKEND, "Waiting for informers caches to sync");
        let timeout = config.informer_sync_timeout;
        let (synced_applications, synced_subscriptions) = tokio::try_join!(
            async {
                match &application_informer {
                    Some(informer) => wait_for_cache_sync(informer.as_ref(), timeout, &ctx).await.map(Some),
                    None => Ok(None),
                }
            },
            wait_for_cache_sync(subscriptions.as_ref(), timeout, &ctx),
        )?;

        let applications = match synced_applications {
            Some(lister) => ApplicationLister::synced(lister),
            None => ApplicationLister::Absent,
        };
        let processor = Processor::new(synced_subscriptions, config.event_type_prefix.clone());
        tracing::info!(
            commander = COMMANDER_NAME,
            backend = BACKEND,
            application_lister = applications.is_present(),
            published_event_types = processor.published_event_types().len(),
            "Informers were successfully synced"
        );

        let legacy = LegacyTransformer::new(
            config.namespace.clone(),
            config.event_type_prefix.clone(),
            applications.clone(),
        );

        let cleaner = Cleaner::new(config.event_type_prefix.clone(), applications.clone());
        let builder = EventMeshBuilder::new(
            config.event_type_prefix.clone(),
            config.namespace.clone(),
            Arc::new(EventMeshCleaner::new()),
            applications,
        );
        let resolver = EventResolver::new(
            config.event_type_prefix.clone(),
            config.namespace.clone(),
            Arc::new(cleaner),
            builder,
        );

        Handler {
            receiver,
            sender,
            health: Arc::new(Checker::new()),
            request_timeout: config.request_timeout,
            legacy: Arc::new(legacy),
            options: self.options.clone(),
            subscribed: Arc::new(processor),
            resolver: Arc::new(resolver),
            collector: self.collector,
        }
        .start(ctx)
        .await?;

        tracing::info!(commander = COMMANDER_NAME, backend = BACKEND, "Event Publisher was shut down");
        Ok(())
    }
}

impl std::fmt::Debug for Commander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commander")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::memory::MemoryConnector;

    #[test]
    fn test_state_roundtrip() {
        for state in [
            CommanderState::Uninitialized,
            CommanderState::Initialized,
            CommanderState::Running,
            CommanderState::Stopped,
        ] {
            assert_eq!(CommanderState::from_u8(state as u8), state);
        }
    }

    #[tokio::test]
    async fn test_start_requires_init() {
        let commander = Commander::new(
            Options::default(),
            Collector::new(),
            Arc::new(MemoryConnector::unreachable("unused")),
        );
        let err = commander.start(LifecycleContext::new()).await.unwrap_err();
        assert!(matches!(
            err,
            CommanderError::InvalidState {
                state: CommanderState::Uninitialized,
                ..
            }
        ));
    }

    #[test]
    fn test_errors_name_commander() {
        let err = CommanderError::Start {
            commander: COMMANDER_NAME,
            source: StartError::CacheSync(CacheSyncError::Cancelled),
        };
        assert!(err.to_string().contains("beb-commander"));
    }
}

//! Composition root.
//!
//! Builds the single route table, resolver, registry and telemetry store for
//! the process, then runs the bootstrap pipeline:
//!
//! ```text
//! Register:       discovery, admin, embedder modules (insertion order)
//! AfterRegister:  legacy shadow routes
//! collect:        untracked routes bound directly on the table
//! ```

use std::sync::Arc;

use crate::admin::{AdminController, BearerAuthorizer};
use crate::compat::{CompatOptions, LegacyDispatcher, MappingExtension, NamespaceDeprecationHook};
use crate::config::RegistryConfig;
use crate::discovery::DiscoveryController;
use crate::error::RegistryError;
use crate::namespace::NamespaceResolver;
use crate::registry::{ApiInfo, Bootstrap, BootstrapReport, Controller, Phase, RouteRegistry};
use crate::routing::RouteTable;
use crate::telemetry::{DeprecationTelemetry, JsonFileStore, KvStore, MemoryStore};

/// A fully bootstrapped application.
pub struct App {
    config: RegistryConfig,
    table: Arc<RouteTable>,
    resolver: Arc<NamespaceResolver>,
    registry: Arc<RouteRegistry>,
    telemetry: Arc<DeprecationTelemetry>,
    dispatcher: Option<Arc<LegacyDispatcher>>,
    report: BootstrapReport,
}

impl App {
    pub fn builder(config: RegistryConfig) -> AppBuilder {
        AppBuilder {
            config,
            bootstrap: Bootstrap::new(),
            extensions: Vec::new(),
            store: None,
            info: None,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn resolver(&self) -> &Arc<NamespaceResolver> {
        &self.resolver
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    pub fn telemetry(&self) -> &Arc<DeprecationTelemetry> {
        &self.telemetry
    }

    /// `None` when compatibility routing is disabled.
    pub fn dispatcher(&self) -> Option<&Arc<LegacyDispatcher>> {
        self.dispatcher.as_ref()
    }

    pub fn bootstrap_report(&self) -> &BootstrapReport {
        &self.report
    }
}

/// Collects embedder modules and overrides before bootstrap.
pub struct AppBuilder {
    config: RegistryConfig,
    bootstrap: Bootstrap,
    extensions: Vec<Arc<dyn MappingExtension>>,
    store: Option<Arc<dyn KvStore>>,
    info: Option<ApiInfo>,
}

impl AppBuilder {
    /// A module publishing routes in the register phase.
    pub fn module<F>(self, name: impl Into<String>, step: F) -> Self
    where
        F: FnOnce(&RouteRegistry) -> Result<(), RegistryError> + Send + 'static,
    {
        self.step(Phase::Register, name, step)
    }

    /// A callback in any phase.
    pub fn step<F>(mut self, phase: Phase, name: impl Into<String>, step: F) -> Self
    where
        F: FnOnce(&RouteRegistry) -> Result<(), RegistryError> + Send + 'static,
    {
        self.bootstrap = self.bootstrap.on(phase, name, step);
        self
    }

    /// A named controller registered in the register phase.
    pub fn controller(self, name: &str, controller: Arc<dyn Controller>) -> Self {
        let name = name.to_string();
        self.module(name.clone(), move |registry| {
            registry.register_controller(&name, controller)
        })
    }

    pub fn mapping_extension(mut self, extension: Arc<dyn MappingExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Replace the durable store selected by `telemetry.store_path`.
    pub fn store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn info(mut self, info: ApiInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn build(self) -> App {
        let config = self.config;

        let table = Arc::new(RouteTable::new());
        let resolver = Arc::new(NamespaceResolver::from_config(
            &config.namespace,
            &config.compat,
        ));
        let registry = Arc::new(
            RouteRegistry::new(Arc::clone(&table)).with_info(self.info.unwrap_or_default()),
        );

        let store = self.store.unwrap_or_else(|| match &config.telemetry.store_path {
            Some(path) => Arc::new(JsonFileStore::new(path)) as Arc<dyn KvStore>,
            None => Arc::new(MemoryStore::new()),
        });
        let telemetry = Arc::new(DeprecationTelemetry::new(store, (&config.telemetry).into()));

        let dispatcher = config.compat.enabled.then(|| {
            let dispatcher = self.extensions.into_iter().fold(
                LegacyDispatcher::new(
                    Arc::clone(&resolver),
                    Arc::clone(&telemetry),
                    CompatOptions::from(&config.compat),
                ),
                LegacyDispatcher::with_extension,
            );
            table.add_hook(Arc::new(NamespaceDeprecationHook::new(Arc::clone(&resolver))));
            Arc::new(dispatcher)
        });

        let canonical = resolver.canonical().to_string();
        let discovery = DiscoveryController::new(&registry, &canonical)
            .with_legacy_namespaces(resolver.legacy_namespaces().map(str::to_string));
        let admin = AdminController::new(
            &canonical,
            Arc::clone(&telemetry),
            dispatcher.clone(),
            BearerAuthorizer::new(config.admin.api_key.clone()).into_permission(),
        );

        let mut builtin = Bootstrap::new()
            .register("discovery", move |registry| {
                registry.register_controller("discovery", Arc::new(discovery))
            })
            .register("admin", move |registry| {
                registry.register_controller("admin", Arc::new(admin))
            });
        if let Some(dispatcher) = dispatcher.clone() {
            builtin = builtin.after_register("legacy-compat", move |registry| {
                dispatcher.register_shadow_routes(registry).map(|_| ())
            });
        }

        let report = builtin.then(self.bootstrap).run(&registry);
        for (step, err) in &report.failures {
            tracing::warn!(step = %step, error = %err, "Bootstrap step reported an error");
        }

        App {
            config,
            table,
            resolver,
            registry,
            telemetry,
            dispatcher,
            report,
        }
    }
}

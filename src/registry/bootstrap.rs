//! Ordered bootstrap pipeline.
//!
//! Registration callbacks run in three phases: before-register, register
//! (where modules publish their routes) and after-register (where the compat
//! layer adds shadow routes once every canonical route exists). Within a phase
//! callbacks run in insertion order. A final collect pass reconciles the
//! catalog with the route table.

use crate::error::RegistryError;
use crate::registry::catalog::RouteRegistry;

/// Bootstrap phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    BeforeRegister,
    Register,
    AfterRegister,
}

type Step = Box<dyn FnOnce(&RouteRegistry) -> Result<(), RegistryError> + Send>;

/// Outcome of a bootstrap run.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    /// `(phase, step name)` in the order they ran.
    pub executed: Vec<(Phase, String)>,
    /// Steps that returned an error. Bootstrap continues past them.
    pub failures: Vec<(String, RegistryError)>,
    /// Entries added by the collect pass.
    pub untracked: usize,
}

/// Collects registration callbacks and runs them in phase order.
#[derive(Default)]
pub struct Bootstrap {
    steps: Vec<(Phase, String, Step)>,
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, phase: Phase, name: impl Into<String>, step: F) -> Self
    where
        F: FnOnce(&RouteRegistry) -> Result<(), RegistryError> + Send + 'static,
    {
        self.steps.push((phase, name.into(), Box::new(step)));
        self
    }

    pub fn before_register<F>(self, name: impl Into<String>, step: F) -> Self
    where
        F: FnOnce(&RouteRegistry) -> Result<(), RegistryError> + Send + 'static,
    {
        self.on(Phase::BeforeRegister, name, step)
    }

    pub fn register<F>(self, name: impl Into<String>, step: F) -> Self
    where
        F: FnOnce(&RouteRegistry) -> Result<(), RegistryError> + Send + 'static,
    {
        self.on(Phase::Register, name, step)
    }

    pub fn after_register<F>(self, name: impl Into<String>, step: F) -> Self
    where
        F: FnOnce(&RouteRegistry) -> Result<(), RegistryError> + Send + 'static,
    {
        self.on(Phase::AfterRegister, name, step)
    }

    /// Append another pipeline's steps after this one's.
    pub fn then(mut self, other: Bootstrap) -> Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step, then the collect pass.
    pub fn run(mut self, registry: &RouteRegistry) -> BootstrapReport {
        // Stable sort keeps insertion order within a phase.
        self.steps.sort_by_key(|(phase, _, _)| *phase);

        let mut report = BootstrapReport::default();
        for (phase, name, step) in self.steps {
            tracing::debug!(phase = ?phase, step = %name, "Running bootstrap step");
            if let Err(err) = step(registry) {
                tracing::warn!(phase = ?phase, step = %name, error = %err, "Bootstrap step failed");
                report.failures.push((name.clone(), err));
            }
            report.executed.push((phase, name));
        }

        report.untracked = registry.collect_untracked();
        tracing::info!(
            routes = registry.route_count(),
            conflicts = registry.get_conflicts().len(),
            untracked = report.untracked,
            "Route registration complete"
        );
        report
    }
}

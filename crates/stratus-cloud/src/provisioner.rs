//! Provisioner: the orchestrators' shared plumbing
//!
//! Every resource module issues its mutating call and then hands over to
//! [`Provisioner::converge`], which builds the probe, runs the wait engine
//! and maps the result onto the recorded state.

use crate::api::ControlPlane;
use crate::error::{CloudError, Result};
use crate::lock::KeyedLock;
use crate::model::RemoteObject;
use crate::operation::{Operation, ResourceKind};
use crate::outcome::settle;
use crate::policy::NotFoundPolicy;
use crate::state::ResourceState;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use stratus_wait::{CancellationToken, WaitSpec};
use tokio::time::Instant;

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Per-operation time budgets for one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            create: timeout,
            update: timeout,
            delete: timeout,
        }
    }

    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
            Operation::Read => self.create.min(self.delete),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::uniform(DEFAULT_OPERATION_TIMEOUT)
    }
}

/// Polling and timeout settings shared by all orchestrators
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    /// Base delay between probes
    pub poll_interval: Duration,

    /// Floor for the delay between probes
    pub min_poll_interval: Duration,

    /// Ceiling for the delay between probes
    pub max_poll_interval: Duration,

    /// Backoff multiplier
    pub multiplier: f64,

    /// How long "not found" right after a create counts as lag
    pub grace_window: Duration,

    /// Budgets used when a kind has no override
    pub default_timeouts: Timeouts,

    /// Per-kind overrides
    pub timeouts: HashMap<ResourceKind, Timeouts>,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            min_poll_interval: Duration::from_secs(3),
            max_poll_interval: Duration::from_secs(10),
            multiplier: 2.0,
            grace_window: Duration::from_secs(30),
            default_timeouts: Timeouts::default(),
            timeouts: HashMap::new(),
        }
    }
}

impl ProvisionSettings {
    pub fn timeouts_for(&self, kind: ResourceKind) -> Timeouts {
        self.timeouts
            .get(&kind)
            .copied()
            .unwrap_or(self.default_timeouts)
    }

    pub fn with_timeouts(mut self, kind: ResourceKind, timeouts: Timeouts) -> Self {
        self.timeouts.insert(kind, timeouts);
        self
    }
}

/// Orchestrates mutate-then-wait sequences against a control plane
pub struct Provisioner<C> {
    client: Arc<C>,
    locks: KeyedLock,
    settings: ProvisionSettings,
    cancel: CancellationToken,
}

impl<C: ControlPlane> Provisioner<C> {
    pub fn new(client: Arc<C>, locks: KeyedLock, settings: ProvisionSettings) -> Self {
        Self {
            client,
            locks,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally controlled cancellation signal for every wait
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn locks(&self) -> &KeyedLock {
        &self.locks
    }

    pub fn settings(&self) -> &ProvisionSettings {
        &self.settings
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Wait configuration for one operation on one object
    pub(crate) fn wait_spec(
        &self,
        kind: ResourceKind,
        operation: Operation,
        id: &str,
        pending: &[&str],
        target: &[&str],
    ) -> WaitSpec {
        let settings = &self.settings;
        WaitSpec::new(pending.iter().copied(), target.iter().copied())
            .subject(format!("{} {}", kind.display_name(), id))
            .timeout(settings.timeouts_for(kind).for_operation(operation))
            .poll_interval(settings.poll_interval)
            .min_poll_interval(settings.min_poll_interval)
            .backoff(settings.multiplier, settings.max_poll_interval)
    }

    /// Grace policy for create paths
    pub(crate) fn create_policy(&self) -> NotFoundPolicy {
        NotFoundPolicy::Grace(self.settings.grace_window)
    }

    /// Wait for the object to settle and record the outcome.
    ///
    /// `issued_at` is when the mutating call was sent; the grace window is
    /// measured from it.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn converge<T, F, Fut>(
        &self,
        operation: Operation,
        kind: ResourceKind,
        id: &str,
        record: &mut ResourceState,
        spec: WaitSpec,
        policy: NotFoundPolicy,
        issued_at: Instant,
        mut fetch: F,
    ) -> Result<Option<T>>
    where
        T: RemoteObject,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let spec = policy.prepare(spec);
        tracing::debug!(
            "Waiting for {} {} to {} (timeout {:?})",
            kind.display_name(),
            id,
            operation,
            spec.timeout
        );

        let result = stratus_wait::wait(&spec, &self.cancel, || {
            let request = fetch();
            async move { policy.observe(issued_at, request.await) }
        })
        .await;

        settle(operation, kind, id, record, result)
    }

    /// Refresh a record with a single read
    pub(crate) async fn refresh<T, Fut>(
        &self,
        kind: ResourceKind,
        record: &mut ResourceState,
        read: Fut,
    ) -> Result<T>
    where
        T: RemoteObject,
        Fut: Future<Output = Result<T>>,
    {
        let id = record.require_id()?;
        match read.await {
            Ok(object) => {
                tracing::debug!("Retrieved {} {}", kind.display_name(), id);
                record.observe(&object)?;
                Ok(object)
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    "{} {} not found, removing it from state",
                    kind.display_name(),
                    id
                );
                record.clear();
                Err(CloudError::Gone {
                    operation: Operation::Read,
                    kind,
                    id,
                })
            }
            Err(err) => Err(err),
        }
    }
}

//! Service catalog
//!
//! Endpoints are configured up front, keyed by OpenStack service type.

use crate::error::{OpenStackError, Result};
use std::collections::BTreeMap;

/// OpenStack services the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Service {
    Network,
    BlockStorage,
    Compute,
    LoadBalancer,
    ContainerInfra,
}

impl Service {
    pub const ALL: [Service; 5] = [
        Service::Network,
        Service::BlockStorage,
        Service::Compute,
        Service::LoadBalancer,
        Service::ContainerInfra,
    ];

    /// Service type as it appears in the catalog
    pub fn service_type(&self) -> &'static str {
        match self {
            Service::Network => "network",
            Service::BlockStorage => "volumev3",
            Service::Compute => "compute",
            Service::LoadBalancer => "load-balancer",
            Service::ContainerInfra => "container-infra",
        }
    }

    fn from_service_type(name: &str) -> Option<Self> {
        Service::ALL
            .into_iter()
            .find(|service| service.service_type() == name)
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.service_type())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    urls: BTreeMap<Service, String>,
}

impl Endpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a `service type -> base URL` map. Unknown service types are
    /// ignored with a warning.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut endpoints = Self::new();
        for (name, url) in map {
            match Service::from_service_type(name) {
                Some(service) => endpoints = endpoints.with(service, url)?,
                None => tracing::warn!("Ignoring endpoint for unknown service type '{}'", name),
            }
        }
        Ok(endpoints)
    }

    pub fn with(mut self, service: Service, url: &str) -> Result<Self> {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(OpenStackError::InvalidEndpoint {
                service: service.to_string(),
                url: url.to_string(),
            });
        }
        self.urls.insert(service, url.to_string());
        Ok(self)
    }

    pub fn get(&self, service: Service) -> Option<&str> {
        self.urls.get(&service).map(String::as_str)
    }

    /// Absolute URL for `path` on `service`
    pub fn url(&self, service: Service, path: &str) -> Result<String> {
        let base = self
            .get(service)
            .ok_or_else(|| OpenStackError::MissingEndpoint(service.to_string()))?;
        Ok(format!("{}/{}", base, path.trim_start_matches('/')))
    }
}

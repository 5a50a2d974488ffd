use anyhow::{Context, bail};
use serde_json::{Map, Value};
use std::collections::HashMap;
use stratus_cloud::{ProvisionSettings, ResourceKind, Timeouts};
use stratus_config::{Settings, TimeoutSettings};
use stratus_openstack::{Endpoints, OpenStackClient};

/// Turn `--set key=value` pairs into a JSON object.
///
/// `name` is filled in from the positional argument unless given explicitly.
pub fn parse_params(name: &str, pairs: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut params = Map::new();
    params.insert("name".to_string(), Value::String(name.to_string()));

    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("invalid parameter '{}': expected KEY=VALUE", pair);
        };
        let key = key.trim();
        if key.is_empty() || key.split('.').any(str::is_empty) {
            bail!("invalid parameter '{}': empty key", pair);
        }
        insert_path(&mut params, key, parse_value(raw))
            .with_context(|| format!("invalid parameter '{}'", pair))?;
    }

    Ok(params)
}

fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_))) => {
            value
        }
        _ => Value::String(raw.to_string()),
    }
}

fn insert_path(params: &mut Map<String, Value>, key: &str, value: Value) -> anyhow::Result<()> {
    let mut segments = key.split('.').peekable();
    let mut current = params;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return Ok(());
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(map) => map,
            _ => bail!("'{}' is already set to a plain value", segment),
        };
    }

    Ok(())
}

/// Pull a required string parameter out of `params`
pub fn take_string(params: &mut Map<String, Value>, key: &str) -> anyhow::Result<String> {
    match params.remove(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value),
        Some(other) => bail!("parameter '{}' must be a string, got {}", key, other),
        None => bail!("missing parameter: --set {}=<value>", key),
    }
}

/// Polling and timeout settings for the provisioner
pub fn provision_settings(settings: &Settings) -> ProvisionSettings {
    let wait = &settings.wait;
    let mut provision = ProvisionSettings {
        poll_interval: wait.poll_interval(),
        min_poll_interval: wait.min_poll_interval(),
        max_poll_interval: wait.max_poll_interval(),
        multiplier: wait.multiplier,
        grace_window: wait.grace_window(),
        default_timeouts: timeouts(settings.timeouts_for("default")),
        timeouts: HashMap::new(),
    };

    for kind in ResourceKind::ALL {
        if settings.timeouts.contains_key(kind.as_str()) {
            provision =
                provision.with_timeouts(kind, timeouts(settings.timeouts_for(kind.as_str())));
        }
    }

    provision
}

fn timeouts(configured: TimeoutSettings) -> Timeouts {
    Timeouts {
        create: configured.create(),
        update: configured.update(),
        delete: configured.delete(),
    }
}

/// Build the API client from the configured token and endpoints
pub fn build_client(settings: &Settings) -> anyhow::Result<OpenStackClient> {
    let token = settings
        .token
        .as_deref()
        .filter(|token| !token.trim().is_empty())
        .context("no auth token configured: set OS_AUTH_TOKEN or `token` in stratus.yaml")?;

    let endpoints = Endpoints::from_map(&settings.endpoints)?;
    let client = OpenStackClient::new(endpoints, token)?;

    Ok(match &settings.region {
        Some(region) => client.with_region(region),
        None => client,
    })
}

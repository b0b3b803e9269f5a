//! Cluster configuration supplied by the application bootstrap.
//!
//! Read-only from the codec's point of view. Field names on the wire are
//! camelCase (`isLocalCluster`, `primaryMaster.cellTag`, ...).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterTheme {
    Grapefruit,
    Bittersweet,
    Sunflower,
    Grass,
    Mint,
    Aqua,
    Bluejeans,
    Lavander,
    Pinkrose,
    Lightgray,
    Mediumgray,
    Darkgray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterEnvironment {
    Development,
    Production,
    Prestable,
    Testing,
    Localmode,
}

/// Deployment environment of the console itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Farm,
    Localmode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Authentication {
    None,
    Basic,
    Domain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryMaster {
    pub cell_tag: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraConfig {
    pub preset: String,
    pub service_id: u64,
    pub environment_id: u64,
}

/// One reachable cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub id: String,
    pub name: String,
    pub theme: ClusterTheme,
    pub environment: ClusterEnvironment,
    /// HTTP proxy host, optionally with scheme and port.
    pub proxy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_master: Option<PrimaryMaster>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra: Option<InfraConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_order: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_local_cluster: Option<bool>,
}

impl ClusterConfig {
    pub fn is_secure(&self) -> bool {
        self.secure.unwrap_or(false)
    }

    /// Proxy base URL without a trailing slash.
    ///
    /// A proxy that already names a scheme keeps it; otherwise the scheme
    /// follows `secure`.
    pub fn base_url(&self) -> String {
        proxy_base_url(&self.proxy, self.is_secure())
    }
}

/// Normalize a proxy address into a base URL.
pub fn proxy_base_url(proxy: &str, secure: bool) -> String {
    let proxy = proxy.trim().trim_end_matches('/');
    if proxy.contains("://") {
        proxy.to_string()
    } else if secure {
        format!("https://{proxy}")
    } else {
        format!("http://{proxy}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceParams {
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigParameters {
    #[serde(default)]
    pub interface: InterfaceParams,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub version: String,
}

/// Top-level configuration: the known clusters and the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YtConfig {
    pub clusters: HashMap<String, ClusterConfig>,
    /// Id of the current cluster.
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_local_cluster: Option<bool>,
    #[serde(default)]
    pub parameters: ConfigParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<AppEnvironment>,
}

impl YtConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Load and validate a config file; `.yaml` / `.yml` are parsed as YAML,
    /// anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config = if is_yaml {
            Self::from_yaml_str(&text)?
        } else {
            Self::from_json_str(&text)?
        };
        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            clusters = config.clusters.len(),
            current = %config.cluster,
            "loaded cluster config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, cluster) in &self.clusters {
            if cluster.id != *key {
                return Err(ConfigError::IdMismatch { key: key.clone(), id: cluster.id.clone() });
            }
            if cluster.proxy.trim().is_empty() {
                return Err(ConfigError::EmptyProxy(key.clone()));
            }
        }
        if !self.clusters.contains_key(&self.cluster) {
            return Err(ConfigError::UnknownCluster(self.cluster.clone()));
        }
        Ok(())
    }

    pub fn current_cluster(&self) -> Result<&ClusterConfig, ConfigError> {
        self.cluster(&self.cluster)
    }

    pub fn cluster(&self, id: &str) -> Result<&ClusterConfig, ConfigError> {
        self.clusters
            .get(id)
            .ok_or_else(|| ConfigError::UnknownCluster(id.to_string()))
    }

    /// Cluster ids in sorted order.
    pub fn cluster_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.clusters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

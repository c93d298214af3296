use crate::constants::{DEFAULT_SERVICE_GROUP, DEFAULT_SERVICE_VERSION};
use serde::{Deserialize, Serialize};

/// One addressable provider instance, as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceMetaInfo {
    pub service_name: String,
    #[serde(default = "default_version")]
    pub service_version: String,
    pub service_host: String,
    pub service_port: u16,
    #[serde(default = "default_group")]
    pub service_group: String,
}

fn default_version() -> String {
    DEFAULT_SERVICE_VERSION.to_string()
}

fn default_group() -> String {
    DEFAULT_SERVICE_GROUP.to_string()
}

impl ServiceMetaInfo {
    pub fn new(
        service_name: impl Into<String>,
        service_host: impl Into<String>,
        service_port: u16,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: default_version(),
            service_host: service_host.into(),
            service_port,
            service_group: default_group(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.service_group = group.into();
        self
    }

    /// `name:version`
    pub fn service_key(&self) -> String {
        format!("{}:{}", self.service_name, self.service_version)
    }

    /// `name:version/host:port`, unique per instance.
    pub fn node_key(&self) -> String {
        format!("{}/{}", self.service_key(), self.address())
    }

    /// `host:port`, what the transport connects to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.service_host, self.service_port)
    }
}

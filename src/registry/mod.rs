// src/registry/mod.rs
use crate::config::EndpointConfig;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// A named remote address monitored for liveness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub url: Url,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate endpoint name: {0}")]
    DuplicateName(String),

    #[error("endpoint {0} has no name and no host to derive one from")]
    Unnamed(String),
}

/// Immutable, ordered set of endpoints. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: Arc<[Endpoint]>,
}

impl EndpointRegistry {
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for endpoint in &endpoints {
            if !seen.insert(endpoint.name.as_str()) {
                return Err(RegistryError::DuplicateName(endpoint.name.clone()));
            }
        }

        Ok(Self {
            endpoints: endpoints.into(),
        })
    }

    pub fn from_config(configs: &[EndpointConfig]) -> Result<Self, RegistryError> {
        let endpoints = configs
            .iter()
            .map(|config| {
                let name = match &config.name {
                    Some(name) if !name.trim().is_empty() => name.trim().to_string(),
                    _ => config
                        .url
                        .host_str()
                        .map(str::to_string)
                        .ok_or_else(|| RegistryError::Unnamed(config.url.to_string()))?,
                };
                Ok(Endpoint::new(name, config.url.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(endpoints)
    }

    pub fn all(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|e| e.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

//! The single resolution policy shared by every domain facade.
//!
//! * Demo mode never touches the network branch of the executor; the local
//!   accessor answers every operation.
//! * Live reads that fail are answered by the local accessor when offline
//!   fallback is allowed, and the caller cannot tell the difference.
//! * Live mutations that fail are always surfaced.

use crate::adapters::http::{RequestConfig, RequestExecutor};
use crate::config::{ClientConfig, OperatingMode};
use crate::core::classifier::{classify, RaisedFailure};
use crate::core::fallback::{Collections, FallbackDataSet};
use crate::utils::error::{AccessError, FailureClassification, Result};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Safe to re-invoke; may degrade to fallback data.
    Read,
    /// Claims a server-side effect; never fabricated on failure.
    Mutation,
}

/// Configuration, executor and fallback data shared by all facades.
pub struct ServiceContext {
    config: ClientConfig,
    executor: RequestExecutor,
    fallback: FallbackDataSet,
}

impl ServiceContext {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_fallback(config, FallbackDataSet::seeded()?)
    }

    pub fn with_fallback(config: ClientConfig, fallback: FallbackDataSet) -> Result<Self> {
        let executor = RequestExecutor::new(&config)?;
        Ok(Self {
            config,
            executor,
            fallback,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn mode(&self) -> OperatingMode {
        self.config.mode
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn fallback(&self) -> &FallbackDataSet {
        &self.fallback
    }

    /// Live leg only: executes the request and decodes the payload.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: &RequestConfig,
    ) -> std::result::Result<T, FailureClassification> {
        let payload = self.executor.execute(request).await?;
        serde_json::from_value(payload).map_err(|e| {
            classify(RaisedFailure::Malformed(format!(
                "unexpected payload for {}: {}",
                request.path, e
            )))
        })
    }

    pub async fn resolve<T, L>(
        &self,
        operation: &str,
        kind: OperationKind,
        request: RequestConfig,
        local: L,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        L: FnOnce(&FallbackDataSet) -> Result<T>,
    {
        if self.mode().is_demo() {
            return local(&self.fallback);
        }

        match self.fetch::<T>(&request).await {
            Ok(data) => Ok(data),
            Err(failure) => self.absorb(operation, kind, failure, local),
        }
    }

    /// Decides what a classified live failure turns into.
    pub fn absorb<T, L>(
        &self,
        operation: &str,
        kind: OperationKind,
        failure: FailureClassification,
        local: L,
    ) -> Result<T>
    where
        L: FnOnce(&FallbackDataSet) -> Result<T>,
    {
        match kind {
            OperationKind::Read if self.config.allow_offline_fallback => {
                tracing::warn!(
                    "⚠️ {} failed ({}), serving fallback data",
                    operation,
                    failure.kind()
                );
                local(&self.fallback)
            }
            _ => {
                tracing::warn!("❌ {} failed: {:?}", operation, failure);
                Err(AccessError::from(failure))
            }
        }
    }

    pub async fn read<T, F>(&self, operation: &str, request: RequestConfig, accessor: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce(&Collections) -> Result<T>,
    {
        self.resolve(operation, OperationKind::Read, request, |data| {
            accessor(&data.snapshot())
        })
        .await
    }

    pub async fn mutate<T, F>(
        &self,
        operation: &str,
        request: RequestConfig,
        simulate: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce(&mut Collections) -> Result<T>,
    {
        self.resolve(operation, OperationKind::Mutation, request, |data| {
            data.update(simulate)
        })
        .await
    }

    /// Bearer token of the active session.
    pub(crate) fn current_token(&self) -> Result<String> {
        self.executor
            .bearer_token()
            .ok_or(AccessError::SessionExpired)
    }
}

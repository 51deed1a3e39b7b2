//! Completion routing by model configuration name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::admission::AdmissionController;
use crate::providers::{CompletionProvider, OpenAiClient, RetryConfig, RetryingCompletionProvider};
use crate::types::{CompletionRequest, ModelConfig};
use crate::{ForkcastError, Result};

struct Route {
    provider: Arc<dyn CompletionProvider>,
    model: String,
}

/// Named completion clients behind one shared [`AdmissionController`].
///
/// Every call is admitted on the lane of its configuration name before the
/// provider is contacted; the retrying wrapper runs inside the admitted slot.
pub struct CompletionRouter {
    routes: HashMap<String, Route>,
    admission: Arc<AdmissionController>,
}

impl std::fmt::Debug for CompletionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.routes.keys().collect();
        names.sort();
        f.debug_struct("CompletionRouter")
            .field("configs", &names)
            .finish()
    }
}

impl CompletionRouter {
    pub fn new(admission: Arc<AdmissionController>) -> Self {
        Self {
            routes: HashMap::new(),
            admission,
        }
    }

    /// Build OpenAI-compatible clients for every model configuration.
    pub fn from_model_configs(configs: &HashMap<String, ModelConfig>) -> Result<Self> {
        let mut router = Self::new(Arc::new(AdmissionController::from_model_configs(configs)));
        for (name, config) in configs {
            let client: Arc<dyn CompletionProvider> = Arc::new(OpenAiClient::new(name, config)?);
            router = router.route(name, client, &config.model, RetryConfig::from(config));
        }
        Ok(router)
    }

    /// Register `provider` under `config`, wrapped with `retry`.
    pub fn route(
        mut self,
        config: impl Into<String>,
        provider: Arc<dyn CompletionProvider>,
        model: impl Into<String>,
        retry: RetryConfig,
    ) -> Self {
        let provider: Arc<dyn CompletionProvider> =
            Arc::new(RetryingCompletionProvider::new(provider, retry));
        self.routes.insert(
            config.into(),
            Route {
                provider,
                model: model.into(),
            },
        );
        self
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    pub fn has_config(&self, config: &str) -> bool {
        self.routes.contains_key(config)
    }

    /// Send a system + user prompt on `config`, returning the raw content.
    pub async fn complete(&self, config: &str, system: String, user: String) -> Result<String> {
        let route = self
            .routes
            .get(config)
            .ok_or_else(|| ForkcastError::UnknownModelConfig(config.to_string()))?;
        let request = CompletionRequest::new(&route.model, system, user);
        debug!(config, model = %route.model, "submitting completion");
        self.admission
            .submit(config, || route.provider.complete(&request))
            .await
    }
}

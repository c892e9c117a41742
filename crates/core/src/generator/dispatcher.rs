//! Concurrent fan-out of generation requests over a bounded worker pool.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, warn};

use super::types::{build_prompt, style_for_slot};
use super::{
    GeneratedImage, GenerationError, GenerationRequest, ImageProvider, ProviderKind,
    RetryingInvoker,
};
use crate::metrics;

/// Dispatches batches of generation requests to the configured providers.
///
/// Each request runs to completion on its own task, gated by a semaphore
/// sized for the batch. Results come back in completion order. A fatal error is
/// returned as soon as it is observed; requests already in flight keep
/// running detached and their results are discarded.
pub struct ParallelDispatcher {
    gemini: Option<Arc<dyn ImageProvider>>,
    openai: Option<Arc<dyn ImageProvider>>,
    invoker: Arc<RetryingInvoker>,
    max_parallel: usize,
}

impl ParallelDispatcher {
    /// Create a dispatcher. The last provider of each kind wins.
    ///
    /// `max_parallel` is the worker bound used by [`Self::dispatch_batch`].
    pub fn new(
        providers: Vec<Arc<dyn ImageProvider>>,
        invoker: RetryingInvoker,
        max_parallel: usize,
    ) -> Self {
        let mut gemini = None;
        let mut openai = None;
        for provider in providers {
            match provider.kind() {
                ProviderKind::Gemini => gemini = Some(provider),
                ProviderKind::OpenAi => openai = Some(provider),
            }
        }

        Self {
            gemini,
            openai,
            invoker: Arc::new(invoker),
            max_parallel: max_parallel.max(1),
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub fn has_providers(&self) -> bool {
        self.gemini.is_some() || self.openai.is_some()
    }

    fn provider(&self, kind: ProviderKind) -> Option<&Arc<dyn ImageProvider>> {
        match kind {
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::OpenAi => self.openai.as_ref(),
        }
    }

    /// Resolve the provider for a slot, falling back to the other kind when
    /// only one is configured.
    fn kind_for_slot(&self, slot: usize) -> Result<ProviderKind, GenerationError> {
        let preferred = ProviderKind::for_slot(slot);
        if self.provider(preferred).is_some() {
            Ok(preferred)
        } else if self.provider(preferred.other()).is_some() {
            Ok(preferred.other())
        } else {
            Err(GenerationError::NotConfigured(
                "no image provider configured".to_string(),
            ))
        }
    }

    /// Build `batch_size` requests for a subject, rotating styles and
    /// alternating providers by slot.
    pub fn plan_batch(
        &self,
        subject: &str,
        destination: &str,
        base_prompt: &str,
        batch_size: usize,
    ) -> Result<Vec<GenerationRequest>, GenerationError> {
        (0..batch_size)
            .map(|slot| {
                let provider = self.kind_for_slot(slot)?;
                let style = style_for_slot(slot);
                let prompt = build_prompt(provider, subject, destination, base_prompt, &style);
                Ok(GenerationRequest {
                    slot,
                    provider,
                    style,
                    prompt,
                })
            })
            .collect()
    }

    /// Run a batch with the default worker bound.
    pub async fn dispatch_batch(
        &self,
        requests: Vec<GenerationRequest>,
    ) -> Result<Vec<GeneratedImage>, GenerationError> {
        self.dispatch_batch_with(requests, self.max_parallel).await
    }

    /// Run a batch with at most `parallelism` requests in flight. Returns
    /// successful images in completion order; an empty list when every
    /// request failed non-fatally.
    pub async fn dispatch_batch_with(
        &self,
        requests: Vec<GenerationRequest>,
        parallelism: usize,
    ) -> Result<Vec<GeneratedImage>, GenerationError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let total = requests.len();
        let workers = parallelism.clamp(1, total);
        let permits = Arc::new(Semaphore::new(workers));
        let (tx, mut rx) = mpsc::channel(total);

        for request in requests {
            let provider = match self.provider(request.provider) {
                Some(p) => Arc::clone(p),
                None => {
                    return Err(GenerationError::NotConfigured(format!(
                        "{} provider not configured",
                        request.provider
                    )))
                }
            };
            let invoker = Arc::clone(&self.invoker);
            let permits = Arc::clone(&permits);
            let tx = tx.clone();

            tokio::spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                debug!(slot = request.slot, provider = %request.provider, style = request.style.name, "Dispatching generation");
                let result = invoker.invoke(provider.as_ref(), &request.prompt).await;
                // Receiver may be gone after a fatal error; the result is dropped.
                let _ = tx.send((request, result)).await;
            });
        }
        drop(tx);

        let mut images = Vec::with_capacity(total);
        let mut failures = 0usize;
        while let Some((request, result)) = rx.recv().await {
            match result {
                Ok(bytes) => images.push(GeneratedImage {
                    slot: request.slot,
                    provider: request.provider,
                    style: request.style,
                    prompt: request.prompt,
                    bytes,
                }),
                Err(e) if e.is_fatal() => {
                    error!(slot = request.slot, provider = %request.provider, error = %e, "Fatal error in batch");
                    return Err(e);
                }
                Err(e) => {
                    failures += 1;
                    warn!(slot = request.slot, provider = %request.provider, error = %e, "Generation request failed");
                }
            }
        }

        metrics::BATCH_YIELD.observe(images.len() as f64);
        debug!(requested = total, workers, produced = images.len(), failures, "Batch finished");

        Ok(images)
    }
}

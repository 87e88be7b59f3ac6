use futures::StreamExt;
use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::framework::channel::DebugChannel;
use crate::framework::core::{CompletedRequest, NetworkEvent, TapConfig, TapError};
use crate::framework::correlator::{CorrelatorStats, RequestCorrelator};
use crate::framework::parser;
use crate::framework::registry::{ApiEvent, HandlerRegistry};

/// Dispatch counters, one per way a completed request can leave the tap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TapStats {
    /// Payloads that reached a registered handler.
    pub dispatched: u64,
    /// Completed requests whose path maps to no known event.
    pub unmapped_paths: u64,
    /// Known events with no handler registered.
    pub unhandled_events: u64,
    /// Completed requests whose body fetch failed.
    pub fetch_failures: u64,
}

/// Drives one debugging channel: correlates its lifecycle notifications,
/// fetches and decodes completed bodies, and dispatches them to handlers.
pub struct GameTap<C: DebugChannel> {
    id: String,
    channel: C,
    config: TapConfig,
    correlator: RequestCorrelator,
    handlers: HandlerRegistry,
    stats: TapStats,
}

impl<C: DebugChannel> GameTap<C> {
    pub fn new(channel: C, config: TapConfig, handlers: HandlerRegistry) -> Self {
        let correlator = RequestCorrelator::new(config.filter());
        Self {
            id: Uuid::new_v4().to_string(),
            channel,
            config,
            correlator,
            handlers,
            stats: TapStats::default(),
        }
    }

    #[allow(dead_code)]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[allow(dead_code)]
    pub fn stats(&self) -> &TapStats {
        &self.stats
    }

    #[allow(dead_code)]
    pub fn correlator_stats(&self) -> &CorrelatorStats {
        self.correlator.stats()
    }

    /// Enable notification delivery and run until the channel's event stream
    /// ends. Every failure past enable degrades the affected request only.
    pub async fn run(&mut self) -> Result<(), TapError> {
        self.channel.enable().await?;
        let mut events = self.channel.subscribe()?;
        info!(
            "[{}] tap running with {} registered handlers",
            self.id,
            self.handlers.len()
        );

        while let Some(event) = events.next().await {
            self.handle_event(event).await;
        }

        info!(
            "[{}] event stream ended: dispatch={} correlation={}",
            self.id,
            serde_json::to_string(&self.stats).unwrap_or_default(),
            serde_json::to_string(self.correlator.stats()).unwrap_or_default()
        );
        Ok(())
    }

    /// Feed one notification through the correlator and dispatch any
    /// completed request it produces.
    pub async fn handle_event(&mut self, event: NetworkEvent) {
        if let Some(completed) = self.correlator.handle(event) {
            self.dispatch(completed).await;
        }
    }

    async fn dispatch(&mut self, completed: CompletedRequest) {
        let age_ms = completed.age_ms();
        let CompletedRequest {
            request_id,
            path,
            request,
            response,
            ..
        } = completed;

        // The entry is already out of the pending table; a failed fetch
        // drops this request's payload and nothing else.
        let mut fetched = match self.channel.fetch_response_body(&request_id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                self.stats.fetch_failures += 1;
                warn!(
                    "[{}] body fetch failed for {} ({}): {}",
                    self.id, request_id, path, e
                );
                return;
            }
        };

        // Not every channel returns post data with the body; fall back to
        // the metadata captured when the request was first seen.
        if fetched.post_data.is_none() {
            fetched.post_data = request
                .get("postData")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }

        let Some(event) = ApiEvent::from_path(&path) else {
            self.stats.unmapped_paths += 1;
            debug!("[{}] no event mapped for path {}", self.id, path);
            return;
        };
        let Some(handler) = self.handlers.get(event) else {
            self.stats.unhandled_events += 1;
            debug!("[{}] no handler registered for {:?}", self.id, event);
            return;
        };

        let payload = parser::decode(&self.config.data_prefix, fetched, request, response);
        debug!(
            "[{}] dispatching {:?} for {} ({}ms after first sighting)",
            self.id, event, path, age_ms
        );
        handler(&payload);
        self.stats.dispatched += 1;
    }
}

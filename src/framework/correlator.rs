use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::framework::core::{CompletedRequest, NetworkEvent, PathFilter};

/// Lifecycle phase of one tracked request. Transitions are driven solely by
/// the channel's notifications: sent, then received, then finished.
#[derive(Debug, Clone, PartialEq)]
enum PendingPhase {
    Sent { request: Value },
    Received { request: Value, response: Value },
}

#[derive(Debug, Clone)]
struct PendingRequest {
    path: String,
    first_seen: DateTime<Utc>,
    phase: PendingPhase,
}

/// Counters for every way the correlator can drop or refuse input.
///
/// The upstream channel is noisy and ignore-by-default is deliberate, so
/// these are diagnostics rather than errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorrelatorStats {
    /// Requests that matched the filter and entered the table.
    pub tracked: u64,
    /// Requests removed with both request and response metadata present.
    pub completed: u64,
    /// Sent/received notifications whose URL failed the path filter.
    pub ignored_urls: u64,
    /// Responses for IDs that were never tracked.
    pub orphan_responses: u64,
    /// Finishes for IDs that were never tracked or already completed.
    pub orphan_finishes: u64,
    /// Duplicate or out-of-order transitions that were rejected.
    pub out_of_order: u64,
    /// Finishes for entries that never saw a response.
    pub incomplete_finishes: u64,
}

/// Correlates the three per-request lifecycle notifications into completed
/// units of work. One instance per channel lifetime; all state lives here.
pub struct RequestCorrelator {
    filter: PathFilter,
    pending: HashMap<String, PendingRequest>,
    stats: CorrelatorStats,
}

impl RequestCorrelator {
    pub fn new(filter: PathFilter) -> Self {
        Self {
            filter,
            pending: HashMap::new(),
            stats: CorrelatorStats::default(),
        }
    }

    /// Feed one notification through the state machine. Only a finish for a
    /// fully correlated entry produces output.
    pub fn handle(&mut self, event: NetworkEvent) -> Option<CompletedRequest> {
        match event {
            NetworkEvent::RequestWillBeSent {
                request_id,
                url,
                request,
            } => {
                self.on_request_sent(&request_id, &url, request);
                None
            }
            NetworkEvent::ResponseReceived {
                request_id,
                url,
                response,
            } => {
                self.on_response_received(&request_id, &url, response);
                None
            }
            NetworkEvent::LoadingFinished { request_id } => self.on_loading_finished(&request_id),
        }
    }

    /// Track a new request if its URL matches the filter. Non-matching URLs
    /// are ignored without error.
    pub fn on_request_sent(&mut self, request_id: &str, url: &str, request: Value) {
        let Some(path) = self.filter.strip(url) else {
            self.stats.ignored_urls += 1;
            return;
        };
        if self.pending.contains_key(request_id) {
            self.stats.out_of_order += 1;
            warn!(
                "duplicate requestWillBeSent for {} ({}), keeping first sighting",
                request_id, path
            );
            return;
        }
        debug!("tracking request {} as {}", request_id, path);
        self.stats.tracked += 1;
        self.pending.insert(
            request_id.to_string(),
            PendingRequest {
                path,
                first_seen: Utc::now(),
                phase: PendingPhase::Sent { request },
            },
        );
    }

    /// Attach response metadata to a tracked request. A response for an
    /// untracked ID is counted and dropped.
    pub fn on_response_received(&mut self, request_id: &str, url: &str, response: Value) {
        if !self.filter.matches(url) {
            self.stats.ignored_urls += 1;
            return;
        }
        let Some(entry) = self.pending.get_mut(request_id) else {
            self.stats.orphan_responses += 1;
            warn!("responseReceived for untracked request {}", request_id);
            return;
        };
        let phase = std::mem::replace(
            &mut entry.phase,
            PendingPhase::Sent {
                request: Value::Null,
            },
        );
        match phase {
            PendingPhase::Sent { request } => {
                entry.phase = PendingPhase::Received { request, response };
            }
            received @ PendingPhase::Received { .. } => {
                entry.phase = received;
                self.stats.out_of_order += 1;
                warn!(
                    "second responseReceived for {} ({}), keeping the first",
                    request_id, entry.path
                );
            }
        }
    }

    /// Complete a tracked request. The entry is removed before the caller
    /// issues any body fetch, so a second finish for the same ID is a no-op.
    pub fn on_loading_finished(&mut self, request_id: &str) -> Option<CompletedRequest> {
        let Some(entry) = self.pending.remove(request_id) else {
            self.stats.orphan_finishes += 1;
            return None;
        };
        match entry.phase {
            PendingPhase::Received { request, response } => {
                self.stats.completed += 1;
                debug!("request {} completed as {}", request_id, entry.path);
                Some(CompletedRequest {
                    request_id: request_id.to_string(),
                    path: entry.path,
                    request,
                    response,
                    first_seen: entry.first_seen,
                })
            }
            PendingPhase::Sent { .. } => {
                self.stats.incomplete_finishes += 1;
                warn!(
                    "loadingFinished for {} ({}) before any response, dropping",
                    request_id, entry.path
                );
                None
            }
        }
    }

    #[allow(dead_code)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> &CorrelatorStats {
        &self.stats
    }
}

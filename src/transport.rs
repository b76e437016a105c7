//! Outbound analytics transport.

use crate::{error::Error, types::Properties};
use async_trait::async_trait;

/// Underlying analytics transport the tracker forwards to.
///
/// The tracker applies consent gating and anonymization splitting before any
/// call lands here; wire format, batching and retry are the transport's
/// concern. Anonymous events are expected to be de-linked from identity by
/// transport-side configuration (an enrichment plugin or equivalent).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Record a single named event with its property map.
    async fn track(&self, event: &str, properties: &Properties);

    /// Associate the given traits with a user identifier.
    async fn identify(&self, user_id: &str, traits: &Properties);

    /// Associate the current user with a group.
    async fn group(&self, group_id: &str, traits: &Properties);

    /// Clear transport-side user and group association.
    ///
    /// When `clear_anonymous_id` is set, the transport's anonymous
    /// identifier is regenerated as well.
    async fn reset(&self, clear_anonymous_id: bool);

    /// Flush queued events immediately instead of waiting for the batch
    /// interval or size threshold.
    async fn flush(&self) -> Result<(), Error>;
}

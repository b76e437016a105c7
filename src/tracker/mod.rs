//! Consent-gated tracking core.
//!
//! [`MetaMetrics`] owns the process-wide analytics state: the opt-in consent
//! flag, the durable tracking identifier, and the data-deletion regulation
//! lifecycle. Events flow through [`MetaMetrics::track_event`], which filters
//! on consent and splits properties into an attributable event and an
//! anonymous twin before anything reaches the transport.

use crate::{
    config::Config,
    error::Error,
    policy::{NonSensitivePolicy, PropertyPolicy},
    regulations::{RegulationService, RegulationsClient},
    storage::{keys, Storage, AGREED, DENIED},
    transport::Transport,
    types::{
        CreateDataDeletionResponse, DataDeleteStatus, DeleteRegulationStatus, Properties,
        TrackingEvent, ANONYMOUS_PROPERTY,
    },
};
use chrono::{DateTime, Datelike, Utc};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};
use uuid::Uuid;

static INSTANCE: OnceLock<Arc<MetaMetrics>> = OnceLock::new();

/// Mutable tracker state, guarded by a single async mutex so that consent
/// flips, identity changes and event dispatch never interleave partially.
#[derive(Debug, Default)]
struct TrackerState {
    configured: bool,
    enabled: bool,
    metametrics_id: Option<String>,
    data_recorded: bool,
    delete_regulation_id: Option<String>,
    delete_regulation_date: Option<String>,
}

/// Builder for [`MetaMetrics`].
///
/// The transport and storage collaborators are mandatory; the regulation
/// service, partition policy and identify-time context traits are optional.
pub struct MetaMetricsBuilder {
    transport: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    regulations: Option<Arc<dyn RegulationService>>,
    policy: Arc<dyn PropertyPolicy>,
    context_traits: Properties,
}

impl MetaMetricsBuilder {
    pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn Storage>) -> Self {
        Self {
            transport,
            storage,
            regulations: None,
            policy: Arc::new(NonSensitivePolicy),
            context_traits: Properties::new(),
        }
    }

    /// Wire up the HTTP regulation client from `config`.
    ///
    /// When the endpoint or source ID is missing, the deletion workflow
    /// stays unconfigured and reports errors instead of calling out.
    pub fn with_config(mut self, config: &Config) -> Self {
        match RegulationsClient::from_config(config) {
            Ok(client) => self.regulations = Some(Arc::new(client)),
            Err(e) => debug!(error = %e, "Deletion workflow left unconfigured"),
        }
        self
    }

    /// Inject a regulation service directly.
    pub fn with_regulations(mut self, regulations: Arc<dyn RegulationService>) -> Self {
        self.regulations = Some(regulations);
        self
    }

    /// Replace the legacy-property partition policy.
    pub fn with_policy(mut self, policy: Arc<dyn PropertyPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Device and user-settings traits sent with the identify call that
    /// follows a successful [`MetaMetrics::configure`].
    pub fn with_context_traits(mut self, traits: Properties) -> Self {
        self.context_traits = traits;
        self
    }

    pub fn build(self) -> MetaMetrics {
        MetaMetrics {
            transport: self.transport,
            storage: self.storage,
            regulations: self.regulations,
            policy: self.policy,
            context_traits: self.context_traits,
            state: Mutex::new(TrackerState::default()),
        }
    }

    /// Install the process-wide instance.
    ///
    /// The first call constructs the tracker from this builder; later calls
    /// return the existing instance and drop their builder's collaborators.
    pub fn install(self) -> Arc<MetaMetrics> {
        INSTANCE.get_or_init(|| Arc::new(self.build())).clone()
    }
}

/// The analytics tracking core.
///
/// Disabled by default; nothing is dispatched, identified or grouped until
/// the user opts in via [`enable`](Self::enable). One instance per process
/// is the intended usage (see [`MetaMetricsBuilder::install`]), with
/// [`configure`](Self::configure) called once at startup.
pub struct MetaMetrics {
    transport: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    regulations: Option<Arc<dyn RegulationService>>,
    policy: Arc<dyn PropertyPolicy>,
    context_traits: Properties,
    state: Mutex<TrackerState>,
}

impl MetaMetrics {
    /// The installed process-wide instance, if any.
    pub fn instance() -> Option<Arc<MetaMetrics>> {
        INSTANCE.get().cloned()
    }

    /// Load persisted consent, identity and deletion state, then identify
    /// the user with the construction-time context traits.
    ///
    /// Idempotent: once a call succeeds, later calls return `true` without
    /// touching storage again. Concurrent callers serialize on the state
    /// lock, so the load sequence runs at most once. A storage failure is
    /// logged and reported as `false`; the next call retries.
    pub async fn configure(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.configured {
            return true;
        }

        if let Err(e) = self.load_persisted_state(&mut state).await {
            error!(error = %e, "Failed to configure the tracker");
            return false;
        }
        state.configured = true;

        // Refresh the user traits with the latest device and settings
        // metadata. Consent-gated like every identify.
        if state.enabled {
            if let Some(id) = state.metametrics_id.as_deref() {
                self.transport.identify(id, &self.context_traits).await;
            }
        }

        debug!(
            enabled = state.enabled,
            data_recorded = state.data_recorded,
            has_regulation = state.delete_regulation_id.is_some(),
            "Tracker configured"
        );
        true
    }

    async fn load_persisted_state(&self, state: &mut TrackerState) -> Result<(), Error> {
        state.enabled = self.storage.get(keys::METRICS_OPT_IN).await?.as_deref() == Some(AGREED);
        state.metametrics_id = Some(self.load_or_generate_id().await?);
        state.delete_regulation_id = self.storage.get(keys::DELETE_REGULATION_ID).await?;
        state.delete_regulation_date = self.storage.get(keys::DELETE_REGULATION_DATE).await?;
        state.data_recorded =
            self.storage.get(keys::DATA_RECORDED).await?.as_deref() == Some("true");
        Ok(())
    }

    /// Flip the consent flag and persist it.
    ///
    /// Does not resend or redact anything already dispatched. A persistence
    /// failure is logged; the in-memory flag still takes effect.
    pub async fn enable(&self, enable: bool) {
        let mut state = self.state.lock().await;
        state.enabled = enable;
        let sentinel = if enable { AGREED } else { DENIED };
        if let Err(e) = self.storage.set(keys::METRICS_OPT_IN, sentinel).await {
            error!(error = %e, "Failed to store the consent flag");
        }
    }

    pub async fn is_enabled(&self) -> bool {
        self.state.lock().await.enabled
    }

    /// Associate traits with the current user.
    ///
    /// Silent no-op while disabled: identification must never occur without
    /// consent.
    pub async fn add_traits_to_user(&self, traits: &Properties) {
        let state = self.state.lock().await;
        if !state.enabled {
            return;
        }
        match state.metametrics_id.as_deref() {
            Some(id) => self.transport.identify(id, traits).await,
            None => warn!("Skipping identify, no tracking identifier loaded yet"),
        }
    }

    /// Associate the current user with a group. Consent-gated like
    /// [`add_traits_to_user`](Self::add_traits_to_user).
    pub async fn group(&self, group_id: &str, traits: &Properties) {
        let state = self.state.lock().await;
        if !state.enabled {
            return;
        }
        self.transport.group(group_id, traits).await;
    }

    /// Track an event.
    ///
    /// A complete no-op while disabled. Otherwise the event is normalized
    /// into name, non-sensitive and sensitive property buckets (legacy maps
    /// go through the partition policy), then dispatched:
    ///
    /// - no properties at all: one bare event marked `anonymous=false`;
    /// - otherwise one attributable event carrying only the non-sensitive
    ///   subset, plus, when a sensitive bucket exists, an anonymous twin
    ///   carrying the union of both buckets.
    ///
    /// Never fails; bookkeeping errors are swallowed after logging.
    pub async fn track_event(&self, event: TrackingEvent) {
        let mut state = self.state.lock().await;
        if !state.enabled {
            return;
        }

        let save_data_recording = event.save_data_recording();
        let (name, properties, sensitive_properties) = match event {
            TrackingEvent::Structured {
                name,
                properties,
                sensitive_properties,
                ..
            } => (name, properties, sensitive_properties),
            TrackingEvent::Legacy {
                category,
                properties,
            } => {
                let split = self.policy.partition(properties.unwrap_or_default());
                (category, split.properties, split.sensitive_properties)
            }
        };

        // No properties at all: a single bare attributable event, no
        // further processing.
        if properties.is_empty() && sensitive_properties.is_empty() {
            self.dispatch(
                &mut state,
                &name,
                Properties::new(),
                false,
                save_data_recording,
            )
            .await;
            return;
        }

        // The attributable event carries only the safe subset.
        self.dispatch(
            &mut state,
            &name,
            properties.clone(),
            false,
            save_data_recording,
        )
        .await;

        // The anonymous twin carries everything, sensitive included.
        if !sensitive_properties.is_empty() {
            let mut combined = sensitive_properties;
            combined.extend(properties);
            self.dispatch(&mut state, &name, combined, true, save_data_recording)
                .await;
        }
    }

    async fn dispatch(
        &self,
        state: &mut TrackerState,
        name: &str,
        mut properties: Properties,
        anonymous: bool,
        save_data_recording: bool,
    ) {
        properties.insert(ANONYMOUS_PROPERTY.to_owned(), Value::Bool(anonymous));
        debug!(event = name, anonymous, "Dispatching event");
        self.transport.track(name, &properties).await;

        // Mark that data exists since the last deletion request. Must never
        // fail the tracking call.
        if save_data_recording && !state.data_recorded {
            state.data_recorded = true;
            if let Err(e) = self.storage.set(keys::DATA_RECORDED, "true").await {
                error!(error = %e, "Failed to persist the data-recorded flag");
            }
        }
    }

    /// Clear the transport-side user association and regenerate the
    /// tracking identifier.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        self.transport.reset(true).await;
        if let Err(e) = self.regenerate_id(&mut state).await {
            error!(error = %e, "Failed to reset the tracking identifier");
        }
    }

    async fn regenerate_id(&self, state: &mut TrackerState) -> Result<(), Error> {
        // Clear both namespaces so the reload can only generate a fresh ID
        self.storage.remove(keys::METAMETRICS_ID).await?;
        self.storage.remove(keys::LEGACY_METAMETRICS_ID).await?;
        state.metametrics_id = Some(self.load_or_generate_id().await?);
        Ok(())
    }

    /// Flush the transport queue. Transport failures propagate to the
    /// caller.
    pub async fn flush(&self) -> Result<(), Error> {
        self.transport.flush().await
    }

    /// Request a new deletion regulation for the current identifier.
    ///
    /// On success the regulation ID, creation date and cleared
    /// data-recorded flag are persisted. On any failure nothing is mutated
    /// and a structured error result is returned.
    pub async fn create_data_deletion_task(&self) -> CreateDataDeletionResponse {
        let mut state = self.state.lock().await;
        let Some(regulations) = self.regulations.as_deref() else {
            return CreateDataDeletionResponse::error(Error::MissingRegulationsConfig.to_string());
        };
        let Some(subject_id) = state.metametrics_id.clone() else {
            return CreateDataDeletionResponse::error("No tracking identifier to delete");
        };

        match regulations.create_regulation(&subject_id).await {
            Ok(regulation_id) => {
                if let Err(e) = self.store_regulation(&mut state, regulation_id).await {
                    error!(error = %e, "Failed to persist the deletion regulation");
                    return CreateDataDeletionResponse::error(e.to_string());
                }
                CreateDataDeletionResponse::ok()
            }
            Err(e) => {
                error!(error = %e, "Analytics deletion task error");
                CreateDataDeletionResponse::error(e.to_string())
            }
        }
    }

    async fn store_regulation(
        &self,
        state: &mut TrackerState,
        regulation_id: String,
    ) -> Result<(), Error> {
        let date = format_deletion_date(Utc::now());
        self.storage
            .set(keys::DELETE_REGULATION_ID, &regulation_id)
            .await?;
        self.storage.set(keys::DELETE_REGULATION_DATE, &date).await?;
        self.storage.set(keys::DATA_RECORDED, "false").await?;
        state.delete_regulation_id = Some(regulation_id);
        state.delete_regulation_date = Some(date);
        state.data_recorded = false;
        Ok(())
    }

    /// Report the status of the outstanding deletion request.
    ///
    /// Without a regulation on record this returns an unknown status
    /// immediately, no network call. API or parsing failures also degrade
    /// to unknown while still reporting the recorded creation date and
    /// recorded-since-request flag.
    pub async fn check_data_delete_status(&self) -> DeleteRegulationStatus {
        let state = self.state.lock().await;
        let Some(regulation_id) = state.delete_regulation_id.as_deref() else {
            return DeleteRegulationStatus::default();
        };

        let status = match self.regulations.as_deref() {
            Some(regulations) => match regulations.regulation_status(regulation_id).await {
                Ok(status) => status,
                Err(e) => {
                    error!(error = %e, "Analytics deletion task check error");
                    DataDeleteStatus::Unknown
                }
            },
            None => DataDeleteStatus::Unknown,
        };

        DeleteRegulationStatus {
            deletion_request_date: state.delete_regulation_date.clone(),
            data_deletion_request_status: status,
            has_collected_data_since_deletion_request: state.data_recorded,
        }
    }

    pub async fn get_delete_regulation_creation_date(&self) -> Option<String> {
        self.state.lock().await.delete_regulation_date.clone()
    }

    pub async fn get_delete_regulation_id(&self) -> Option<String> {
        self.state.lock().await.delete_regulation_id.clone()
    }

    /// Whether any event has been recorded since the last deletion request.
    pub async fn is_data_recorded(&self) -> bool {
        self.state.lock().await.data_recorded
    }

    /// The durable tracking identifier, loading or generating it on first
    /// use.
    pub async fn get_metametrics_id(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        if let Some(id) = state.metametrics_id.clone() {
            return Some(id);
        }
        match self.load_or_generate_id().await {
            Ok(id) => {
                state.metametrics_id = Some(id.clone());
                Some(id)
            }
            Err(e) => {
                error!(error = %e, "Failed to load the tracking identifier");
                None
            }
        }
    }

    /// Identifier lifecycle: adopt the legacy-namespace value if present
    /// (one-time migration), else the current-namespace value, else
    /// generate and persist a fresh UUIDv4.
    async fn load_or_generate_id(&self) -> Result<String, Error> {
        if let Some(legacy) = self
            .storage
            .get(keys::LEGACY_METAMETRICS_ID)
            .await?
            .filter(|v| !v.is_empty())
        {
            debug!("Migrating legacy tracking identifier");
            self.storage.set(keys::METAMETRICS_ID, &legacy).await?;
            return Ok(legacy);
        }

        if let Some(id) = self
            .storage
            .get(keys::METAMETRICS_ID)
            .await?
            .filter(|v| !v.is_empty())
        {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        self.storage.set(keys::METAMETRICS_ID, &id).await?;
        debug!("Generated a new tracking identifier");
        Ok(id)
    }
}

/// UTC creation date in the `D/M/YYYY` legacy format, not zero-padded.
fn format_deletion_date(now: DateTime<Utc>) -> String {
    format!("{}/{}/{}", now.day(), now.month(), now.year())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deletion_date_is_not_zero_padded() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(format_deletion_date(date), "7/3/2024");

        let date = Utc.with_ymd_and_hms(2024, 11, 21, 23, 59, 59).unwrap();
        assert_eq!(format_deletion_date(date), "21/11/2024");
    }
}

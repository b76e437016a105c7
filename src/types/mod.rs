use derive_more::Display;
use serde::{Deserialize, Serialize};

pub use builder::EventBuilder;
pub use event::TrackingEvent;

pub mod builder;
pub mod event;

/// Flat event property map, JSON-valued.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Marker property attached to every dispatched event, indicating whether
/// the event is the anonymous or the attributable half of a split.
pub const ANONYMOUS_PROPERTY: &str = "anonymous";

/// Overall status of a vendor-side deletion regulation.
///
/// Values mirror the regulation API's `overallStatus` field. Anything the
/// API reports that isn't covered here maps to [`DataDeleteStatus::Unknown`].
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Default,
    Display,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataDeleteStatus {
    #[display("FAILED")]
    Failed,
    #[display("FINISHED")]
    Finished,
    #[display("INITIALIZED")]
    Initialized,
    #[display("INVALID")]
    Invalid,
    #[display("NOT_SUPPORTED")]
    NotSupported,
    #[display("PARTIAL_SUCCESS")]
    PartialSuccess,
    #[display("RUNNING")]
    Running,
    #[default]
    #[serde(other)]
    #[display("UNKNOWN")]
    Unknown,
}

/// Outcome marker for deletion API operations.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataDeleteResponseStatus {
    #[display("ok")]
    Ok,
    #[display("error")]
    Error,
}

/// Result of requesting a new deletion regulation.
///
/// Deletion operations never fail the caller; errors are folded into this
/// structured result instead.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CreateDataDeletionResponse {
    pub status: DataDeleteResponseStatus,
    pub error: Option<String>,
}

impl CreateDataDeletionResponse {
    pub fn ok() -> Self {
        Self {
            status: DataDeleteResponseStatus::Ok,
            error: None,
        }
    }

    pub fn error<S: Into<String>>(error: S) -> Self {
        Self {
            status: DataDeleteResponseStatus::Error,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == DataDeleteResponseStatus::Ok
    }
}

/// Snapshot of the deletion request lifecycle as reported to the caller.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct DeleteRegulationStatus {
    /// Date the regulation was requested, `D/M/YYYY`, not zero-padded.
    pub deletion_request_date: Option<String>,
    pub data_deletion_request_status: DataDeleteStatus,
    pub has_collected_data_since_deletion_request: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn delete_status_wire_values() {
        let status: DataDeleteStatus = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(status, DataDeleteStatus::Running);
        let status: DataDeleteStatus = serde_json::from_str("\"PARTIAL_SUCCESS\"").unwrap();
        assert_eq!(status, DataDeleteStatus::PartialSuccess);
    }

    #[test]
    fn unrecognized_delete_status_maps_to_unknown() {
        let status: DataDeleteStatus = serde_json::from_str("\"SOME_FUTURE_STATUS\"").unwrap();
        assert_eq!(status, DataDeleteStatus::Unknown);
    }

    #[test]
    fn delete_status_display() {
        assert_eq!(DataDeleteStatus::NotSupported.to_string(), "NOT_SUPPORTED");
        assert_eq!(DataDeleteStatus::Unknown.to_string(), "UNKNOWN");
    }
}

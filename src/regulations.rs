//! Client for the vendor data-deletion regulation REST API.

use crate::{config::Config, error::Error, types::DataDeleteStatus};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Vendor-specific content type required by the regulation API.
const REGULATION_CONTENT_TYPE: &str = "application/vnd.segment.v1+json";

/// Remote deletion-regulation operations, keyed by subject identifier.
///
/// The tracker talks to this trait so the deletion workflow is testable
/// without a live endpoint; [`RegulationsClient`] is the HTTP
/// implementation.
#[async_trait]
pub trait RegulationService: Send + Sync {
    /// Create a delete-only regulation for `subject_id`, returning the
    /// regulation ID assigned by the API.
    async fn create_regulation(&self, subject_id: &str) -> Result<String, Error>;

    /// Fetch the overall status of a previously created regulation.
    async fn regulation_status(&self, regulation_id: &str) -> Result<DataDeleteStatus, Error>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRegulationRequest<'a> {
    regulation_type: &'static str,
    subject_type: &'static str,
    subject_ids: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct CreateRegulationResponse {
    data: Option<CreateRegulationData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRegulationData {
    regulate_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegulationStatusResponse {
    data: Option<RegulationStatusData>,
}

#[derive(Debug, Deserialize)]
struct RegulationStatusData {
    regulation: Option<RegulationBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegulationBody {
    overall_status: Option<DataDeleteStatus>,
}

/// HTTP [`RegulationService`] implementation.
#[derive(Debug, Clone)]
pub struct RegulationsClient {
    http: reqwest::Client,
    endpoint: String,
    source_id: String,
}

impl RegulationsClient {
    /// Build a client from `config`.
    ///
    /// Fails with [`Error::MissingRegulationsConfig`] when the endpoint or
    /// the delete-API source ID is absent.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let endpoint = config
            .regulations_endpoint
            .as_deref()
            .ok_or(Error::MissingRegulationsConfig)?;
        let source_id = config
            .delete_api_source_id
            .clone()
            .ok_or(Error::MissingRegulationsConfig)?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            source_id,
        })
    }
}

#[async_trait]
impl RegulationService for RegulationsClient {
    async fn create_regulation(&self, subject_id: &str) -> Result<String, Error> {
        let url = format!("{}/regulations/sources/{}", self.endpoint, self.source_id);
        let body = CreateRegulationRequest {
            regulation_type: "DELETE_ONLY",
            subject_type: "USER_ID",
            subject_ids: [subject_id],
        };
        debug!(%url, "Creating deletion regulation");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, REGULATION_CONTENT_TYPE)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<CreateRegulationResponse>()
            .await?;

        response
            .data
            .and_then(|d| d.regulate_id)
            .ok_or(Error::MalformedRegulationResponse("data.regulateId"))
    }

    async fn regulation_status(&self, regulation_id: &str) -> Result<DataDeleteStatus, Error> {
        let url = format!("{}/regulations/{}", self.endpoint, regulation_id);
        debug!(%url, "Checking deletion regulation status");

        let response = self
            .http
            .get(&url)
            .header(CONTENT_TYPE, REGULATION_CONTENT_TYPE)
            .send()
            .await?
            .error_for_status()?
            .json::<RegulationStatusResponse>()
            .await?;

        // A missing status degrades to unknown rather than an error
        Ok(response
            .data
            .and_then(|d| d.regulation)
            .and_then(|r| r.overall_status)
            .unwrap_or(DataDeleteStatus::Unknown))
    }
}

//! Generator collaborator.
//!
//! The external generative-text service is invoked through the
//! [`CaseStudyGenerator`] trait so the lifecycle controller and its tests
//! never depend on a live endpoint. [`HttpGenerator`] is the production
//! implementation.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use chairside_core::CaseStudyRequest;

use crate::section::{GeneratedCaseStudy, GenerationMeta, SectionKind};

/// Errors reported by the generator collaborator.
///
/// The three variants match how the UI treats them: `NotConfigured` is
/// terminal for the session (no retry can succeed without operator
/// intervention), `Transient` and `Parse` are retryable and leave any prior
/// generated result untouched.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("case-study generator is not configured: {0}")]
    NotConfigured(String),

    #[error("generator temporarily unavailable: {0}")]
    Transient(String),

    #[error("could not decode generator response: {0}")]
    Parse(String),
}

impl GeneratorError {
    /// Returns `true` if retrying later could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotConfigured(_))
    }

    fn from_http(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }

    fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::NotConfigured(format!("rejected credentials ({status}): {body}")),
            429 => Self::Transient(format!("rate limited: {body}")),
            _ => Self::Transient(format!("generator returned {status}: {body}")),
        }
    }
}

/// One regenerated section, as returned by the second generator entry point.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RegeneratedSection {
    pub section: SectionKind,
    pub content: String,
    pub meta: GenerationMeta,
}

/// The external generative-text service.
#[async_trait]
pub trait CaseStudyGenerator {
    /// Generates a complete case study from a validated request.
    async fn generate(
        &self,
        request: &CaseStudyRequest,
    ) -> Result<GeneratedCaseStudy, GeneratorError>;

    /// Regenerates exactly one named section of an existing case study.
    async fn regenerate_section(
        &self,
        case_study_id: &str,
        section: SectionKind,
    ) -> Result<RegeneratedSection, GeneratorError>;
}

/// Connection settings for [`HttpGenerator`], resolved once at startup.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Service base URL, e.g. `https://casegen.internal` (no trailing slash
    /// required).
    pub base_url: String,

    /// Bearer token, if the deployment requires one.
    pub api_key: Option<String>,
}

/// HTTP implementation of the generator collaborator.
///
/// Deadlines are the service's responsibility; this client imposes no timeout
/// of its own and only reacts to eventual success or failure.
pub struct HttpGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpGenerator {
    /// Creates a client from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::NotConfigured`] if the base URL is blank —
    /// the one configuration failure detectable before the first call.
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GeneratorError::NotConfigured(
                "generator base URL is not set".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.api_key,
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        body: &impl serde::Serialize,
    ) -> Result<T, GeneratorError> {
        let resp = self
            .request(&url)
            .json(body)
            .send()
            .await
            .map_err(GeneratorError::from_http)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeneratorError::from_status(status.as_u16(), body));
        }

        resp.json().await.map_err(GeneratorError::from_http)
    }
}

#[async_trait]
impl CaseStudyGenerator for HttpGenerator {
    async fn generate(
        &self,
        request: &CaseStudyRequest,
    ) -> Result<GeneratedCaseStudy, GeneratorError> {
        let url = format!("{}/v1/case-studies", self.base_url);
        info!(
            patient = %request.patient,
            observations = request.observation_ids.len(),
            procedures = request.procedure_ids.len(),
            "requesting case-study generation"
        );

        let study: GeneratedCaseStudy = self.post_json(url, request).await?;
        info!(
            case_study = %study.id,
            tokens = study.meta.total_tokens,
            "case study generated"
        );
        Ok(study)
    }

    async fn regenerate_section(
        &self,
        case_study_id: &str,
        section: SectionKind,
    ) -> Result<RegeneratedSection, GeneratorError> {
        let url = format!(
            "{}/v1/case-studies/{}/sections/{}",
            self.base_url, case_study_id, section
        );
        info!(case_study = %case_study_id, section = %section, "requesting section regeneration");

        self.post_json(url, &serde_json::json!({})).await
    }
}

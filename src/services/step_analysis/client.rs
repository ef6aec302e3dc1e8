//! HTTP Analysis Service
//!
//! reqwest implementation of `AnalysisService` against the step analysis
//! REST endpoints (`/users/current/steps/{step}/...`). Every request carries
//! the configured timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use step_analysis_core::{
    AnalysisChoice, AnalysisConfig, AnalysisId, AnalysisService, AnalysisStatus, AppliedAnalysis,
    NewAnalysis, ParamSpec, ParamValues, ResultContents, ServiceError, ServiceResult, StepId,
    ValidationErrors,
};

use crate::models::settings::OrchestratorSettings;
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: AnalysisStatus,
}

#[derive(Debug, Deserialize)]
struct ValidationResponse {
    errors: ValidationErrors,
}

/// Analysis execution service reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisService {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| AppError::config(format!("Invalid service URL '{}': {}", base_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &OrchestratorSettings) -> AppResult<Self> {
        Self::new(&settings.service_url, settings.request_timeout())
    }

    fn step_url(&self, step_id: StepId, suffix: &str) -> String {
        format!("{}/users/current/steps/{}/{}", self.base_url, step_id, suffix)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!("[AnalysisClient] {} {}", method, url);
        self.client.request(method, url)
    }

    /// Send a request and turn non-success statuses into `ServiceError`.
    async fn send(&self, request: RequestBuilder) -> ServiceResult<Response> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            if let Some(errors) = parse_validation_errors(&body) {
                return Err(ServiceError::Validation(errors));
            }
        }
        tracing::warn!("[AnalysisClient] Request failed with HTTP {}", status.as_u16());
        Err(ServiceError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ServiceResult<T> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else if err.is_decode() {
        ServiceError::decode(err.to_string())
    } else {
        ServiceError::transport(err.to_string())
    }
}

/// Parse a 422 body: either `{"errors": {"general": [...], "byKey": {...}}}`
/// or a bare array of messages.
fn parse_validation_errors(body: &str) -> Option<ValidationErrors> {
    if let Ok(response) = serde_json::from_str::<ValidationResponse>(body) {
        return Some(response.errors);
    }
    serde_json::from_str::<Vec<String>>(body)
        .ok()
        .map(|general| ValidationErrors {
            general,
            ..Default::default()
        })
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn list_applied_analyses(&self, step_id: StepId) -> ServiceResult<Vec<AppliedAnalysis>> {
        let url = self.step_url(step_id, "analyses");
        self.send_json(self.request(Method::GET, &url)).await
    }

    async fn list_analysis_types(&self, step_id: StepId) -> ServiceResult<Vec<AnalysisChoice>> {
        let url = self.step_url(step_id, "analysis-types");
        self.send_json(self.request(Method::GET, &url)).await
    }

    async fn get_analysis_config(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
    ) -> ServiceResult<AnalysisConfig> {
        let url = self.step_url(step_id, &format!("analyses/{}", analysis_id));
        self.send_json(self.request(Method::GET, &url)).await
    }

    async fn get_param_specs(
        &self,
        step_id: StepId,
        type_name: &str,
    ) -> ServiceResult<Vec<ParamSpec>> {
        let url = self.step_url(step_id, &format!("analysis-types/{}", type_name));
        let specs: Vec<ParamSpec> = self.send_json(self.request(Method::GET, &url)).await?;
        Ok(specs.into_iter().filter(|spec| spec.is_visible).collect())
    }

    async fn create_analysis(
        &self,
        step_id: StepId,
        analysis: &NewAnalysis,
    ) -> ServiceResult<AnalysisConfig> {
        let url = self.step_url(step_id, "analyses");
        let config: AnalysisConfig = self
            .send_json(self.request(Method::POST, &url).json(analysis))
            .await?;
        tracing::info!(
            analysis_id = config.analysis_id,
            step_id,
            "[AnalysisClient] Created analysis '{}'",
            config.display_name
        );
        Ok(config)
    }

    async fn update_parameters(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
        parameters: &ParamValues,
    ) -> ServiceResult<()> {
        let url = self.step_url(step_id, &format!("analyses/{}", analysis_id));
        self.send(
            self.request(Method::PATCH, &url)
                .json(&json!({ "formParams": parameters })),
        )
        .await?;
        Ok(())
    }

    async fn run_analysis(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
    ) -> ServiceResult<AnalysisStatus> {
        let url = self.step_url(step_id, &format!("analyses/{}/result", analysis_id));
        let response: StatusResponse = self.send_json(self.request(Method::POST, &url)).await?;
        Ok(response.status)
    }

    async fn get_status(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
    ) -> ServiceResult<AnalysisStatus> {
        let url = self.step_url(step_id, &format!("analyses/{}/result/status", analysis_id));
        let response: StatusResponse = self.send_json(self.request(Method::GET, &url)).await?;
        Ok(response.status)
    }

    async fn get_result(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
    ) -> ServiceResult<ResultContents> {
        let url = self.step_url(step_id, &format!("analyses/{}/result", analysis_id));
        self.send_json(self.request(Method::GET, &url)).await
    }

    async fn rename_analysis(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
        new_display_name: &str,
    ) -> ServiceResult<()> {
        let url = self.step_url(step_id, &format!("analyses/{}", analysis_id));
        self.send(
            self.request(Method::PATCH, &url)
                .json(&json!({ "displayName": new_display_name })),
        )
        .await?;
        Ok(())
    }

    async fn delete_analysis(&self, step_id: StepId, analysis_id: AnalysisId) -> ServiceResult<()> {
        let url = self.step_url(step_id, &format!("analyses/{}", analysis_id));
        self.send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }
}

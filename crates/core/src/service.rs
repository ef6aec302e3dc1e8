//! Analysis Service Trait
//!
//! The remote execution service as seen by the coordinators. Passed
//! explicitly into every coordinator; there is no global client.

use async_trait::async_trait;

use crate::error::ServiceResult;
use crate::types::{
    AnalysisChoice, AnalysisConfig, AnalysisId, AnalysisStatus, AppliedAnalysis, NewAnalysis,
    ParamSpec, ParamValues, ResultContents, StepId,
};

/// Remote analysis execution service.
///
/// Implementations must be cheap to share across tasks; coordinators hold
/// it behind an `Arc`.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Analyses already attached to the step, in display order.
    async fn list_applied_analyses(&self, step_id: StepId) -> ServiceResult<Vec<AppliedAnalysis>>;

    /// Analysis types that may be attached to the step.
    async fn list_analysis_types(&self, step_id: StepId) -> ServiceResult<Vec<AnalysisChoice>>;

    async fn get_analysis_config(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
    ) -> ServiceResult<AnalysisConfig>;

    /// Visible parameter specs of an analysis type.
    async fn get_param_specs(
        &self,
        step_id: StepId,
        type_name: &str,
    ) -> ServiceResult<Vec<ParamSpec>>;

    async fn create_analysis(
        &self,
        step_id: StepId,
        analysis: &NewAnalysis,
    ) -> ServiceResult<AnalysisConfig>;

    /// Push new parameter values. Rejected values come back as
    /// `ServiceError::Validation`.
    async fn update_parameters(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
        parameters: &ParamValues,
    ) -> ServiceResult<()>;

    /// Start execution; returns the status the job entered.
    async fn run_analysis(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
    ) -> ServiceResult<AnalysisStatus>;

    async fn get_status(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
    ) -> ServiceResult<AnalysisStatus>;

    async fn get_result(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
    ) -> ServiceResult<ResultContents>;

    async fn rename_analysis(
        &self,
        step_id: StepId,
        analysis_id: AnalysisId,
        new_display_name: &str,
    ) -> ServiceResult<()>;

    async fn delete_analysis(&self, step_id: StepId, analysis_id: AnalysisId) -> ServiceResult<()>;
}

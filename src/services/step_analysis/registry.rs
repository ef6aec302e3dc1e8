//! Analysis Plugin Registry
//!
//! Maps an analysis type name to the renderers that draw its form and its
//! results. Only the presentation side consults the registry; the
//! orchestrator itself never needs more than the type name.

use std::collections::HashMap;
use std::sync::Arc;

use step_analysis_core::{FormView, ParamSpec, ParamValues, ResultView};

/// Draws the parameter form of one analysis type
pub trait FormRenderer: Send + Sync {
    fn render_form(&self, form: &FormView, specs: &[ParamSpec], values: &ParamValues) -> String;
}

/// Draws the result area of one analysis type
pub trait ResultRenderer: Send + Sync {
    fn render_result(&self, result: &ResultView) -> String;
}

/// Form renderer used when a type registers none: one `name = value` line
/// per visible parameter.
#[derive(Debug, Default)]
pub struct PlainFormRenderer;

impl FormRenderer for PlainFormRenderer {
    fn render_form(&self, form: &FormView, specs: &[ParamSpec], values: &ParamValues) -> String {
        if !form.has_parameters {
            return String::new();
        }
        let mut lines: Vec<String> = specs
            .iter()
            .filter(|spec| spec.is_visible)
            .map(|spec| {
                let label = spec.display_name.as_deref().unwrap_or(&spec.name);
                let value = values.get(&spec.name).map(String::as_str).unwrap_or("");
                format!("{} = {}", label, value)
            })
            .collect();
        lines.extend(form.errors.iter().map(|error| format!("! {}", error)));
        lines.join("\n")
    }
}

/// Result renderer used when a type registers none: pretty-printed JSON for
/// complete results, the status message otherwise.
#[derive(Debug, Default)]
pub struct JsonResultRenderer;

impl ResultRenderer for JsonResultRenderer {
    fn render_result(&self, result: &ResultView) -> String {
        match result {
            ResultView::Complete { contents } => {
                serde_json::to_string_pretty(contents).unwrap_or_else(|_| contents.to_string())
            }
            ResultView::Idle => String::new(),
            other => format!("{} {}", other.header(), other.message())
                .trim()
                .to_string(),
        }
    }
}

/// Renderer pair registered for one analysis type
#[derive(Clone)]
pub struct AnalysisPlugin {
    pub form: Arc<dyn FormRenderer>,
    pub result: Arc<dyn ResultRenderer>,
}

impl Default for AnalysisPlugin {
    fn default() -> Self {
        Self {
            form: Arc::new(PlainFormRenderer),
            result: Arc::new(JsonResultRenderer),
        }
    }
}

/// Registry of per-type renderers with a fallback pair
#[derive(Clone, Default)]
pub struct AnalysisPluginRegistry {
    plugins: HashMap<String, AnalysisPlugin>,
    fallback: AnalysisPlugin,
}

impl AnalysisPluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register renderers for `type_name`, replacing any earlier pair.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        form: Arc<dyn FormRenderer>,
        result: Arc<dyn ResultRenderer>,
    ) {
        self.plugins
            .insert(type_name.into(), AnalysisPlugin { form, result });
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.plugins.contains_key(type_name)
    }

    /// Renderers for `type_name`, or the fallback pair.
    pub fn resolve(&self, type_name: &str) -> &AnalysisPlugin {
        self.plugins.get(type_name).unwrap_or(&self.fallback)
    }
}

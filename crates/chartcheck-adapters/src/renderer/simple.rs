//! Renders a chart bundle with the built-in template engine.

use serde_yaml::Value;
use tracing::{debug, instrument, trace};

use chartcheck_core::{
    application::{ApplicationError, ports::TemplateRenderer},
    domain::{ArtifactSet, Bundle, EvaluationContext},
    error::CheckResult,
};

use super::{
    engine::{Definitions, Scope, Template, TemplateError},
    values,
};

/// Renderer for Go-template-style charts.
///
/// Every file under `templates/` is parsed and registered by its artifact
/// key, together with its `define` blocks. Partials (basename starting with
/// `_`) only contribute definitions; the rest are rendered. Artifacts are
/// keyed `<chart name>/<template path>`.
#[derive(Debug, Clone, Copy)]
pub struct SimpleRenderer;

impl SimpleRenderer {
    /// Create a new simple renderer.
    pub fn new() -> Self {
        Self
    }
}

impl Default for SimpleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for SimpleRenderer {
    #[instrument(skip_all, fields(chart = %bundle.name()))]
    fn render(&self, bundle: &Bundle, context: &EvaluationContext) -> CheckResult<ArtifactSet> {
        let values = effective_values(bundle, context).map_err(|e| failed(bundle, e))?;

        let mut parsed = Vec::with_capacity(bundle.templates.len());
        let mut definitions = Definitions::new();
        for template in &bundle.templates {
            let key = format!("{}/{}", bundle.name(), template.path);
            let tree = Template::parse(&template.content)
                .map_err(|e| failed(bundle, format!("{}: {e}", template.path)))?;
            definitions.register(key.clone(), &tree);
            parsed.push((template, key, tree));
        }

        let scope = Scope::new(bundle, context, values, &definitions);
        let mut artifacts = ArtifactSet::new();
        for (template, key, tree) in parsed {
            if is_partial(&template.path) {
                trace!(path = %template.path, "partial registered, not rendered");
                continue;
            }

            let text = tree
                .execute(&scope, &key)
                .map_err(|e| failed(bundle, format!("{}: {e}", template.path)))?;
            artifacts.insert(key, text);
        }

        debug!(count = artifacts.len(), "rendered chart");
        Ok(artifacts)
    }
}

/// Chart defaults overlaid with the user's values.
fn effective_values(bundle: &Bundle, context: &EvaluationContext) -> Result<Value, TemplateError> {
    let mut merged = values::parse(&bundle.default_values, "values.yaml")?;
    values::merge(
        &mut merged,
        values::parse(context.parameters().raw(), "user-supplied values")?,
    );
    Ok(merged)
}

fn is_partial(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|name| name.starts_with('_'))
}

fn failed(bundle: &Bundle, reason: impl ToString) -> chartcheck_core::error::CheckError {
    ApplicationError::RenderingFailed {
        chart: bundle.name().to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartcheck_core::{
        domain::{ChartMetadata, ParameterPayload},
        error::FailureKind,
    };

    const CONFIGMAP: &str = r#"apiVersion: v1
kind: ConfigMap
metadata:
  name: {{ template "cluster.name" . }}-tidb
data:
  config-file: |-
{{ .Values.tidb.config | default "" | indent 4 }}
"#;

    const HELPERS: &str = r#"{{/* Release name, unless the values name the cluster. */}}
{{- define "cluster.name" -}}
{{ default .Release.Name .Values.clusterName }}
{{- end -}}
"#;

    fn bundle() -> Bundle {
        Bundle::new(ChartMetadata::new("tidb-cluster", "v1.0.0"))
            .with_default_values("tidb:\n  config: |\n    lease = \"45s\"\n")
            .with_template("templates/tidb-configmap.yaml", CONFIGMAP)
            .with_template("templates/_helpers.tpl", HELPERS)
    }

    fn context(raw: &str) -> EvaluationContext {
        EvaluationContext::builder("demo", "tidb")
            .parameters(ParameterPayload::verbatim(raw))
            .build()
    }

    #[test]
    fn renders_templates_keyed_by_chart_name_and_skips_partials() {
        let artifacts = SimpleRenderer::new().render(&bundle(), &context("")).unwrap();

        assert_eq!(artifacts.len(), 1);
        let text = artifacts
            .get("tidb-cluster/templates/tidb-configmap.yaml")
            .unwrap();
        assert!(text.contains("name: demo-tidb"));
        assert!(text.contains("    lease = \"45s\""));
    }

    #[test]
    fn user_values_win_over_chart_defaults() {
        let artifacts = SimpleRenderer::new()
            .render(
                &bundle(),
                &context("tidb:\n  config: |\n    lease = \"10s\"\n"),
            )
            .unwrap();

        let text = artifacts
            .get("tidb-cluster/templates/tidb-configmap.yaml")
            .unwrap();
        assert!(text.contains("lease = \"10s\""));
        assert!(!text.contains("45s"));
    }

    #[test]
    fn partials_supply_named_templates() {
        let artifacts = SimpleRenderer::new()
            .render(&bundle(), &context("clusterName: prod\n"))
            .unwrap();

        let text = artifacts
            .get("tidb-cluster/templates/tidb-configmap.yaml")
            .unwrap();
        assert!(text.contains("name: prod-tidb"));
    }

    #[test]
    fn broken_partial_fails_the_render() {
        let bundle = bundle().with_template("templates/_broken.tpl", "{{ define \"x\" }}open");

        let err = SimpleRenderer::new().render(&bundle, &context("")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Render);
        assert!(err.to_string().contains("templates/_broken.tpl"));
    }

    #[test]
    fn files_render_by_their_own_name() {
        let bundle = bundle().with_template(
            "templates/pd-configmap.yaml",
            "{{ .Template.Name }}: {{ include \"tidb-cluster/templates/tidb-configmap.yaml\" . | trunc 10 }}",
        );
        let artifacts = SimpleRenderer::new().render(&bundle, &context("")).unwrap();
        assert_eq!(
            artifacts.get("tidb-cluster/templates/pd-configmap.yaml").unwrap(),
            "tidb-cluster/templates/pd-configmap.yaml: apiVersion"
        );
    }

    #[test]
    fn template_errors_become_render_failures() {
        let bundle = Bundle::new(ChartMetadata::new("tidb-cluster", "v1.0.0"))
            .with_template("templates/pd-configmap.yaml", "{{ .Values.pd.config }}");

        let err = SimpleRenderer::new().render(&bundle, &context("")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Render);
        assert!(err.to_string().contains("templates/pd-configmap.yaml"));
        assert!(err.to_string().contains(".Values.pd.config"));
    }

    #[test]
    fn malformed_user_values_are_render_failures() {
        let err = SimpleRenderer::new()
            .render(&bundle(), &context("tidb: [unclosed"))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Render);
        assert!(err.to_string().contains("user-supplied values"));
    }

    #[test]
    fn partial_detection_uses_basename() {
        assert!(is_partial("templates/_helpers.tpl"));
        assert!(!is_partial("templates/sub_dir/tidb-configmap.yaml"));
        assert!(!is_partial("templates/tidb_configmap.yaml"));
    }
}

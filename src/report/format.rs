//! Formatted terminal output.
//!
//! All printing goes through strings built here so the CLI layer stays thin
//! and the output can be asserted on in tests.

use std::collections::BTreeSet;

use crate::domain::{ArgValue, Mode};
use crate::fit::{FinalizedInvocation, ModelHandle};
use crate::io::ingest::IngestedData;
use crate::registry::Registry;
use crate::report::{FitQuality, Metric};
use crate::spec::ModelSpecification;

/// Describe a specification: title, mode, non-default arguments, engine.
pub fn format_spec(registry: &Registry, spec: &ModelSpecification, engine: Option<&str>) -> String {
    let title = registry
        .model(spec.model_type())
        .map(|m| m.title.clone())
        .unwrap_or_else(|_| spec.model_type().to_string());
    let mode = match spec.mode() {
        Mode::Unset => "unknown mode".to_string(),
        other => other.to_string(),
    };

    let mut out = format!("{title} Model Specification ({mode})\n");

    let main: Vec<(&str, &ArgValue)> = spec.args().filter(|(_, v)| !v.is_default()).collect();
    if !main.is_empty() {
        out.push_str("\nMain Arguments:\n");
        for (name, value) in main {
            out.push_str(&format!("  {name} = {value}\n"));
        }
    }

    if !spec.engine_args().is_empty() {
        out.push_str("\nEngine-Specific Arguments:\n");
        for (name, value) in spec.engine_args() {
            out.push_str(&format!("  {name} = {value}\n"));
        }
    }

    if let Some(engine) = engine {
        out.push_str(&format!("\nComputational engine: {engine}\n"));
    }
    out
}

/// The native call an invocation stands for, e.g.
/// `ranger(mode = regression, num.trees = 2000, seed = 63233)`.
pub fn format_invocation(invocation: &FinalizedInvocation) -> String {
    let mut parts = vec![format!("mode = {}", invocation.mode)];
    parts.extend(
        invocation
            .native_args
            .iter()
            .map(|(name, value)| format!("{name} = {value}")),
    );
    format!(
        "Model fit template:\n{}({})\n",
        invocation.engine,
        parts.join(", ")
    )
}

pub fn format_unresolved(fields: &BTreeSet<String>) -> String {
    if fields.is_empty() {
        return "All arguments are resolved.\n".to_string();
    }
    let mut out = format!("{} varying argument(s):\n", fields.len());
    for name in fields {
        out.push_str(&format!("  {name} = {}\n", ArgValue::PLACEHOLDER_TOKEN));
    }
    out
}

/// Catalog and engine tables, optionally restricted to one model type.
pub fn format_engines(registry: &Registry, model_type: Option<&str>) -> String {
    let mut out = String::new();
    for model in registry.models() {
        if model_type.is_some_and(|m| m != model.model_type) {
            continue;
        }
        out.push_str(&format!("{} ({})\n", model.model_type, model.title));
        out.push_str(&format!("  arguments: {}\n", model.canonical_args.join(", ")));
        out.push_str(&format!("  default mode: {}\n", model.default_mode));
        if let Some(engine) = registry.default_engine(&model.model_type) {
            out.push_str(&format!("  default engine: {engine}\n"));
        }
        for desc in registry.engines(&model.model_type) {
            let modes: Vec<&str> = desc.supported_modes.iter().map(|m| m.as_str()).collect();
            out.push_str(&format!("\n  {:<14} modes: {}\n", desc.engine, modes.join(", ")));
            for arg in &model.canonical_args {
                let native = desc.native_name(arg).unwrap_or("-");
                out.push_str(&format!("    {arg:<10} -> {native}\n"));
            }
            let natives: Vec<&str> = desc.valid_native_args.iter().map(String::as_str).collect();
            out.push_str(&format!("    engine args: {}\n", natives.join(", ")));
        }
        out.push('\n');
    }
    out
}

/// Dataset summary line(s), including skipped rows.
pub fn format_ingest(ingest: &IngestedData) -> String {
    let data = &ingest.dataset;
    let mut out = format!(
        "Data: {} rows used of {} read | {} features | outcome `{}`",
        ingest.rows_used,
        ingest.rows_read,
        data.n_features(),
        data.outcome_name()
    );
    if data.is_categorical() {
        out.push_str(&format!(" ({} classes)", data.classes().len()));
    }
    out.push('\n');
    if !ingest.ignored_columns.is_empty() {
        out.push_str(&format!(
            "Ignored non-numeric columns: {}\n",
            ingest.ignored_columns.join(", ")
        ));
    }
    if !ingest.row_errors.is_empty() {
        out.push_str(&format!("Skipped {} row(s):\n", ingest.row_errors.len()));
        for e in ingest.row_errors.iter().take(10) {
            out.push_str(&format!("  line {}: {}\n", e.line, e.message));
        }
        if ingest.row_errors.len() > 10 {
            out.push_str(&format!("  ... and {} more\n", ingest.row_errors.len() - 10));
        }
    }
    out
}

/// One line per successful fit.
pub fn format_fit_line(handle: &ModelHandle, quality: &FitQuality) -> String {
    let metric = match quality.metric {
        Metric::Rmse(v) => format!("RMSE={v:.4}"),
        Metric::Accuracy(v) => format!("accuracy={:.1}%", v * 100.0),
    };
    format!(
        "* {:<14} {metric:<18} {:>6} ms  [{}]\n    {}\n",
        handle.engine(),
        handle.elapsed_ms(),
        handle.fitted_at().format("%H:%M:%S"),
        handle.model().describe()
    )
}

pub fn format_fit_failure(engine: &str, message: &str) -> String {
    format!("x {engine:<14} {message}\n")
}

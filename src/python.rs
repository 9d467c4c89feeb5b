//! Python bindings.
//!
//! Thin wrappers over the resolver, compiler and serializer for hosts that
//! fetch records themselves.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::compile::{Compiler, Context, Shape};
use crate::config::FeedbackConfig;
use crate::decode::{repair::repair_malformed_json, resolve, Generation};
use crate::logging::LogContext;
use crate::serialize::canonicalize;
use crate::init_logger_with;

fn load_config(config_json: Option<&str>) -> PyResult<FeedbackConfig> {
    let config = match config_json {
        Some(json) => FeedbackConfig::from_json(json),
        None => FeedbackConfig::from_env(),
    };
    let config = config.map_err(|e| PyValueError::new_err(e.to_string()))?;
    init_logger_with(config.level_filter());
    Ok(config)
}

fn binding_context() -> LogContext {
    LogContext::new("python")
}

/// Decode stored content of any generation.
///
/// # Returns
/// Dict with `generation`, the metadata keys and a `fields` list of
/// `{key, label, type, value, render}` dicts.
#[pyfunction]
#[pyo3(signature = (content, format_marker=None, config_json=None))]
fn decode_feedback(
    py: Python<'_>,
    content: &str,
    format_marker: Option<&str>,
    config_json: Option<&str>,
) -> PyResult<Py<PyAny>> {
    load_config(config_json)?;
    let parsed = resolve(content, format_marker, &binding_context());

    let result = PyDict::new(py);
    result.set_item("generation", Generation::detect(format_marker).as_str())?;
    result.set_item("subject", parsed.resolved_subject())?;
    result.set_item("ip", parsed.resolved_ip())?;
    result.set_item("entry_title", &parsed.entry_title)?;
    result.set_item("entry_page", parsed.entry_page)?;
    result.set_item("source_id", parsed.source_id)?;
    result.set_item("source_type", parsed.source_type.map(|t| t.as_str()))?;
    result.set_item("request_url", &parsed.request_url)?;
    result.set_item("has_file", parsed.has_file())?;

    let fields = PyList::empty(py);
    for field in parsed.fields.iter() {
        let field_dict = PyDict::new(py);
        field_dict.set_item("key", field.key())?;
        field_dict.set_item("label", field.label())?;
        field_dict.set_item("type", field.field_type().as_str())?;
        field_dict.set_item("value", field.value().display())?;
        field_dict.set_item("render", field.is_renderable())?;
        fields.append(field_dict)?;
    }
    result.set_item("fields", fields)?;

    Ok(result.into())
}

/// Compile stored content for a context and shape; returns JSON text.
#[pyfunction]
#[pyo3(signature = (content, format_marker=None, context="default", shape="all", config_json=None))]
fn compile_feedback(
    content: &str,
    format_marker: Option<&str>,
    context: &str,
    shape: &str,
    config_json: Option<&str>,
) -> PyResult<String> {
    let config = load_config(config_json)?;
    let context: Context = context.parse().map_err(PyValueError::new_err)?;
    let shape: Shape = shape.parse().map_err(PyValueError::new_err)?;

    let parsed = resolve(content, format_marker, &binding_context());
    let projection = Compiler::new(&config).compile(&parsed.fields, context, shape);
    Ok(projection.to_json().to_string())
}

/// Re-encode stored content of any generation as canonical JSON.
#[pyfunction]
#[pyo3(signature = (content, format_marker=None, forget_ip=None, config_json=None))]
fn canonicalize_feedback(
    content: &str,
    format_marker: Option<&str>,
    forget_ip: Option<bool>,
    config_json: Option<&str>,
) -> PyResult<String> {
    let config = load_config(config_json)?;
    let forget_ip = forget_ip.unwrap_or(config.forget_ip_address);
    Ok(canonicalize(content, format_marker, forget_ip, &binding_context()))
}

/// Apply the slash-escaped JSON repair table.
#[pyfunction]
fn repair_json(text: &str) -> String {
    repair_malformed_json(text)
}

/// Python module definition
#[pymodule]
fn feedback_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(decode_feedback, m)?)?;
    m.add_function(wrap_pyfunction!(compile_feedback, m)?)?;
    m.add_function(wrap_pyfunction!(canonicalize_feedback, m)?)?;
    m.add_function(wrap_pyfunction!(repair_json, m)?)?;
    Ok(())
}

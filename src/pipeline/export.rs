//! CSV export of resolved feedback.

use std::io;

use crate::compile::{Context, Shape};
use crate::config::FeedbackConfig;
use crate::error::{FeedbackError, Result};
use crate::feedback::Feedback;
use crate::log_info;

use super::context::RequestContext;

/// Columns written before the per-form field columns.
pub const LEADING_COLUMNS: [&str; 4] = ["ID", "Date", "Title", "Source"];
/// Columns written after the per-form field columns.
pub const TRAILING_COLUMNS: [&str; 2] = ["Consent", "IP Address"];

/// Write one CSV row per entry.
///
/// Field columns are the union of every entry's CSV labels in first-seen
/// order; entries without a column get an empty cell.
pub fn write_csv<W, F>(writer: W, feedbacks: &[F], config: &FeedbackConfig) -> Result<()>
where
    W: io::Write,
    F: AsRef<Feedback>,
{
    let rows: Vec<Vec<(String, String)>> = feedbacks
        .iter()
        .map(|f| field_cells(f.as_ref(), config))
        .collect();

    let mut columns: Vec<&str> = Vec::new();
    for (label, _) in rows.iter().flatten() {
        if !columns.contains(&label.as_str()) {
            columns.push(label);
        }
    }

    let mut wtr = csv::Writer::from_writer(writer);
    let header = LEADING_COLUMNS
        .iter()
        .copied()
        .chain(columns.iter().copied())
        .chain(TRAILING_COLUMNS.iter().copied());
    wtr.write_record(header)?;

    for (feedback, cells) in feedbacks.iter().zip(&rows) {
        let feedback: &Feedback = feedback.as_ref();
        let mut record = vec![
            feedback.id().map(|id| id.to_string()).unwrap_or_default(),
            feedback.time(),
            feedback.title().to_string(),
            feedback.entry_title().to_string(),
        ];
        for column in &columns {
            let cell = cells
                .iter()
                .find(|(label, _)| label.as_str() == *column)
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            record.push(cell);
        }
        record.push(if feedback.has_consent() { "Yes" } else { "No" }.to_string());
        record.push(feedback.ip().unwrap_or_default().to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// CSV export as a string, compiled with the request's configuration.
pub fn export_csv<F: AsRef<Feedback>>(ctx: &RequestContext, feedbacks: &[F]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, feedbacks, &ctx.config)?;
    let csv = String::from_utf8(buffer)
        .map_err(|e| FeedbackError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    log_info!(
        ctx.log_context(),
        "CSV_EXPORTED",
        rows = feedbacks.len(),
        bytes = csv.len()
    );
    Ok(csv)
}

fn field_cells(feedback: &Feedback, config: &FeedbackConfig) -> Vec<(String, String)> {
    let projection = feedback.compiled_fields_with(config, Context::Csv, Shape::LabelValue);
    projection
        .keys()
        .into_iter()
        .map(|label| {
            let value = projection.get(label).map(|v| v.to_text()).unwrap_or_default();
            (label.to_string(), value)
        })
        .collect()
}

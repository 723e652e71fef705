//! CSV loaders for the support-ticket and sales datasets
//!
//! A missing file is "no data yet", not an error: both loaders return an
//! empty vector so the caller can render a zero state. A file that exists
//! but cannot be parsed (bad encoding, missing expected columns) fails with
//! [`DataError::Format`]; no partial-row recovery is attempted.

use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from loading or aggregating the datasets
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed data in {path}: {message}")]
    Format { path: String, message: String },

    #[error("Non-numeric total '{value}' on the order for {customer}")]
    BadTotal { customer: String, value: String },
}

/// One row of the support dataset
#[derive(Debug, Clone, Deserialize)]
pub struct TicketRecord {
    /// Ticket identifier (`id_ticket` column)
    #[serde(rename = "id_ticket")]
    pub id: String,

    /// Free-text customer message (`mensagem_cliente` column)
    #[serde(rename = "mensagem_cliente")]
    pub customer_message: String,
}

/// One row of the sales dataset
///
/// `total_value` is kept as raw text; numeric coercion (and its failure
/// mode) belongs to the aggregation step, where a bad cell must fail the
/// whole total rather than silently skew it.
#[derive(Debug, Clone, Deserialize)]
pub struct SalesRecord {
    /// Customer identifier (`cliente` column)
    #[serde(rename = "cliente")]
    pub customer: String,

    /// Item names joined with the configured separator (`itens` column)
    #[serde(rename = "itens")]
    pub items: String,

    /// Order total as written in the file (`valor_total` column)
    #[serde(rename = "valor_total")]
    pub total_value: String,
}

/// Load the support-ticket dataset.
pub fn load_tickets(path: impl AsRef<Path>) -> Result<Vec<TicketRecord>, DataError> {
    load(path)
}

/// Load the sales dataset.
pub fn load_sales(path: impl AsRef<Path>) -> Result<Vec<SalesRecord>, DataError> {
    load(path)
}

fn load<R>(path: impl AsRef<Path>) -> Result<Vec<R>, DataError>
where
    R: for<'de> Deserialize<'de>,
{
    let path = path.as_ref();

    if !path.exists() {
        debug!(path = %path.display(), "Dataset not found, treating as empty");
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| map_csv_error(path, e))?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: R = row.map_err(|e| map_csv_error(path, e))?;
        records.push(record);
    }

    info!(path = %path.display(), rows = records.len(), "Loaded dataset");
    Ok(records)
}

fn map_csv_error(path: &Path, error: csv::Error) -> DataError {
    let path_str = path.display().to_string();
    if error.is_io_error() {
        match error.into_kind() {
            csv::ErrorKind::Io(source) => DataError::Io {
                path: path_str,
                source,
            },
            other => DataError::Format {
                path: path_str,
                message: format!("{other:?}"),
            },
        }
    } else {
        DataError::Format {
            path: path_str,
            message: error.to_string(),
        }
    }
}

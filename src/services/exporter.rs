use bytes::Bytes;
use polars::prelude::*;
use crate::error::AppError;
use crate::models::{Dataset, ExportFormat, ExportResult, UploadedFile};
use crate::services::excel;
use crate::services::loader::extension_of;

pub fn export(dataset: &Dataset, format: ExportFormat, source: &UploadedFile) -> Result<ExportResult, AppError> {
    let payload = match format {
        ExportFormat::Csv => write_csv(dataset)?,
        ExportFormat::Spreadsheet => excel::write_workbook(dataset)?,
    };

    let file_name = output_file_name(&source.name, extension_of(&source.name), format);
    tracing::info!(
        "Exported {} as {} ({} bytes, {})",
        source.name,
        file_name,
        payload.len(),
        format.mime_type()
    );

    Ok(ExportResult {
        payload: Bytes::from(payload),
        file_name,
        mime_type: format.mime_type(),
    })
}

/// Substitutes the first occurrence of `extension` in `file_name`.
///
/// This is a plain substring replace, not a suffix replace: for
/// `a.csv.backup.csv` only the first `.csv` changes. `extension` is the
/// suffix as written in the upload, so `Q1.CSV` becomes `Q1.xlsx` rather
/// than keeping its name as a lowercased lookup would.
pub fn output_file_name(file_name: &str, extension: &str, format: ExportFormat) -> String {
    if extension.is_empty() {
        return file_name.to_string();
    }
    file_name.replacen(extension, format.extension(), 1)
}

/// Header row, comma separated, no index column, UTF-8.
pub fn write_csv(dataset: &Dataset) -> Result<Vec<u8>, AppError> {
    if dataset.width() == 0 {
        return Ok(b"\n".to_vec());
    }

    let mut frame = dataset.frame().clone();
    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(buffer)
}

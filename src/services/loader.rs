use std::collections::HashSet;
use std::io::Cursor;
use bytes::Bytes;
use polars::prelude::*;
use crate::error::AppError;
use crate::models::{render_cell, Dataset, UploadedFile};
use crate::services::excel::{self, utils::unique_column_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl SourceFormat {
    /// Detects the format from the file name suffix, case-insensitively.
    pub fn detect(file_name: &str) -> Result<Self, AppError> {
        let extension = extension_of(file_name);
        match extension.to_lowercase().as_str() {
            ".csv" => Ok(SourceFormat::Csv),
            ".xlsx" => Ok(SourceFormat::Spreadsheet),
            _ => Err(AppError::UnsupportedFormat(extension.to_lowercase())),
        }
    }
}

/// Suffix of the final path segment including the dot, as written.
///
/// Leading dots do not start an extension, so `.csv` has none.
pub fn extension_of(file_name: &str) -> &str {
    let base_start = file_name
        .rfind(|c: char| c == '/' || c == '\\')
        .map_or(0, |idx| idx + 1);
    let base = &file_name[base_start..];
    let stem_start = base.len() - base.trim_start_matches('.').len();

    match base[stem_start..].rfind('.') {
        Some(idx) => &base[stem_start + idx..],
        None => "",
    }
}

pub fn load(file: &UploadedFile) -> Result<Dataset, AppError> {
    let format = SourceFormat::detect(&file.name)?;
    tracing::info!("Loading {} ({} KB) as {:?}", file.name, file.size_kb(), format);

    let dataset = match format {
        SourceFormat::Csv => read_csv(&file.payload)?,
        SourceFormat::Spreadsheet => excel::read_first_sheet(&file.payload)?,
    };

    tracing::info!(
        "Loaded {}: {} rows, {} columns",
        file.name,
        dataset.height(),
        dataset.width()
    );
    Ok(dataset)
}

fn read_csv(payload: &Bytes) -> Result<Dataset, AppError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        tracing::warn!("CSV payload is empty, loading an empty dataset");
        return Ok(Dataset::empty());
    }

    let mut frame = CsvReader::new(Cursor::new(payload.as_ref()))
        .has_header(true)
        .infer_schema(None)
        .finish()
        .map_err(|e| AppError::FileProcessing(format!("Failed to parse CSV: {}", e)))?;

    let header = raw_header(payload)?;
    normalize_headers(&mut frame, header)?;
    type_empty_columns(&mut frame)?;
    Ok(Dataset::new(frame))
}

// The reader renames repeated headers itself, so take the names from the
// first record as written.
fn raw_header(payload: &Bytes) -> Result<Vec<String>, AppError> {
    let header = CsvReader::new(Cursor::new(payload.as_ref()))
        .has_header(false)
        .with_n_rows(Some(1))
        .finish()
        .map_err(|e| AppError::FileProcessing(format!("Failed to parse CSV header: {}", e)))?;

    Ok(header
        .get_columns()
        .iter()
        .map(|series| series.get(0).map(render_cell).unwrap_or_default())
        .collect())
}

fn normalize_headers(frame: &mut DataFrame, header: Vec<String>) -> Result<(), AppError> {
    let raw: Vec<String> = if header.len() == frame.width() {
        header
    } else {
        frame.get_column_names().iter().map(|name| name.to_string()).collect()
    };

    let mut existing_names = HashSet::new();
    let names: Vec<String> = raw
        .iter()
        .enumerate()
        .map(|(idx, name)| unique_column_name(name, idx, &mut existing_names))
        .collect();
    frame.set_column_names(&names)?;
    Ok(())
}

// A column with rows but no values carries no type information; treat it as
// numeric so it behaves like any other all-missing numeric column.
fn type_empty_columns(frame: &mut DataFrame) -> Result<(), AppError> {
    let empty: Vec<String> = frame
        .get_columns()
        .iter()
        .filter(|series| !series.is_empty() && series.null_count() == series.len())
        .filter(|series| !series.dtype().is_numeric())
        .map(|series| series.name().to_string())
        .collect();

    for name in empty {
        let height = frame.height();
        frame.replace(&name, Series::full_null(&name, height, &DataType::Float64))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_matches_path_splitting_rules() {
        assert_eq!(extension_of("report.data.csv"), ".csv");
        assert_eq!(extension_of("REPORT.XLSX"), ".XLSX");
        assert_eq!(extension_of(".csv"), "");
        assert_eq!(extension_of("notes"), "");
        assert_eq!(extension_of("dir.v2/data"), "");
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(SourceFormat::detect("Q1.CSV").unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::detect("x.Xlsx").unwrap(), SourceFormat::Spreadsheet);
    }

    #[test]
    fn unknown_suffix_is_unsupported() {
        let err = load(&UploadedFile::new("y.txt", "a,b\n1,2\n")).unwrap_err();
        match err {
            AppError::UnsupportedFormat(ext) => assert_eq!(ext, ".txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn csv_columns_get_inferred_types() -> anyhow::Result<()> {
        let file = UploadedFile::new("report.data.csv", "id,name,score\n1,a,5\n1,a,5\n2,b,\n");
        let dataset = load(&file)?;

        assert_eq!(dataset.column_names(), vec!["id", "name", "score"]);
        assert_eq!(dataset.height(), 3);
        assert_eq!(dataset.numeric_columns(), vec!["id", "score"]);
        assert_eq!(dataset.frame().column("score")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn repeated_and_blank_csv_headers_match_spreadsheet_naming() -> anyhow::Result<()> {
        let dataset = load(&UploadedFile::new("d.csv", "a,a,,b\n1,2,3,4\n"))?;
        assert_eq!(dataset.column_names(), vec!["a", "a_1", "column_3", "b"]);
        let second: Vec<Option<i64>> = dataset.frame().column("a_1")?.i64()?.into_iter().collect();
        assert_eq!(second, vec![Some(2)]);
        Ok(())
    }

    #[test]
    fn all_missing_csv_column_is_numeric() -> anyhow::Result<()> {
        let dataset = load(&UploadedFile::new("gaps.csv", "name,blank\na,\nb,\n"))?;
        assert_eq!(dataset.frame().column("blank")?.dtype(), &DataType::Float64);
        Ok(())
    }

    #[test]
    fn empty_csv_loads_as_empty_dataset() -> anyhow::Result<()> {
        let dataset = load(&UploadedFile::new("empty.csv", ""))?;
        assert_eq!(dataset.width(), 0);
        assert_eq!(dataset.height(), 0);
        Ok(())
    }
}

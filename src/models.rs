use bytes::Bytes;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tabular data held by a file session.
///
/// Polars reports a height of zero for a frame without columns, so the row
/// count is tracked separately to keep a zero-column projection the same
/// height as its source.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    row_count: usize,
}

impl Dataset {
    pub fn new(frame: DataFrame) -> Self {
        let row_count = frame.height();
        Self { frame, row_count }
    }

    pub fn empty() -> Self {
        Self::new(DataFrame::empty())
    }

    pub(crate) fn with_row_count(frame: DataFrame, row_count: usize) -> Self {
        let row_count = if frame.width() == 0 { row_count } else { frame.height() };
        Self { frame, row_count }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.row_count
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Columns with a numeric dtype, in frame order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.frame
            .get_columns()
            .iter()
            .filter(|series| series.dtype().is_numeric())
            .map(|series| series.name().to_string())
            .collect()
    }

    pub fn preview(&self, rows: usize) -> DatasetPreview {
        let head = self.frame.head(Some(rows));
        let rows = (0..head.height())
            .map(|idx| {
                head.get_columns()
                    .iter()
                    .map(|series| series.get(idx).map(render_cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        DatasetPreview {
            columns: self.column_names(),
            rows,
        }
    }
}

pub fn render_cell(value: AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetPreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A file as received from the client. Never modified after upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub payload: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn size_kb(&self) -> String {
        format!("{:.2}", self.size() as f64 / 1024.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningDirective {
    #[serde(default)]
    pub remove_duplicates: bool,
    #[serde(default, alias = "fill_missing_values")]
    pub fill_missing_numeric: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnSelection {
    #[default]
    All,
    Only(HashSet<String>),
}

impl ColumnSelection {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSelection::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            ColumnSelection::All => true,
            ColumnSelection::Only(names) => names.contains(name),
        }
    }

    /// Selected names in the dataset's own column order.
    pub fn resolve(&self, dataset: &Dataset) -> Vec<String> {
        dataset
            .column_names()
            .into_iter()
            .filter(|name| self.contains(name))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "csv", alias = "CSV")]
    Csv,
    #[serde(rename = "excel", alias = "Excel", alias = "xlsx", alias = "spreadsheet")]
    Spreadsheet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => ".csv",
            ExportFormat::Spreadsheet => ".xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub payload: Bytes,
    pub file_name: String,
    pub mime_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSummary {
    pub row_count: usize,
    pub series: Vec<ChartSeries>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_resolves_in_dataset_order() -> anyhow::Result<()> {
        let dataset = Dataset::new(df!(
            "id" => &[1, 2],
            "name" => &["a", "b"],
            "score" => &[5, 6]
        )?);

        let selection = ColumnSelection::only(["score", "id"]);
        assert_eq!(selection.resolve(&dataset), vec!["id", "score"]);
        assert_eq!(ColumnSelection::All.resolve(&dataset).len(), 3);
        Ok(())
    }

    #[test]
    fn preview_renders_missing_cells_as_blank() -> anyhow::Result<()> {
        let dataset = Dataset::new(df!(
            "name" => &[Some("a"), None],
            "score" => &[Some(1.5), None]
        )?);

        let preview = dataset.preview(5);
        assert_eq!(preview.columns, vec!["name", "score"]);
        assert_eq!(preview.rows, vec![vec!["a", "1.5"], vec!["", ""]]);
        Ok(())
    }

    #[test]
    fn export_format_accepts_ui_labels() {
        let csv: ExportFormat = serde_json::from_str("\"CSV\"").unwrap();
        let excel: ExportFormat = serde_json::from_str("\"Excel\"").unwrap();
        assert_eq!(csv, ExportFormat::Csv);
        assert_eq!(excel, ExportFormat::Spreadsheet);
        assert_eq!(excel.extension(), ".xlsx");
    }

    #[test]
    fn size_is_reported_in_kilobytes() {
        let file = UploadedFile::new("x.csv", vec![0u8; 1536]);
        assert_eq!(file.size_kb(), "1.50");
    }
}

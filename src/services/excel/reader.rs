use super::utils::*;
use std::io::Cursor;
use bytes::Bytes;
use calamine::{Data, Xlsx, open_workbook_from_rs, Reader};
use std::collections::HashSet;
use polars::prelude::*;
use crate::error::AppError;
use crate::models::Dataset;

/// Reads the first worksheet of an `.xlsx` payload, using its first row as header.
pub fn read_first_sheet(payload: &Bytes) -> Result<Dataset, AppError> {
    let cursor = Cursor::new(payload.clone());

    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)
        .map_err(|e| AppError::FileProcessing(format!("Failed to open Excel file: {}", e)))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        tracing::warn!("Workbook has no sheets, loading an empty dataset");
        return Ok(Dataset::empty());
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();

    let Some(header_row) = rows.first() else {
        tracing::warn!("Sheet {} is empty, loading an empty dataset", sheet_name);
        return Ok(Dataset::empty());
    };

    let mut existing_names = HashSet::new();
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| unique_column_name(&header_text(cell), idx, &mut existing_names))
        .collect();

    tracing::info!(
        "Reading sheet {} with {} data rows and {} columns",
        sheet_name,
        rows.len() - 1,
        headers.len()
    );
    build_frame(&rows[1..], &headers).map(Dataset::new)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn build_frame(rows: &[Vec<Data>], headers: &[String]) -> Result<DataFrame, AppError> {
    let mut columns = Vec::with_capacity(headers.len());

    for (col_idx, header) in headers.iter().enumerate() {
        let values: Vec<Data> = rows
            .iter()
            .map(|row| row.get(col_idx).cloned().unwrap_or(Data::Empty))
            .collect();

        let series = match detect_column_kind(&values) {
            ColumnKind::Integer => {
                let ints: Vec<Option<i64>> = values
                    .iter()
                    .map(|v| match v {
                        Data::Int(i) => Some(*i),
                        Data::Float(f) => Some(*f as i64),
                        _ => None,
                    })
                    .collect();
                Series::new(header, ints)
            }
            ColumnKind::Float => {
                let floats: Vec<Option<f64>> = values
                    .iter()
                    .map(|v| match v {
                        Data::Float(f) => Some(*f),
                        Data::Int(i) => Some(*i as f64),
                        _ => None,
                    })
                    .collect();
                Series::new(header, floats)
            }
            ColumnKind::Boolean => {
                let flags: Vec<Option<bool>> = values
                    .iter()
                    .map(|v| match v {
                        Data::Bool(b) => Some(*b),
                        _ => None,
                    })
                    .collect();
                Series::new(header, flags)
            }
            ColumnKind::Empty => Series::full_null(header, values.len(), &DataType::Float64),
            ColumnKind::Text => {
                let strings: Vec<Option<String>> = values.iter().map(cell_text).collect();
                Series::new(header, strings)
            }
        };

        columns.push(series);
    }

    DataFrame::new(columns)
        .map_err(|e| AppError::FileProcessing(format!("Failed to create DataFrame: {}", e)))
}

fn cell_text(value: &Data) -> Option<String> {
    match value {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::DateTime(d) => Some(
            d.as_datetime()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| d.as_f64().to_string()),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook_bytes(build: impl FnOnce(&mut rust_xlsxwriter::Worksheet)) -> Bytes {
        let mut workbook = Workbook::new();
        build(workbook.add_worksheet());
        Bytes::from(workbook.save_to_buffer().unwrap())
    }

    #[test]
    fn first_row_becomes_the_header() -> anyhow::Result<()> {
        let payload = workbook_bytes(|sheet| {
            sheet.write_string(0, 0, "id").unwrap();
            sheet.write_string(0, 1, "name").unwrap();
            sheet.write_number(1, 0, 1.0).unwrap();
            sheet.write_string(1, 1, "a").unwrap();
            sheet.write_number(2, 0, 2.0).unwrap();
            sheet.write_string(2, 1, "b").unwrap();
        });

        let dataset = read_first_sheet(&payload)?;
        assert_eq!(dataset.column_names(), vec!["id", "name"]);
        assert_eq!(dataset.height(), 2);
        assert_eq!(dataset.frame().column("id")?.dtype(), &DataType::Int64);
        assert_eq!(dataset.frame().column("name")?.dtype(), &DataType::String);
        Ok(())
    }

    #[test]
    fn text_only_sheet_has_no_numeric_columns() -> anyhow::Result<()> {
        let payload = workbook_bytes(|sheet| {
            sheet.write_string(0, 0, "city").unwrap();
            sheet.write_string(1, 0, "Lisbon").unwrap();
        });

        let dataset = read_first_sheet(&payload)?;
        assert!(dataset.numeric_columns().is_empty());
        Ok(())
    }

    #[test]
    fn garbage_payload_is_a_processing_error() {
        let err = read_first_sheet(&Bytes::from_static(b"not a workbook")).unwrap_err();
        assert!(matches!(err, AppError::FileProcessing(_)));
    }
}

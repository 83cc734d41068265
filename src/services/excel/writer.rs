use polars::prelude::*;
use rust_xlsxwriter::{Workbook, Worksheet};
use crate::error::AppError;
use crate::models::Dataset;

pub const SHEET_NAME: &str = "Sheet1";

/// Serializes the dataset into a single-sheet `.xlsx` document, header first.
pub fn write_workbook(dataset: &Dataset) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col_idx, series) in dataset.frame().get_columns().iter().enumerate() {
        let col = u16::try_from(col_idx)
            .map_err(|_| AppError::Export(format!("Too many columns for a worksheet: {}", col_idx + 1)))?;
        worksheet.write_string(0, col, series.name())?;
        write_column(worksheet, col, series)?;
    }

    let buffer = workbook.save_to_buffer()?;
    tracing::info!(
        "Wrote workbook with {} rows and {} columns ({} bytes)",
        dataset.height(),
        dataset.width(),
        buffer.len()
    );
    Ok(buffer)
}

fn write_column(worksheet: &mut Worksheet, col: u16, series: &Series) -> Result<(), AppError> {
    let dtype = series.dtype();

    if dtype == &DataType::Boolean {
        for (idx, value) in series.bool()?.into_iter().enumerate() {
            if let Some(flag) = value {
                worksheet.write_boolean(sheet_row(idx)?, col, flag)?;
            }
        }
    } else if dtype.is_numeric() {
        let floats = series.cast(&DataType::Float64)?;
        for (idx, value) in floats.f64()?.into_iter().enumerate() {
            if let Some(number) = value {
                worksheet.write_number(sheet_row(idx)?, col, number)?;
            }
        }
    } else {
        let strings = series.cast(&DataType::String)?;
        for (idx, value) in strings.str()?.into_iter().enumerate() {
            if let Some(text) = value {
                worksheet.write_string(sheet_row(idx)?, col, text)?;
            }
        }
    }

    Ok(())
}

// Row 0 holds the header.
fn sheet_row(idx: usize) -> Result<u32, AppError> {
    u32::try_from(idx + 1)
        .map_err(|_| AppError::Export(format!("Too many rows for a worksheet: {}", idx + 1)))
}

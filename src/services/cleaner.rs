use polars::prelude::*;
use serde::Serialize;
use crate::error::AppError;
use crate::models::{CleaningDirective, Dataset};
use crate::services::excel::utils::is_integral;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    pub duplicates_removed: usize,
    pub cells_filled: usize,
    pub messages: Vec<String>,
}

/// Applies the directive in place: duplicates first, then mean fill.
pub fn clean(dataset: &mut Dataset, directive: CleaningDirective) -> Result<CleaningReport, AppError> {
    let mut report = CleaningReport::default();

    if directive.remove_duplicates {
        report.duplicates_removed = remove_duplicates(dataset)?;
        report.messages.push("Duplicates removed.".to_string());
    }

    if directive.fill_missing_numeric {
        report.cells_filled = fill_missing_numeric(dataset)?;
        report.messages.push("Missing values filled.".to_string());
    }

    Ok(report)
}

/// Drops rows identical to an earlier row across all columns, keeping order.
pub fn remove_duplicates(dataset: &mut Dataset) -> Result<usize, AppError> {
    if dataset.width() == 0 {
        return Ok(0);
    }

    let before = dataset.height();
    let frame = dataset
        .frame()
        .unique_stable(None, UniqueKeepStrategy::First, None)?;
    *dataset = Dataset::new(frame);

    let removed = before - dataset.height();
    tracing::info!("Removed {} duplicate rows", removed);
    Ok(removed)
}

/// Replaces missing cells of numeric columns with the column mean.
///
/// Integer columns keep their dtype when the mean is a whole number.
/// Columns without any value have no mean and are left untouched.
pub fn fill_missing_numeric(dataset: &mut Dataset) -> Result<usize, AppError> {
    let mut filled = 0;
    let mut exprs = Vec::new();

    for series in dataset.frame().get_columns() {
        let dtype = series.dtype();
        if !dtype.is_numeric() || series.null_count() == 0 {
            continue;
        }

        let Some(mean) = series.mean() else {
            tracing::debug!("Column {} has no values, skipping fill", series.name());
            continue;
        };

        let mut expr = col(series.name()).fill_null(lit(mean));
        if !matches!(dtype, DataType::Float32 | DataType::Float64) && is_integral(mean) {
            expr = expr.cast(dtype.clone());
        }
        filled += series.null_count();
        exprs.push(expr);
    }

    if exprs.is_empty() {
        return Ok(0);
    }

    let frame = dataset.frame().clone().lazy().with_columns(exprs).collect()?;
    *dataset = Dataset::new(frame);

    tracing::info!("Filled {} missing numeric cells", filled);
    Ok(filled)
}

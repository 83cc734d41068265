use polars::prelude::*;
use crate::error::AppError;
use crate::models::{ChartSeries, ChartSummary, Dataset};

pub const CHART_SERIES: usize = 2;

/// Row-indexed values of the first two numeric columns, in column order.
pub fn summarize(dataset: &Dataset) -> Result<ChartSummary, AppError> {
    let series = dataset
        .numeric_columns()
        .into_iter()
        .take(CHART_SERIES)
        .map(|name| -> Result<ChartSeries, AppError> {
            let series = dataset.frame().column(&name)?;
            let floats = series.cast(&DataType::Float64)?;
            let values = floats.f64()?.into_iter().collect();
            Ok(ChartSeries {
                name,
                values,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    if series.len() < CHART_SERIES {
        tracing::debug!("Only {} numeric columns available for the chart", series.len());
    }

    Ok(ChartSummary {
        row_count: dataset.height(),
        series,
    })
}

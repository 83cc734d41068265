use crate::error::AppError;
use crate::models::{CleaningDirective, ColumnSelection, Dataset};
use crate::services::cleaner::{self, CleaningReport};
use crate::services::selector;

#[derive(Debug, Clone)]
pub struct Rendered {
    pub dataset: Dataset,
    pub report: CleaningReport,
}

/// Re-runs cleaning and column selection over a fresh copy of `source`.
///
/// The source is never modified, so repeated actions do not accumulate.
pub fn render(
    source: &Dataset,
    directive: CleaningDirective,
    selection: &ColumnSelection,
) -> Result<Rendered, AppError> {
    let mut dataset = source.clone();
    let report = cleaner::clean(&mut dataset, directive)?;
    let dataset = selector::select_columns(&dataset, selection)?;

    Ok(Rendered { dataset, report })
}

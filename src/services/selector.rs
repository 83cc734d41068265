use crate::error::AppError;
use crate::models::{ColumnSelection, Dataset};

/// Projects the dataset onto the selected columns, keeping source order.
///
/// Unknown names are ignored. An empty selection yields a dataset with no
/// columns but the same number of rows.
pub fn select_columns(dataset: &Dataset, selection: &ColumnSelection) -> Result<Dataset, AppError> {
    let names = selection.resolve(dataset);
    if names.len() == dataset.width() {
        return Ok(dataset.clone());
    }

    let frame = dataset.frame().select(&names)?;
    tracing::info!("Selected {} of {} columns", names.len(), dataset.width());
    Ok(Dataset::with_row_count(frame, dataset.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sample() -> Dataset {
        Dataset::new(
            df!(
                "id" => &[1, 2, 3],
                "name" => &["a", "b", "c"],
                "score" => &[Some(5.0), None, Some(7.0)]
            )
            .unwrap(),
        )
    }

    #[test]
    fn projection_keeps_rows_and_values() -> anyhow::Result<()> {
        let source = sample();
        let selected = select_columns(&source, &ColumnSelection::only(["score", "id"]))?;

        assert_eq!(selected.column_names(), vec!["id", "score"]);
        assert_eq!(selected.height(), source.height());
        for name in selected.column_names() {
            let left = selected.frame().column(&name)?;
            let right = source.frame().column(&name)?;
            assert!(left.equals_missing(right));
        }
        Ok(())
    }

    #[test]
    fn full_selection_is_a_pass_through() -> anyhow::Result<()> {
        let source = sample();
        let all = select_columns(&source, &ColumnSelection::only(["name", "score", "id"]))?;
        assert_eq!(all.column_names(), source.column_names());
        assert!(all.frame().equals_missing(source.frame()));
        Ok(())
    }

    #[test]
    fn empty_selection_keeps_row_count() -> anyhow::Result<()> {
        let source = sample();
        let none = select_columns(&source, &ColumnSelection::only(Vec::<String>::new()))?;
        assert_eq!(none.width(), 0);
        assert_eq!(none.height(), 3);
        Ok(())
    }

    #[test]
    fn unknown_names_are_ignored() -> anyhow::Result<()> {
        let selected = select_columns(&sample(), &ColumnSelection::only(["name", "missing"]))?;
        assert_eq!(selected.column_names(), vec!["name"]);
        Ok(())
    }
}

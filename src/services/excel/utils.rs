use std::collections::HashSet;
use calamine::Data;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Empty,
    Text,
}

/// Returns a header name that is not yet in `existing_names`, recording it.
///
/// Blank headers become `column_<n>` (1-based); repeats get `_1`, `_2`, ...
pub fn unique_column_name(name: &str, position: usize, existing_names: &mut HashSet<String>) -> String {
    let base_name = if name.trim().is_empty() {
        format!("column_{}", position + 1)
    } else {
        name.to_string()
    };

    // If the name already exists, add a numeric suffix
    let mut cleaned = base_name.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", base_name, counter);
        counter += 1;
    }

    cleaned
}

/// A column is numeric only when every non-empty cell is a number.
pub fn detect_column_kind(values: &[Data]) -> ColumnKind {
    let mut present = 0;
    let mut numeric = 0;
    let mut integral = 0;
    let mut boolean = 0;

    for value in values.iter().filter(|v| !matches!(v, Data::Empty)) {
        present += 1;
        match value {
            Data::Int(_) => {
                numeric += 1;
                integral += 1;
            }
            Data::Float(f) => {
                numeric += 1;
                if is_integral(*f) {
                    integral += 1;
                }
            }
            Data::Bool(_) => boolean += 1,
            _ => {}
        }
    }

    match () {
        _ if present == 0 => ColumnKind::Empty,
        _ if numeric == present && integral == values.len() => ColumnKind::Integer,
        _ if numeric == present => ColumnKind::Float,
        _ if boolean == present => ColumnKind::Boolean,
        _ => ColumnKind::Text,
    }
}

pub fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64
}

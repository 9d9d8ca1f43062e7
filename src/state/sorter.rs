use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::column::{Column, ColumnType};
use crate::state::data_model::{self, Row};
use crate::state::format;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    /// Original index of the sorted column.
    pub column: usize,
    pub direction: SortDirection,
}

/// Sort state after a header click on `column`. Clicking the sorted column
/// toggles its direction, any other column starts ascending, and
/// `preserve_direction` replays the stored direction unchanged.
pub fn next_sort(
    current: Option<SortSpec>,
    stored_direction: SortDirection,
    column: usize,
    preserve_direction: bool,
) -> SortSpec {
    let direction = if preserve_direction {
        stored_direction
    } else {
        match current {
            Some(spec) if spec.column == column => spec.direction.toggled(),
            _ => SortDirection::Asc,
        }
    };
    SortSpec { column, direction }
}

pub fn compare_cells(left: &Value, right: &Value, column_type: ColumnType) -> Ordering {
    match column_type {
        t if t.is_numeric() => {
            let a = data_model::value_as_f64(left).unwrap_or(0.0);
            let b = data_model::value_as_f64(right).unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        t if t.is_temporal() => {
            let a = format::epoch_millis(left).unwrap_or(0);
            let b = format::epoch_millis(right).unwrap_or(0);
            a.cmp(&b)
        }
        ColumnType::Boolean => {
            let a = data_model::value_as_bool(left).unwrap_or(false) as u8;
            let b = data_model::value_as_bool(right).unwrap_or(false) as u8;
            a.cmp(&b)
        }
        _ => data_model::display_value(left)
            .to_lowercase()
            .cmp(&data_model::display_value(right).to_lowercase()),
    }
}

/// Stable sort of row indices by one column.
pub fn sort_indices(indices: &mut [usize], rows: &[Row], column: &Column, direction: SortDirection) {
    indices.sort_by(|a, b| {
        let ordering = compare_cells(
            format::cell_value(&rows[*a], column),
            format::cell_value(&rows[*b], column),
            column.column_type,
        );
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

pub const MIN_COLUMN_WIDTH: u32 = 50;
pub const MAX_COLUMN_WIDTH: u32 = 5000;
pub const DEFAULT_COLUMN_WIDTH: u32 = 150;

pub fn clamp_width(width: f64) -> u32 {
    if !width.is_finite() {
        return MIN_COLUMN_WIDTH;
    }
    (width.round() as i64).clamp(MIN_COLUMN_WIDTH as i64, MAX_COLUMN_WIDTH as i64) as u32
}

pub fn is_valid_width(width: i64) -> bool {
    (MIN_COLUMN_WIDTH as i64..=MAX_COLUMN_WIDTH as i64).contains(&width)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Resizer {
    #[default]
    Idle,
    Dragging {
        key: String,
        start_x: f64,
        start_width: u32,
        live_width: u32,
    },
}

impl Resizer {
    pub fn begin(&mut self, key: &str, pointer_x: f64, current_width: u32) {
        *self = Self::Dragging {
            key: key.to_string(),
            start_x: pointer_x,
            start_width: current_width,
            live_width: current_width,
        };
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// Updates the live width; returns it when a drag is active.
    pub fn update(&mut self, pointer_x: f64) -> Option<u32> {
        match self {
            Self::Dragging {
                start_x,
                start_width,
                live_width,
                ..
            } => {
                *live_width = clamp_width(*start_width as f64 + (pointer_x - *start_x));
                Some(*live_width)
            }
            Self::Idle => None,
        }
    }

    /// Width to render for `key` while it is being dragged.
    pub fn live_width(&self, key: &str) -> Option<u32> {
        match self {
            Self::Dragging {
                key: dragging,
                live_width,
                ..
            } if dragging == key => Some(*live_width),
            _ => None,
        }
    }

    /// Ends the drag, yielding the column key and the width to commit.
    pub fn finish(&mut self) -> Option<(String, u32)> {
        match std::mem::take(self) {
            Self::Dragging {
                key, live_width, ..
            } => Some((key, live_width)),
            Self::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }
}

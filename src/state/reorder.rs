#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropZone {
    Before,
    After,
}

impl DropZone {
    /// Zone for a pointer `offset_x` pixels into a header `width` wide.
    pub fn from_offset(offset_x: f64, width: f64) -> Self {
        if offset_x < width / 2.0 {
            Self::Before
        } else {
            Self::After
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropTarget {
    pub position: usize,
    pub zone: DropZone,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Reorderer {
    #[default]
    Idle,
    Dragging {
        source: usize,
        target: Option<DropTarget>,
    },
}

impl Reorderer {
    pub fn begin(&mut self, source: usize) {
        *self = Self::Dragging {
            source,
            target: None,
        };
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    pub fn source(&self) -> Option<usize> {
        match self {
            Self::Dragging { source, .. } => Some(*source),
            Self::Idle => None,
        }
    }

    pub fn hover(&mut self, position: usize, offset_x: f64, width: f64) {
        if let Self::Dragging { target, .. } = self {
            *target = Some(DropTarget {
                position,
                zone: DropZone::from_offset(offset_x, width),
            });
        }
    }

    pub fn highlight(&self, position: usize) -> Option<DropZone> {
        match self {
            Self::Dragging {
                source,
                target: Some(target),
            } if target.position == position && *source != position => Some(target.zone),
            _ => None,
        }
    }

    /// Ends the drag, yielding `(from, to)` display positions for a
    /// remove-then-insert move. Dropping onto the same slot yields `None`.
    pub fn finish(&mut self) -> Option<(usize, usize)> {
        let Self::Dragging {
            source,
            target: Some(target),
        } = std::mem::take(self)
        else {
            return None;
        };
        if target.position == source {
            return None;
        }

        let to = match (target.zone, source < target.position) {
            (DropZone::Before, true) => target.position - 1,
            (DropZone::Before, false) => target.position,
            (DropZone::After, true) => target.position,
            (DropZone::After, false) => target.position + 1,
        };
        (to != source).then_some((source, to))
    }

    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }
}

/// Moves visible position `from` to visible position `to` within the full
/// `order`; hidden columns keep their relative place.
pub fn move_in_order(order: &[usize], visible: &[usize], from: usize, to: usize) -> Vec<usize> {
    let mut out = order.to_vec();
    if from >= visible.len() || to >= visible.len() || from == to {
        return out;
    }

    let moving = visible[from];
    let anchor = visible[to];
    out.retain(|idx| *idx != moving);
    let Some(anchor_pos) = out.iter().position(|idx| *idx == anchor) else {
        return order.to_vec();
    };
    let insert_at = if from < to { anchor_pos + 1 } else { anchor_pos };
    out.insert(insert_at, moving);
    out
}

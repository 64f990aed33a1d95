//! Bulk state transitions over credit control lines.

use tracing::info;
use uuid::Uuid;

use crate::control::{ControlBook, LineState};
use crate::errors::ControlError;

use super::ServiceResult;

pub struct MarkerService;

impl MarkerService {
    /// Moves every line in `ids` to `target`. The whole selection is
    /// validated before anything is touched, so an unknown id changes
    /// nothing. Returns how many lines actually changed state; applying
    /// the same marker twice leaves the book as it was.
    pub fn mark_lines(
        book: &mut ControlBook,
        target: LineState,
        ids: &[Uuid],
    ) -> ServiceResult<usize> {
        for id in ids {
            if book.line(*id).is_none() {
                return Err(ControlError::InvalidRef(format!("unknown line {id}")).into());
            }
        }

        let mut changed = 0usize;
        for id in ids {
            if let Some(line) = book.line_mut(*id) {
                if line.state != target {
                    line.state = target;
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            book.touch();
        }
        info!(state = target.name(), changed, total = ids.len(), "marked lines");
        Ok(changed)
    }
}

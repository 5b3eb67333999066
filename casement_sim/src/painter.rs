// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A painter that remembers what it was asked to paint.

use std::cell::RefCell;
use std::rc::Rc;

use casement_core::error::PaintError;
use casement_core::geometry::Rect;
use casement_core::paint::Painter;

/// Records every dirty rectangle it receives. Clones share the record.
#[derive(Clone, Debug, Default)]
pub struct RecordingPainter {
    paints: Rc<RefCell<Vec<Rect>>>,
    fail_next: Rc<RefCell<bool>>,
}

impl RecordingPainter {
    /// Creates a painter with an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rectangles painted so far, oldest first.
    #[must_use]
    pub fn paints(&self) -> Vec<Rect> {
        self.paints.borrow().clone()
    }

    /// Forgets the record.
    pub fn clear(&self) {
        self.paints.borrow_mut().clear();
    }

    /// Makes the next paint fail after recording it.
    pub fn fail_next(&self) {
        *self.fail_next.borrow_mut() = true;
    }
}

impl Painter for RecordingPainter {
    fn paint(&mut self, dirty: Rect) -> Result<(), PaintError> {
        self.paints.borrow_mut().push(dirty);
        if self.fail_next.replace(false) {
            return Err(PaintError::new("scripted paint failure"));
        }
        Ok(())
    }
}

//! The calendar as a mounted component.
//!
//! Mounting attaches a pointer-release listener to the viewport; dropping the
//! widget detaches it again.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use super::selector::DateRangeSelector;
use super::viewport::{Subscription, Viewport};
use super::{CalendarDay, GRID_CELLS};

/// Pointer input addressed to a grid cell by index (0..42, row-major).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    PointerDown(usize),
    PointerOver(usize),
    Click(usize),
}

pub struct CalendarWidget {
    selector: Rc<RefCell<DateRangeSelector>>,
    _release: Subscription,
}

impl CalendarWidget {
    /// Mount `selector` on `viewport`.
    ///
    /// The range listener runs while the selector is borrowed, so it must not
    /// call back into the widget.
    pub fn mount(viewport: &Viewport, selector: DateRangeSelector) -> Self {
        let selector = Rc::new(RefCell::new(selector));
        let weak = Rc::downgrade(&selector);

        let release = viewport.on_pointer_up(move |_| {
            let Some(selector) = weak.upgrade() else {
                return;
            };
            let mut selector = selector.borrow_mut();
            if selector.is_dragging() {
                selector.end_drag();
            }
        });

        Self {
            selector,
            _release: release,
        }
    }

    pub fn selector(&self) -> Ref<'_, DateRangeSelector> {
        self.selector.borrow()
    }

    pub fn days(&self) -> Vec<CalendarDay> {
        self.selector.borrow().days()
    }

    /// Index of the cell showing `date`, if it is on screen.
    pub fn cell_of(&self, date: chrono::NaiveDate) -> Option<usize> {
        self.days().iter().position(|d| d.full_date == date)
    }

    pub fn prev_month(&self) {
        self.selector.borrow_mut().prev_month();
    }

    pub fn next_month(&self) {
        self.selector.borrow_mut().next_month();
    }

    /// Route a grid event to the selector. Indices outside the grid are ignored.
    pub fn handle(&self, event: GridEvent) {
        let index = match event {
            GridEvent::PointerDown(i) | GridEvent::PointerOver(i) | GridEvent::Click(i) => i,
        };
        if index >= GRID_CELLS {
            return;
        }

        let mut selector = self.selector.borrow_mut();
        let Some(cell) = selector.days().get(index).copied() else {
            return;
        };

        match event {
            GridEvent::PointerDown(_) => selector.start_drag(cell.full_date),
            GridEvent::PointerOver(_) => selector.continue_drag(cell.full_date),
            GridEvent::Click(_) => selector.click(&cell),
        }
    }
}

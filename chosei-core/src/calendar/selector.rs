//! Drag-to-select state machine for the calendar grid.

use chrono::{Local, NaiveDate};
use tracing::debug;

use super::date_range::{CalendarDate, DateRange, SelectedRange};
use super::{CalendarDay, MonthPlacement, VisibleMonth, compute_visible_days};

/// Callback receiving the finalized range when a drag ends.
pub type RangeListener = Box<dyn FnMut(SelectedRange)>;

/// Selection state behind the calendar widget.
///
/// A drag starts on pointer-down, extends while the pointer moves over other
/// cells and ends on pointer release. The day the drag started on is the
/// anchor: moving past it in the other direction flips which bound it is.
pub struct DateRangeSelector {
    visible_month: VisibleMonth,
    today: NaiveDate,
    dragging: bool,
    anchor: Option<NaiveDate>,
    range: DateRange,
    listener: Option<RangeListener>,
}

impl DateRangeSelector {
    pub fn new(visible_month: VisibleMonth, today: NaiveDate) -> Self {
        Self {
            visible_month,
            today,
            dragging: false,
            anchor: None,
            range: DateRange::empty(),
            listener: None,
        }
    }

    /// Register the listener notified when a drag finishes.
    pub fn on_range_selected(&mut self, listener: impl FnMut(SelectedRange) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn visible_month(&self) -> VisibleMonth {
        self.visible_month
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// The 42 cells for the visible month.
    pub fn days(&self) -> Vec<CalendarDay> {
        compute_visible_days(self.visible_month, self.today)
    }

    pub fn prev_month(&mut self) {
        self.visible_month = self.visible_month.prev();
    }

    pub fn next_month(&mut self) {
        self.visible_month = self.visible_month.next();
    }

    pub fn start_drag(&mut self, day: NaiveDate) {
        self.dragging = true;
        self.anchor = Some(day);
        self.range = DateRange::single(day);
    }

    /// Extend the drag to `day`. Does nothing unless a drag is in progress.
    pub fn continue_drag(&mut self, day: NaiveDate) {
        if !self.dragging {
            return;
        }
        if let Some(anchor) = self.anchor {
            self.range = DateRange::spanning(anchor, day);
        }
    }

    /// Finish the drag and report the range.
    ///
    /// The listener fires at most once per drag: a second call without an
    /// intervening `start_drag` is a no-op.
    pub fn end_drag(&mut self) -> Option<SelectedRange> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;

        let selected = self.range.finalized()?;
        debug!(
            start = %selected.start,
            end = %selected.end,
            days = selected.days(),
            "Selected date range"
        );

        if let Some(listener) = self.listener.as_mut() {
            listener(selected);
        }
        Some(selected)
    }

    /// Handle a click on a grid cell.
    ///
    /// Out-of-month cells navigate to their month, unless a drag is in
    /// progress, in which case the click extends the drag instead.
    pub fn click(&mut self, cell: &CalendarDay) {
        match cell.placement {
            MonthPlacement::Current => {}
            _ if self.dragging => self.continue_drag(cell.full_date),
            MonthPlacement::Previous => self.prev_month(),
            MonthPlacement::Next => self.next_month(),
        }
    }

    pub fn is_in_range(&self, probe: &impl CalendarDate) -> bool {
        self.range.contains(probe)
    }
}

impl Default for DateRangeSelector {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self::new(VisibleMonth::containing(today), today)
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use chosei_core::calendar::{
    CalendarWidget, DateRangeSelector, GridEvent, PointerRelease, SelectedRange, Viewport,
    VisibleMonth,
};
use chrono::{Local, NaiveDate};
use tracing::info;

use crate::render::Render;

pub type SelectionSink = Rc<RefCell<Option<SelectedRange>>>;

pub fn run(month: Option<VisibleMonth>, from: Option<NaiveDate>, over: Vec<NaiveDate>) -> Result<()> {
    let month = month
        .or_else(|| from.map(VisibleMonth::containing))
        .unwrap_or_else(VisibleMonth::current);

    let viewport = Viewport::new();
    let (widget, _selected) = mount_calendar(&viewport, month, Local::now().date_naive());

    if let Some(from) = from {
        drag(&widget, &viewport, from, &over)?;
    }

    println!("{}", widget.selector().render());
    Ok(())
}

/// Mount a calendar whose finished selections land in the returned sink.
pub fn mount_calendar(
    viewport: &Viewport,
    month: VisibleMonth,
    today: NaiveDate,
) -> (CalendarWidget, SelectionSink) {
    let selected: SelectionSink = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&selected);

    let mut selector = DateRangeSelector::new(month, today);
    selector.on_range_selected(move |range| {
        info!(%range, days = range.days(), "Date range selected");
        *sink.borrow_mut() = Some(range);
    });

    (CalendarWidget::mount(viewport, selector), selected)
}

/// Press on `from`, move over each day in `over`, then release outside the grid.
pub fn drag(
    widget: &CalendarWidget,
    viewport: &Viewport,
    from: NaiveDate,
    over: &[NaiveDate],
) -> Result<()> {
    let cell = |date: NaiveDate| {
        widget.cell_of(date).ok_or_else(|| {
            anyhow::anyhow!(
                "{} is not shown in {}",
                date,
                widget.selector().visible_month().title()
            )
        })
    };

    let start = cell(from)?;
    let cells = over.iter().map(|&day| cell(day)).collect::<Result<Vec<_>>>()?;

    widget.handle(GridEvent::PointerDown(start));
    for index in cells {
        widget.handle(GridEvent::PointerOver(index));
    }
    viewport.release_pointer(PointerRelease::outside());
    Ok(())
}

/// A day of `month` ("15") or a full date ("2025-03-15").
pub fn parse_day(input: &str, month: VisibleMonth) -> Option<NaiveDate> {
    let input = input.trim();
    match input.parse::<u32>() {
        Ok(day) => NaiveDate::from_ymd_opt(month.year(), month.month(), day),
        Err(_) => NaiveDate::parse_from_str(input, "%Y-%m-%d").ok(),
    }
}

//! Scrollable reminder and event lists.

use embedded_graphics::{
    mono_font::{ascii, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::Rectangle,
    text::Text,
};
use embedded_text::{alignment::HorizontalAlignment, style::TextBoxStyleBuilder, TextBox};

use super::ScrollDirection;
use crate::record::{RecordKind, ReminderRecord};

/// Events shown per page.
pub const EVENTS_PER_PAGE: usize = 3;

const PADDING: i32 = 6;

/// A record list with a cursor. The cursor is always a valid index, or the
/// list is empty.
#[derive(Debug, Clone)]
pub struct RecordList {
    kind: RecordKind,
    items: Vec<ReminderRecord>,
    cursor: usize,
}

impl RecordList {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            cursor: 0,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn items(&self) -> &[ReminderRecord] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the whole list and reset the cursor.
    pub fn replace(&mut self, items: Vec<ReminderRecord>) {
        self.items = items;
        self.cursor = 0;
    }

    /// Move the cursor to `index`, clamped into range.
    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index.min(self.items.len().saturating_sub(1));
    }

    /// Move the cursor by one. Returns whether it moved.
    pub fn scroll(&mut self, direction: ScrollDirection) -> bool {
        if self.items.is_empty() {
            return false;
        }
        let last = self.items.len() - 1;
        let next = match direction {
            ScrollDirection::Up => self.cursor.saturating_sub(1),
            ScrollDirection::Down => (self.cursor + 1).min(last),
        };
        let moved = next != self.cursor;
        self.cursor = next;
        moved
    }

    pub fn render<D: DrawTarget<Color = BinaryColor>>(&self, display: &mut D) -> Result<(), D::Error> {
        display.clear(BinaryColor::Off)?;
        match self.kind {
            RecordKind::Reminder => self.render_reminder(display),
            RecordKind::Event => self.render_events(display),
        }
    }

    fn render_empty<D: DrawTarget<Color = BinaryColor>>(
        &self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let style = MonoTextStyle::new(&ascii::FONT_10X20, BinaryColor::On);
        let text = match self.kind {
            RecordKind::Reminder => "NO REMINDERS",
            RecordKind::Event => "NO EVENTS",
        };
        Text::new(text, Point::new(PADDING, 24), style).draw(display)?;
        Ok(())
    }

    fn render_reminder<D: DrawTarget<Color = BinaryColor>>(
        &self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let Some(reminder) = self.items.get(self.cursor) else {
            return self.render_empty(display);
        };
        let width = display.bounding_box().size.width;
        let height = display.bounding_box().size.height as i32;

        let header_style = MonoTextStyle::new(&ascii::FONT_9X15_BOLD, BinaryColor::On);
        let header = format!("Reminder {}/{}", self.cursor + 1, self.items.len());
        Text::new(&header, Point::new(PADDING, 14), header_style).draw(display)?;

        let title_style = MonoTextStyle::new(&ascii::FONT_10X20, BinaryColor::On);
        let bounds = Rectangle::new(
            Point::new(PADDING, 22),
            Size::new(width.saturating_sub(2 * PADDING as u32), 60),
        );
        let textbox_style = TextBoxStyleBuilder::new()
            .alignment(HorizontalAlignment::Left)
            .build();
        TextBox::with_textbox_style(&reminder.title, bounds, title_style, textbox_style)
            .draw(display)?;

        let detail_style = MonoTextStyle::new(&ascii::FONT_7X13, BinaryColor::On);
        Text::new(&reminder.time, Point::new(PADDING, height - 22), detail_style).draw(display)?;
        Text::new(&reminder.date, Point::new(PADDING, height - 6), detail_style).draw(display)?;
        Ok(())
    }

    fn render_events<D: DrawTarget<Color = BinaryColor>>(
        &self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let Some(first) = self.items.first() else {
            return self.render_empty(display);
        };
        let width = display.bounding_box().size.width as i32;

        let header_style = MonoTextStyle::new(&ascii::FONT_9X15_BOLD, BinaryColor::On);
        let header = format!("Events ({})", strip_year(&first.date));
        Text::new(&header, Point::new(PADDING, 14), header_style).draw(display)?;

        let page = self.cursor / EVENTS_PER_PAGE;
        let pages = self.items.len().div_ceil(EVENTS_PER_PAGE);
        let page_label = format!("{}/{}", page + 1, pages);
        Text::new(
            &page_label,
            Point::new(width - PADDING - 9 * page_label.len() as i32, 14),
            header_style,
        )
        .draw(display)?;

        let time_style = MonoTextStyle::new(&ascii::FONT_6X10, BinaryColor::On);
        let title_style = MonoTextStyle::new(&ascii::FONT_7X13, BinaryColor::On);
        let mut y = 34;
        for (offset, event) in self
            .items
            .iter()
            .skip(page * EVENTS_PER_PAGE)
            .take(EVENTS_PER_PAGE)
            .enumerate()
        {
            let marker = if page * EVENTS_PER_PAGE + offset == self.cursor {
                ">"
            } else {
                " "
            };
            Text::new(marker, Point::new(PADDING, y + 12), title_style).draw(display)?;
            Text::new(&event.time, Point::new(width / 3, y), time_style).draw(display)?;
            Text::new(&event.title, Point::new(PADDING + 10, y + 12), title_style)
                .draw(display)?;
            y += 31;
        }
        Ok(())
    }
}

/// `2024-05-01` style dates lose their year; anything else is kept.
fn strip_year(date: &str) -> &str {
    match date.split_once('-') {
        Some((year, rest)) if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) => rest,
        _ => date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_display::TestDisplay;

    fn events(n: usize) -> RecordList {
        let mut list = RecordList::new(RecordKind::Event);
        list.replace(
            (0..n)
                .map(|i| ReminderRecord {
                    title: format!("Event {}", i),
                    date: "2024-05-01".to_string(),
                    time: format!("{:02}:00", 8 + i),
                    kind: RecordKind::Event,
                })
                .collect(),
        );
        list
    }

    #[test]
    fn cursor_stays_in_range() {
        let mut list = events(3);
        assert!(!list.scroll(ScrollDirection::Up));
        assert_eq!(list.cursor(), 0);
        assert!(list.scroll(ScrollDirection::Down));
        assert!(list.scroll(ScrollDirection::Down));
        assert!(!list.scroll(ScrollDirection::Down));
        assert_eq!(list.cursor(), 2);
        assert!(list.scroll(ScrollDirection::Up));
        assert_eq!(list.cursor(), 1);
    }

    #[test]
    fn empty_list_does_not_scroll() {
        let mut list = RecordList::new(RecordKind::Reminder);
        assert!(!list.scroll(ScrollDirection::Down));
        assert!(!list.scroll(ScrollDirection::Up));
        assert_eq!(list.cursor(), 0);
    }

    #[test]
    fn replace_resets_cursor() {
        let mut list = events(5);
        list.set_cursor(4);
        list.replace(events(2).items().to_vec());
        assert_eq!(list.cursor(), 0);
    }

    #[test]
    fn set_cursor_clamps() {
        let mut list = events(5);
        list.set_cursor(40);
        assert_eq!(list.cursor(), 4);
    }

    #[test]
    fn strip_year_only_removes_leading_year() {
        assert_eq!(strip_year("2024-05-01"), "05-01");
        assert_eq!(strip_year("May 1"), "May 1");
        assert_eq!(strip_year("05-01-2024"), "05-01-2024");
    }

    #[test]
    fn lists_render_with_and_without_items() {
        let mut display = TestDisplay::default_size();
        events(5).render(&mut display).unwrap();
        assert!(display.black_pixels() > 0);

        let mut display = TestDisplay::default_size();
        RecordList::new(RecordKind::Reminder)
            .render(&mut display)
            .unwrap();
        assert!(display.black_pixels() > 0);
    }
}

//! Home screens: boot splash, status summary and the analog clock.

use core::f32::consts::TAU;

use chrono::{NaiveDateTime, Timelike};
use embedded_graphics::{
    mono_font::{ascii, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle},
    text::Text,
};

use super::ScrollDirection;
use crate::weather::WeatherReport;

/// Placeholder until the first weather report arrives.
pub const NO_WEATHER: &str = "--F -------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainScreen {
    /// Shown only while startup runs.
    Boot,
    Status,
    Clock,
}

impl MainScreen {
    fn index(self) -> Option<usize> {
        match self {
            Self::Boot => None,
            Self::Status => Some(0),
            Self::Clock => Some(1),
        }
    }
}

const SCREEN_COUNT: usize = 2;

/// Counts shown on the status screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub reminders: usize,
    pub events: usize,
}

#[derive(Debug, Clone)]
pub struct MainView {
    screen: MainScreen,
    weather: Option<WeatherReport>,
}

impl MainView {
    pub fn new() -> Self {
        Self {
            screen: MainScreen::Boot,
            weather: None,
        }
    }

    pub fn screen(&self) -> MainScreen {
        self.screen
    }

    pub fn select(&mut self, screen: MainScreen) {
        self.screen = screen;
    }

    pub fn weather(&self) -> Option<&WeatherReport> {
        self.weather.as_ref()
    }

    pub fn set_weather(&mut self, report: WeatherReport) {
        self.weather = Some(report);
    }

    /// Cycle between status and clock. Always changes the screen.
    pub fn scroll(&mut self, _direction: ScrollDirection) -> bool {
        self.screen = match self.screen {
            MainScreen::Boot | MainScreen::Clock => MainScreen::Status,
            MainScreen::Status => MainScreen::Clock,
        };
        true
    }

    pub fn weather_line(&self) -> String {
        self.weather
            .as_ref()
            .map(WeatherReport::summary)
            .unwrap_or_else(|| NO_WEATHER.to_string())
    }

    pub fn render<D: DrawTarget<Color = BinaryColor>>(
        &self,
        display: &mut D,
        counts: StatusCounts,
        now: Option<NaiveDateTime>,
    ) -> Result<(), D::Error> {
        display.clear(BinaryColor::Off)?;
        match self.screen {
            MainScreen::Boot => self.render_boot(display),
            MainScreen::Status => {
                self.render_status(display, counts)?;
                self.render_side_labels(display)
            }
            MainScreen::Clock => {
                self.render_clock(display, now)?;
                self.render_side_labels(display)
            }
        }
    }

    fn render_boot<D: DrawTarget<Color = BinaryColor>>(&self, display: &mut D) -> Result<(), D::Error> {
        let style = MonoTextStyle::new(&ascii::FONT_10X20, BinaryColor::On);
        Text::new("Starting panel....", Point::new(8, 30), style).draw(display)?;
        Ok(())
    }

    fn render_status<D: DrawTarget<Color = BinaryColor>>(
        &self,
        display: &mut D,
        counts: StatusCounts,
    ) -> Result<(), D::Error> {
        let width = display.bounding_box().size.width as i32;
        let style = MonoTextStyle::new(&ascii::FONT_10X20, BinaryColor::On);
        Text::new("Welcome! You Have:", Point::new(width / 8, 24), style).draw(display)?;
        let events = format!("{} Events", counts.events);
        Text::new(&events, Point::new(width / 4, 50), style).draw(display)?;
        let reminders = format!("{} Reminders", counts.reminders);
        Text::new(&reminders, Point::new(width / 4, 76), style).draw(display)?;
        Ok(())
    }

    fn render_clock<D: DrawTarget<Color = BinaryColor>>(
        &self,
        display: &mut D,
        now: Option<NaiveDateTime>,
    ) -> Result<(), D::Error> {
        let size = display.bounding_box().size;
        let (width, height) = (size.width as i32, size.height as i32);
        let center = Point::new(width / 4 - 12, height / 2 - 8);
        let radius = height * 2 / 5;

        let Some(now) = now else {
            log::error!("Wall clock not set");
            return draw_dial(display, center, radius, 6, 0);
        };
        draw_dial(display, center, radius, now.hour(), now.minute())?;

        let date_style = MonoTextStyle::new(&ascii::FONT_9X15, BinaryColor::On);
        let date = now.format("%-m-%-d-%Y").to_string();
        Text::new(&date, Point::new(width / 2 - 16, height / 4), date_style).draw(display)?;

        let time_style = MonoTextStyle::new(&ascii::FONT_10X20, BinaryColor::On);
        let time = now.format("%-H : %M").to_string();
        Text::new(&time, Point::new(width / 2 + 8, height / 2), time_style).draw(display)?;

        let weather_style = MonoTextStyle::new(&ascii::FONT_7X13, BinaryColor::On);
        Text::new(
            &self.weather_line(),
            Point::new(width / 3 + 24, height / 2 + 24),
            weather_style,
        )
        .draw(display)?;
        Ok(())
    }

    fn render_side_labels<D: DrawTarget<Color = BinaryColor>>(
        &self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let size = display.bounding_box().size;
        let (width, height) = (size.width as i32, size.height as i32);

        let bold = MonoTextStyle::new(&ascii::FONT_7X13_BOLD, BinaryColor::On);
        let faint = MonoTextStyle::new(&ascii::FONT_5X8, BinaryColor::On);
        for i in 0..SCREEN_COUNT {
            let style = if self.screen.index() == Some(i) {
                bold
            } else {
                faint
            };
            let label = i.to_string();
            Text::new(&label, Point::new(width - 14, 14 + 14 * i as i32), style).draw(display)?;
        }

        let labels = MonoTextStyle::new(&ascii::FONT_6X10, BinaryColor::On);
        Text::new("Reminders", Point::new(6, height - 4), labels).draw(display)?;
        Text::new("Events", Point::new(width / 2 - 24, height - 4), labels).draw(display)?;
        Text::new("Home", Point::new(width - 36, height - 4), labels).draw(display)?;
        Ok(())
    }
}

impl Default for MainView {
    fn default() -> Self {
        Self::new()
    }
}

/// Analog dial: twelve tick marks plus hour and minute hands.
fn draw_dial<D: DrawTarget<Color = BinaryColor>>(
    display: &mut D,
    center: Point,
    radius: i32,
    hour: u32,
    minute: u32,
) -> Result<(), D::Error> {
    let hand = PrimitiveStyle::with_stroke(BinaryColor::On, 2);
    let tick = PrimitiveStyle::with_fill(BinaryColor::On);
    let at = |angle: f32, len: f32| {
        center + Point::new((angle.sin() * len) as i32, -(angle.cos() * len) as i32)
    };

    for i in 0..12 {
        let angle = i as f32 / 12.0 * TAU;
        Circle::with_center(at(angle, radius as f32), 3)
            .into_styled(tick)
            .draw(display)?;
    }

    let hour_angle = ((hour % 12) as f32 + minute as f32 / 60.0) / 12.0 * TAU;
    Line::new(center, at(hour_angle, radius as f32 * 0.6))
        .into_styled(hand)
        .draw(display)?;

    let minute_angle = minute as f32 / 60.0 * TAU;
    Line::new(center, at(minute_angle, radius as f32 * 0.9))
        .into_styled(hand)
        .draw(display)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_display::TestDisplay;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 5, 0))
            .unwrap()
    }

    #[test]
    fn scroll_cycles_status_and_clock() {
        let mut view = MainView::new();
        assert_eq!(view.screen(), MainScreen::Boot);
        assert!(view.scroll(ScrollDirection::Down));
        assert_eq!(view.screen(), MainScreen::Status);
        assert!(view.scroll(ScrollDirection::Down));
        assert_eq!(view.screen(), MainScreen::Clock);
        assert!(view.scroll(ScrollDirection::Up));
        assert_eq!(view.screen(), MainScreen::Status);
    }

    #[test]
    fn weather_placeholder_until_report() {
        let mut view = MainView::new();
        assert_eq!(view.weather_line(), NO_WEATHER);
        view.set_weather(WeatherReport {
            temp: 58.04,
            temp_min: 50.0,
            temp_max: 61.0,
            description: "fog".to_string(),
            location: "SF".to_string(),
        });
        assert_eq!(view.weather_line(), "58.0F fog");
    }

    #[test]
    fn every_screen_renders() {
        let mut view = MainView::new();
        for screen in [MainScreen::Boot, MainScreen::Status, MainScreen::Clock] {
            view.select(screen);
            let mut display = TestDisplay::default_size();
            view.render(&mut display, StatusCounts::default(), Some(noon()))
                .unwrap();
            assert!(display.black_pixels() > 0, "{:?} drew nothing", screen);
        }
    }

    #[test]
    fn clock_without_time_still_draws_dial() {
        let mut view = MainView::new();
        view.select(MainScreen::Clock);
        let mut display = TestDisplay::default_size();
        view.render(&mut display, StatusCounts::default(), None)
            .unwrap();
        assert!(display.black_pixels() > 0);
    }
}

use chrono::NaiveDate;
use inkpanel_core::config::{BOOT_BLINKS, CLOCK_GRACE_TICKS, NEW_CONTENT_BLINKS};
use inkpanel_core::views::NO_WEATHER;
use inkpanel_core::{ContentView, MainScreen, WeatherError, WeatherReport};
use inkpanel_scenario_harness::ScenarioHarness;

fn setup_harness() -> ScenarioHarness {
    let mut harness = ScenarioHarness::new();
    harness.set_time(
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|date| date.and_hms_opt(7, 45, 0))
            .unwrap(),
    );
    harness.boot();
    harness
}

fn report(description: &str) -> WeatherReport {
    WeatherReport {
        temp: 54.26,
        temp_min: 50.0,
        temp_max: 60.0,
        description: description.to_string(),
        location: "Oakland".to_string(),
    }
}

#[test]
fn idle_panel_switches_to_clock_on_tick() {
    let mut harness = setup_harness();
    let updates = harness.display().update_count();

    assert!(harness.clock_tick());

    assert_eq!(harness.current_view(), ContentView::Main(MainScreen::Clock));
    assert_eq!(harness.display().update_count(), updates + 1);
    assert!(harness.display().black_pixels() > 0);
}

#[test]
fn new_content_holds_off_clock_for_grace_ticks() {
    let mut harness = setup_harness();
    harness.submit(r#"{"message": "Pick up parcel"}"#).unwrap();
    harness.pump_until_idle();

    for _ in 0..CLOCK_GRACE_TICKS {
        harness.clock_tick();
        assert_eq!(harness.current_view(), ContentView::Message("Pick up parcel"));
    }
    harness.clock_tick();
    assert_eq!(harness.current_view(), ContentView::Main(MainScreen::Clock));
}

#[test]
fn browsing_a_list_renews_the_grace_period() {
    let mut harness = setup_harness();
    harness
        .submit(r#"{"reminders":[{"title":"Pay rent","date":"2024-05-01","time":"09:00"}]}"#)
        .unwrap();
    harness.pump_until_idle();

    harness.clock_tick();
    harness.press_and_settle(inkpanel_core::ButtonId::A);
    assert_eq!(harness.agent().skip_clock_ticks(), CLOCK_GRACE_TICKS);

    harness.clock_tick();
    assert!(matches!(
        harness.current_view(),
        ContentView::ReminderList { .. }
    ));
}

#[test]
fn grace_ticks_leave_weather_counter_untouched() {
    let mut harness = setup_harness();
    harness.submit(r#"{"message":"hi"}"#).unwrap();
    harness.pump_until_idle();
    assert_eq!(harness.agent().skip_clock_ticks(), CLOCK_GRACE_TICKS);

    for _ in 0..CLOCK_GRACE_TICKS {
        harness.clock_tick();
    }
    assert_eq!(harness.agent().skip_clock_ticks(), 0);
    assert_eq!(harness.agent().weather_poll_counter(), 0);

    // Only the ticks that reach the clock screen count towards a poll.
    for _ in 0..9 {
        harness.clock_tick();
    }
    assert_eq!(harness.agent().weather_poll_counter(), 9);
    assert_eq!(harness.weather().polls(), 0);

    harness.clock_tick();
    assert_eq!(harness.weather().polls(), 1);
    assert_eq!(harness.agent().weather_poll_counter(), 0);
}

#[test]
fn weather_is_polled_every_tenth_tick() {
    let mut harness = setup_harness();
    harness.weather().push(Err(WeatherError::Http("status 503".to_string())));
    harness.weather().push(Ok(report("light rain")));

    for _ in 0..9 {
        harness.clock_tick();
    }
    assert_eq!(harness.weather().polls(), 0);

    harness.clock_tick();
    assert_eq!(harness.weather().polls(), 1);
    assert_eq!(harness.views().main().weather_line(), NO_WEATHER);

    for _ in 0..10 {
        harness.clock_tick();
    }
    assert_eq!(harness.weather().polls(), 2);
    assert_eq!(harness.views().main().weather_line(), "54.3F light rain");
}

#[test]
fn boot_blink_runs_exact_toggle_count() {
    let mut harness = setup_harness();

    // One extra tick observes the finished sequence and cancels the timer.
    assert_eq!(harness.finish_blinking(), BOOT_BLINKS as usize + 1);

    let history = harness.led().history();
    assert_eq!(history.len(), BOOT_BLINKS as usize + 1);
    assert_eq!(history.last(), Some(&false));
    assert!(!harness.timers().is_active(inkpanel_core::agent::BLINK_TIMER));
    assert!(!harness.agent().is_blinking());
}

#[test]
fn new_content_blinks_and_restarts_running_sequence() {
    let mut harness = setup_harness();
    harness.blink_tick();
    harness.blink_tick();
    assert_eq!(harness.agent().blink_count(), 2);

    harness.submit(r#"{"message": "Dinner at 7"}"#).unwrap();
    harness.pump_until_idle();
    assert_eq!(harness.agent().blink_count(), 0);

    assert_eq!(harness.finish_blinking(), NEW_CONTENT_BLINKS as usize + 1);
    assert!(!harness.led().is_on());
}

#[test]
fn stray_blink_tick_after_cancel_is_harmless() {
    let mut harness = setup_harness();
    harness.finish_blinking();
    let history = harness.led().history();

    harness.handle().enqueue(inkpanel_core::Action::BlinkTick);
    harness.pump_until_idle();

    assert_eq!(harness.led().history(), history);
}

//! inkpanel firmware for the ESP32-S3 with a UC8151 2.9" panel.

mod gpio_edges;
mod led;
mod mqtt_router;
mod nvs_store;
mod panel_display;
mod runtime_diagnostics;
mod sntp_clock;
mod timers;
mod weather_service;
mod wifi;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::{AnyIOPin, IOPin, OutputPin, PinDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::spi::{config::Config, SpiDeviceDriver, SpiDriverConfig};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use inkpanel_core::{
    spawn_actor, ButtonId, ButtonMap, EdgeDemultiplexer, PanelAgent, PanelConfig, PanelParts,
    Polarity, SwitchBank,
};

use gpio_edges::GpioEdgeSource;
use led::GpioLed;
use mqtt_router::{MqttRouter, SubscribeFlag};
use nvs_store::NvsStore;
use panel_display::UcPanel;
use runtime_diagnostics::{check_main_stack, log_heap};
use sntp_clock::{SntpClock, DEFAULT_UTC_OFFSET_SECS};
use timers::{EspMonotonic, EspTimers};
use weather_service::{HttpWeather, WeatherQuery};
use wifi::{WifiCredentials, WifiStation};

const REQUIRED_STACK_SIZE: u32 = 16 * 1024;
const SUPERVISE_PERIOD: Duration = Duration::from_secs(3);
/// Heap stats every 20 supervision passes (one minute).
const HEAP_LOG_PASSES: u32 = 20;

const PANEL_ID_KEY: &str = "PANEL_ID";
const BROKER_KEY: &str = "MQTT_URL";

const PIN_UP: u8 = 15;
const PIN_DOWN: u8 = 11;
const PIN_A: u8 = 12;
const PIN_B: u8 = 13;
const PIN_C: u8 = 14;

fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log_heap("startup");
    check_main_stack(REQUIRED_STACK_SIZE);

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let mut settings = NvsStore::open(nvs_partition.clone())?;
    let panel_id = settings.get_or_seed(PANEL_ID_KEY, option_env!("PANEL_ID").unwrap_or("1"))?;
    let broker = settings.get_or_seed(
        BROKER_KEY,
        option_env!("MQTT_URL").unwrap_or(mqtt_router::DEFAULT_BROKER),
    )?;
    let credentials = WifiCredentials::load(&mut settings).map_err(anyhow::Error::msg)?;

    let mut wifi = WifiStation::new(
        peripherals.modem,
        sys_loop.clone(),
        nvs_partition.clone(),
        credentials,
    )
    .map_err(anyhow::Error::msg)?;
    if let Err(err) = wifi.connect() {
        // The supervision loop keeps retrying.
        log::error!("Initial Wi-Fi connect failed: {}", err);
    }
    let _sntp = sntp_clock::start_sntp()?;
    log_heap("after_network");

    let spi_config = Config::default()
        .baudrate(Hertz(4_000_000))
        .data_mode(embedded_hal::spi::Mode {
            polarity: embedded_hal::spi::Polarity::IdleLow,
            phase: embedded_hal::spi::Phase::CaptureOnFirstTransition,
        });
    let spi = SpiDeviceDriver::new_single(
        peripherals.spi2,
        peripherals.pins.gpio18,
        peripherals.pins.gpio17,
        Option::<AnyIOPin>::None,
        Some(peripherals.pins.gpio10),
        &SpiDriverConfig::new(),
        &spi_config,
    )?;
    let dc = PinDriver::output(peripherals.pins.gpio9)?;
    let rst = PinDriver::output(peripherals.pins.gpio8)?;
    let busy = PinDriver::input(peripherals.pins.gpio7)?;
    let mut panel = UcPanel::new(spi, dc, rst, busy);
    panel.init().context("panel init")?;

    let buttons = ButtonMap::empty()
        .bind(ButtonId::Up, PIN_UP)
        .and_then(|map| map.bind(ButtonId::Down, PIN_DOWN))
        .and_then(|map| map.bind(ButtonId::A, PIN_A))
        .and_then(|map| map.bind(ButtonId::B, PIN_B))
        .and_then(|map| map.bind(ButtonId::C, PIN_C))?;
    let config = PanelConfig::new(buttons.clone());

    let mut agent = PanelAgent::new(
        config.clone(),
        PanelParts {
            panel,
            store: Box::new(NvsStore::open(nvs_partition)?),
            timers: Box::new(EspTimers::new()?),
            weather: Box::new(HttpWeather::new(WeatherQuery::from_build_env())),
            led: Box::new(GpioLed::new(peripherals.pins.gpio4.downgrade_output())?),
            clock: Arc::new(SntpClock::new(DEFAULT_UTC_OFFSET_SECS)),
        },
    );
    let handle = agent.handle();

    // Observers go in before the interrupts are armed.
    let switches = SwitchBank::new(
        &buttons,
        Polarity::ActiveLow,
        config.debounce,
        Arc::new(EspMonotonic),
        Arc::new(handle.clone()),
    );
    switches.register(EdgeDemultiplexer::global())?;
    let edges = GpioEdgeSource::new([
        (PIN_UP, peripherals.pins.gpio15.downgrade()),
        (PIN_DOWN, peripherals.pins.gpio11.downgrade()),
        (PIN_A, peripherals.pins.gpio12.downgrade()),
        (PIN_B, peripherals.pins.gpio13.downgrade()),
        (PIN_C, peripherals.pins.gpio14.downgrade()),
    ])?;
    log::info!("{} switches armed", edges.len());

    agent.start()?;
    let _agent = spawn_actor(agent)?;
    log_heap("after_agent_start");

    let topic = mqtt_router::request_topic(&panel_id);
    let client_id = option_env!("MQTT_CLIENT_ID")
        .map(str::to_string)
        .unwrap_or_else(|| format!("inkpanel-{}", panel_id));
    let (mut mqtt, connection) = mqtt_router::connect(&broker, &client_id)?;
    let subscribe = SubscribeFlag::default();
    let _router = spawn_actor(MqttRouter::new(connection, handle, subscribe.clone()))?;
    log::info!("Listening for payloads on {}", topic);

    let mut passes: u32 = 0;
    loop {
        thread::sleep(SUPERVISE_PERIOD);
        wifi.ensure_connected();
        mqtt_router::resubscribe(&mut mqtt, &topic, &subscribe);

        passes = passes.wrapping_add(1);
        if passes % HEAP_LOG_PASSES == 0 {
            log_heap("supervise");
        }
    }
}

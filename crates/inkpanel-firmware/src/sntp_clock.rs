//! Wall clock synchronised over SNTP.

use core::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};
use esp_idf_svc::sntp::{EspSntp, SntpConf};
use esp_idf_svc::sys::EspError;
use inkpanel_core::WallClock;

const SERVERS: [&str; 4] = [
    "0.uk.pool.ntp.org",
    "1.uk.pool.ntp.org",
    "2.uk.pool.ntp.org",
    "3.uk.pool.ntp.org",
];

/// Pacific daylight time.
pub const DEFAULT_UTC_OFFSET_SECS: i32 = -7 * 3600;

// Latched on the first completed sync; the IDF status resets after reads.
static SYNCED: AtomicBool = AtomicBool::new(false);

/// Start background synchronisation. Keep the returned service alive.
pub fn start_sntp() -> Result<EspSntp<'static>, EspError> {
    let conf = SntpConf {
        servers: SERVERS,
        ..Default::default()
    };
    let sntp = EspSntp::new_with_callback(&conf, |_| {
        if !SYNCED.swap(true, Ordering::Relaxed) {
            log::info!("SNTP time synchronised");
        }
    })?;
    log::info!("SNTP started");
    Ok(sntp)
}

/// Local time at a fixed UTC offset. `None` until SNTP has synchronised.
pub struct SntpClock {
    offset: FixedOffset,
}

impl SntpClock {
    pub fn new(offset_secs: i32) -> Self {
        let offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| {
            log::warn!("Invalid UTC offset {}s, using UTC", offset_secs);
            Utc.fix()
        });
        Self { offset }
    }
}

impl WallClock for SntpClock {
    fn now(&self) -> Option<NaiveDateTime> {
        if !SYNCED.load(Ordering::Relaxed) {
            return None;
        }
        let now: DateTime<Utc> = std::time::SystemTime::now().into();
        Some(now.with_timezone(&self.offset).naive_local())
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Build-time settings baked in with `option_env!`.
const CONFIG_VARS: [&str; 7] = [
    "WIFI_SSID",
    "WIFI_PASS",
    "MQTT_URL",
    "MQTT_CLIENT_ID",
    "WEATHER_API_KEY",
    "WEATHER_LAT",
    "WEATHER_LON",
];

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let sdkconfig_defaults = PathBuf::from(&manifest_dir).join("sdkconfig.defaults");

    println!("cargo:rerun-if-changed=sdkconfig.defaults");
    for var in CONFIG_VARS {
        println!("cargo:rerun-if-env-changed={}", var);
        if env::var(var).is_err() {
            eprintln!("NOTE: {} not set at build time", var);
        }
    }

    if env::var("ESP_IDF_SDKCONFIG_DEFAULTS").is_err() {
        eprintln!("WARNING: ESP_IDF_SDKCONFIG_DEFAULTS not set! Stack size may be wrong.");
        eprintln!("Build from crates/inkpanel-firmware so .cargo/config.toml applies.");
    }

    // A cached sdkconfig older than sdkconfig.defaults must be regenerated.
    let target_dir = PathBuf::from(&manifest_dir).join("target");
    if let Ok(entries) = fs::read_dir(&target_dir) {
        for entry in entries.flatten() {
            let build_dir = entry.path().join("build");
            if let Ok(build_entries) = fs::read_dir(&build_dir) {
                for build_entry in build_entries.flatten() {
                    let build_path = build_entry.path();
                    if build_path.to_string_lossy().contains("esp-idf-sys") {
                        invalidate_stale_sdkconfig(&build_path, &sdkconfig_defaults);
                    }
                }
            }
        }
    }

    embuild::espidf::sysenv::output();
}

fn invalidate_stale_sdkconfig(build_path: &Path, defaults: &Path) {
    let sdkconfig = build_path.join("out/esp-idf/sdkconfig");
    let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
    if let (Some(sdk_time), Some(defaults_time)) = (modified(&sdkconfig), modified(defaults)) {
        if defaults_time > sdk_time {
            eprintln!("sdkconfig.defaults changed! Forcing regeneration...");
            let _ = fs::remove_file(&sdkconfig);
            let _ = fs::remove_dir_all(build_path.join("out/esp-idf/sdkconfig.d"));
        }
    }
}

//! Wi-Fi station bring-up and link supervision.

use core::convert::TryInto;

use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use crate::nvs_store::NvsStore;

const SSID_KEY: &str = "SSID";
const PASSWORD_KEY: &str = "PASSWORD";

#[derive(Debug, Clone)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl WifiCredentials {
    /// Read credentials from NVS, seeding them from the build config on
    /// first boot.
    pub fn load(store: &mut NvsStore) -> Result<Self, String> {
        let ssid = store
            .get_or_seed(SSID_KEY, option_env!("WIFI_SSID").unwrap_or(""))
            .map_err(|err| format!("wifi ssid: {}", err))?;
        let password = store
            .get_or_seed(PASSWORD_KEY, option_env!("WIFI_PASS").unwrap_or(""))
            .map_err(|err| format!("wifi password: {}", err))?;
        log::info!("Wi-Fi SSID = {}", ssid);
        Ok(Self { ssid, password })
    }
}

pub struct WifiStation {
    wifi: BlockingWifi<EspWifi<'static>>,
    credentials: WifiCredentials,
}

impl WifiStation {
    pub fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        credentials: WifiCredentials,
    ) -> Result<Self, String> {
        let esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs))
            .map_err(|err| format!("wifi init failed: {}", err))?;
        let wifi = BlockingWifi::wrap(esp_wifi, sys_loop)
            .map_err(|err| format!("wifi wrapper init failed: {}", err))?;
        Ok(Self { wifi, credentials })
    }

    /// Configure, start and join. Blocks until the netif is up.
    pub fn connect(&mut self) -> Result<(), String> {
        let ssid = self.credentials.ssid.trim();
        if ssid.is_empty() {
            return Err(String::from("STA SSID is empty"));
        }
        let ssid_h = ssid
            .try_into()
            .map_err(|_| String::from("STA SSID too long (max 32)"))?;

        let password = self.credentials.password.trim();
        let (auth_method, password_h) = if password.is_empty() {
            (AuthMethod::None, Default::default())
        } else {
            (
                AuthMethod::WPA2Personal,
                password
                    .try_into()
                    .map_err(|_| String::from("STA password too long (max 64)"))?,
            )
        };

        let conf = Configuration::Client(ClientConfiguration {
            ssid: ssid_h,
            bssid: None,
            auth_method,
            password: password_h,
            channel: None,
            ..Default::default()
        });

        self.wifi
            .set_configuration(&conf)
            .map_err(|err| format!("wifi sta config failed: {}", err))?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi
                .start()
                .map_err(|err| format!("wifi sta start failed: {}", err))?;
        }
        self.wifi
            .connect()
            .map_err(|err| format!("wifi sta connect failed: {}", err))?;
        self.wifi
            .wait_netif_up()
            .map_err(|err| format!("wifi sta netif up failed: {}", err))?;

        let ip = self
            .wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map_err(|err| format!("wifi sta ip failed: {}", err))?
            .ip;
        let mac = self
            .wifi
            .wifi()
            .sta_netif()
            .get_mac()
            .map(|mac| {
                mac.iter()
                    .map(|byte| format!("{:02X}", byte))
                    .collect::<Vec<_>>()
                    .join(":")
            })
            .unwrap_or_default();
        log::info!("Connected to {}: ip={} mac={}", ssid, ip, mac);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    /// Rejoin if the link dropped. Called from the supervision loop.
    pub fn ensure_connected(&mut self) {
        if self.is_connected() {
            return;
        }
        log::warn!("AP link is down, rejoining");
        match self.connect() {
            Ok(()) => log::info!("Wi-Fi rejoined"),
            Err(err) => log::error!("Failed to rejoin Wi-Fi: {}", err),
        }
    }
}

// wifi.rs

use embedded_svc::wifi::{ClientConfiguration, Configuration};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    nvs::EspDefaultNvsPartition,
    timer::EspTaskTimerService,
    wifi::{AsyncWifi, EspWifi},
};
use log::*;

use crate::*;

fn driver_error(err: esp_idf_sys::EspError) -> ConnectError {
    ConnectError::Link(format!("{err:?}"))
}

/// The ESP32 radio in station mode.
pub struct WifiStation {
    wifi: AsyncWifi<EspWifi<'static>>,
    started: bool,
}

impl WifiStation {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        timer: EspTaskTimerService,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> anyhow::Result<Self> {
        info!("Initializing Wi-Fi...");
        let espwifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let wifi = AsyncWifi::wrap(espwifi, sysloop, timer)?;
        Ok(WifiStation {
            wifi,
            started: false,
        })
    }

    async fn configure(&mut self, creds: &WifiConfig) -> Result<(), ConnectError> {
        info!("WiFi setting credentials...");
        let ssid = creds
            .ssid
            .as_str()
            .try_into()
            .map_err(|_| ConnectError::Config(format!("SSID too long: {}", creds.ssid)))?;
        let password = creds
            .pass
            .as_str()
            .try_into()
            .map_err(|_| ConnectError::Config("WiFi passphrase too long".into()))?;

        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid,
                password,
                ..Default::default()
            }))
            .map_err(driver_error)?;

        info!("WiFi driver starting...");
        Box::pin(self.wifi.start()).await.map_err(driver_error)?;
        self.started = true;
        Ok(())
    }
}

impl Station for WifiStation {
    fn is_up(&self) -> bool {
        self.wifi.wifi().is_up().unwrap_or(false)
    }

    async fn associate(&mut self, creds: &WifiConfig) -> Result<(), ConnectError> {
        if !self.started {
            self.configure(creds).await?;
        }

        info!("WiFi connecting...");
        // association may still complete after the driver gives up waiting,
        // the link poll has the final say
        if let Err(e) = Box::pin(self.wifi.connect()).await {
            warn!("WiFi connect: {e:?}");
        }
        info!("WiFi waiting for association...");
        Ok(())
    }

    fn link_info(&self) -> Option<String> {
        let ip_info = self.wifi.wifi().sta_netif().get_ip_info().ok()?;
        Some(format!("{ip_info:?}"))
    }
}

// EOF

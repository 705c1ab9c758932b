// bin/grillmon.rs

#![warn(clippy::large_futures)]

#[cfg(target_os = "espidf")]
use esp_idf_hal::{
    delay::{Ets, FreeRtos},
    gpio::PinDriver,
    prelude::Peripherals,
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs, timer::EspTaskTimerService};
use grillmon::*;
#[cfg(target_os = "espidf")]
use log::*;

#[cfg(target_os = "espidf")]
esp_idf_sys::esp_app_desc!();

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Hello.");
    info!("grillmon {FW_VERSION} starting up.");

    let config = AppConfig::default();
    info!("My config:\n{config:#?}");
    config.validate()?;

    let sysloop = EspSystemEventLoop::take()?;
    let timer = EspTaskTimerService::new()?;
    let nvs_default_partition = nvs::EspDefaultNvsPartition::take()?;

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // MAX6675 wiring: SCK, CS, SO
    #[cfg(feature = "esp32c3")]
    let (sck, cs, so) = (
        PinDriver::output(pins.gpio4)?,
        PinDriver::output(pins.gpio5)?,
        PinDriver::input(pins.gpio6)?,
    );

    #[cfg(feature = "esp32s")]
    let (sck, cs, so) = (
        PinDriver::output(pins.gpio18)?,
        PinDriver::output(pins.gpio5)?,
        PinDriver::input(pins.gpio19)?,
    );

    let thermo = Max6675::new(sck, cs, so, Ets)
        .map_err(|e| anyhow::anyhow!("Cannot set up thermocouple bus: {e}"))?;

    let station = WifiStation::new(
        peripherals.modem,
        sysloop,
        timer,
        Some(nvs_default_partition),
    )?;
    let link = StationLink::new(station);
    let publisher = MqttPublisher::new();

    let res = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(Box::pin(async move {
            let mut acquisition = AcquisitionLoop::new(config, thermo, link, publisher);
            acquisition.run().await
        }));

    if let Err(e) = res {
        // a broker that refuses us on boot is a configuration problem,
        // rebooting would only hammer it
        error!("Giving up: {e}");
        return Err(e.into());
    }

    info!("main() finished, reboot.");
    FreeRtos::delay_ms(3000);
    esp_idf_hal::reset::restart();
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("grillmon {FW_VERSION} only runs on ESP-IDF targets.");
}

// EOF

// build.rs

use std::env;

fn main() -> anyhow::Result<()> {
    // Necessary because of this issue: https://github.com/rust-lang/cargo/issues/9641
    // see also https://github.com/rust-lang/cargo/issues/9554
    // Host builds (unit tests) have no ESP-IDF to propagate.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::build::CfgArgs::output_propagated("ESP_IDF")?;
        embuild::build::LinkArgs::output_propagated("ESP_IDF")?;
    }

    let settings = [
        ("WIFI_SSID", "internet"),
        ("WIFI_PASS", "password"),
        ("MQTT_HOST", "io.adafruit.com"),
        ("MQTT_PORT", "1883"),
        ("MQTT_USER", "grillmon"),
        ("MQTT_KEY", "key"),
        ("MQTT_CLIENT_ID", "grillmon"),
        ("MQTT_TOPIC", "grillmon/feeds/temperature"),
    ];

    for (name, default) in settings {
        println!("cargo:rerun-if-env-changed={name}");
        let value = env::var(name).unwrap_or_else(|_| default.into());
        println!("cargo:rustc-env={name}={value}");
    }

    Ok(())
}

// EOF

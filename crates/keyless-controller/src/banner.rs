//! Startup banner.

use crate::config::ControllerConfig;
use std::fmt::Write;

const LOGO: &str = r"
  _  __          _
 | |/ /___ _   _| | ___  ___ ___
 | ' // _ \ | | | |/ _ \/ __/ __|
 | . \  __/ |_| | |  __/\__ \__ \
 |_|\_\___|\__, |_|\___||___/___/
           |___/
";

/// Render the banner printed once the controller is running.
pub fn render(config: &ControllerConfig) -> String {
    let mut banner = String::from(LOGO);

    // Writing to a String cannot fail.
    let _ = writeln!(banner, "Keyless Access Controller");
    let _ = writeln!(banner, "Version {}", keyless_core::VERSION);
    let _ = writeln!(banner, "Scanner:   {:?}", config.scanner.device);
    let _ = writeln!(
        banner,
        "Strike:    {:?} (grant {} ms, {:?} policy)",
        config.strike.actuator, config.strike.grant_duration_ms, config.strike.extend_policy
    );
    let _ = writeln!(
        banner,
        "Datastore: {:?} at {}",
        config.datastore.kind,
        config.datastore.path.display()
    );

    banner
}

/// Print the loaded configuration
///
/// Run with: cargo run -p cadence-config --example print_config

fn main() {
    let config = cadence_config::CadenceConfig::load();

    println!("=== Cadence Configuration ===\n");

    println!("Engine Settings:");
    println!("  Default Easing: {}", config.engine.default_easing);
    println!("  Strict Properties: {}", config.engine.strict_properties);
    println!("  Verify On Load: {}", config.engine.verify_on_load);
    println!();

    println!("Playback Settings:");
    println!("  Frame Interval: {}", config.playback.frame_interval);
    println!("  Max Frames: {}", config.playback.max_frames);
    println!();

    println!("Logging Filter: {}", config.logging.filter);
    println!("Demo Timeline: {:?}", config.demo.timeline);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}

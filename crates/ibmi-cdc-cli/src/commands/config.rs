//! Config command implementation.

use ibmi_cdc_engine::CaptureConfig;
use std::path::Path;

pub fn run(file: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = CaptureConfig::from_file(Path::new(&file))?;

    println!("# journal {}", config.journal);
    if config.include.is_empty() {
        println!("# capturing every table");
    } else {
        println!("# capturing {} include entries", config.include.len());
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

//! Info command implementation

use anyhow::Result;
use windraw::Config;

pub fn run() -> Result<()> {
    let config = Config::from_env()?;

    println!("windraw v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Platform:           {}-{}", std::env::consts::OS, std::env::consts::ARCH);
    println!("Backend preference: {}", config.backend);
    println!(
        "Bundled fallback:   {}",
        if config.bundled_fallback { "on" } else { "off" }
    );
    print_backend()
}

#[cfg(windows)]
fn print_backend() -> Result<()> {
    let runtime = windraw::runtime()?;
    match runtime.backend() {
        Some(kind) => println!("Backend:            {}", kind),
        None => println!("Backend:            none usable"),
    }
    Ok(())
}

#[cfg(not(windows))]
fn print_backend() -> Result<()> {
    println!("Backend:            none (native backends need Windows)");
    Ok(())
}

//! Probe command implementation
//!
//! Acquires the requested modules, prints the reference counts, releases
//! them and prints the counts again.

use anyhow::Result;

use crate::cli::ProbeArgs;

#[cfg(windows)]
pub fn run(args: &ProbeArgs) -> Result<()> {
    use windraw::{Module, NativeRuntime};

    fn print_counts(runtime: &NativeRuntime) {
        for module in Module::PRIORITY {
            println!("  {:<6} {}", super::module_name(module), runtime.ref_count(module));
        }
    }

    let runtime = windraw::runtime()?;
    let modules = args.module_set().with(Module::Core);

    runtime.acquire(modules)?;
    match runtime.backend() {
        Some(kind) => println!("Backend: {}", kind),
        None => println!("Backend: none"),
    }
    println!("Acquired:");
    print_counts(&runtime);

    runtime.release(modules);
    println!("Released:");
    print_counts(&runtime);
    Ok(())
}

#[cfg(not(windows))]
pub fn run(args: &ProbeArgs) -> Result<()> {
    let names: Vec<_> = args
        .module_set()
        .iter()
        .map(super::module_name)
        .collect();
    anyhow::bail!(
        "cannot acquire {}: native backends need Windows",
        names.join(",")
    )
}

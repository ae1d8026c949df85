//! CLI argument definitions using Clap v4

use clap::{Parser, Subcommand, ValueEnum};
use windraw::{Module, ModuleSet};

/// windraw - inspect backend selection and module setup
#[derive(Parser, Debug)]
#[command(name = "windraw")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show platform, configuration and the backend that would be used
    #[command(alias = "i")]
    Info,

    /// Acquire modules, report reference counts, then release them
    #[command(alias = "p")]
    Probe(ProbeArgs),
}

/// Arguments for the probe command
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Modules to acquire; core is always included
    #[arg(long, value_enum, value_delimiter = ',', default_value = "core")]
    pub modules: Vec<ModuleArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleArg {
    Core,
    Image,
    Text,
}

impl From<ModuleArg> for Module {
    fn from(arg: ModuleArg) -> Self {
        match arg {
            ModuleArg::Core => Module::Core,
            ModuleArg::Image => Module::ImageCodec,
            ModuleArg::Text => Module::TextLayout,
        }
    }
}

impl ProbeArgs {
    pub fn module_set(&self) -> ModuleSet {
        self.modules.iter().copied().map(Module::from).collect()
    }
}

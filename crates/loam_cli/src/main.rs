//! loam - scene and component tool
//!
//! Loads an optional plugin module, then runs one subcommand against the
//! component registry:
//!
//! ```text
//! loam components
//! loam --plugin target/debug/libdemo_plugin.so inspect level.json
//! loam resave level.json --out level.fresh.json --identity regenerate
//! loam instantiate crate.json --count 4 --at 10,0
//! ```

mod commands;
mod config;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use loam_core::Vec2;
use loam_plugin::AssemblyHost;
use loam_reflect::{register_builtin_components, ComponentTypeRegistry};
use loam_scene::IdentityMode;

use crate::config::LoamConfig;

#[derive(Debug, Parser)]
#[command(name = "loam", version, about = "Inspect and rewrite loam scene documents")]
struct Cli {
    /// Plugin module to load before running the command
    #[arg(long, global = true)]
    plugin: Option<PathBuf>,

    /// Config file (default: ./loam.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List registered component types and their fields
    Components,
    /// Print the entity tree of a scene and any load issues
    Inspect { scene: PathBuf },
    /// Load a scene and write it back out
    Resave {
        scene: PathBuf,
        /// Write here instead of over the input
        #[arg(long)]
        out: Option<PathBuf>,
        /// preserve or regenerate
        #[arg(long)]
        identity: Option<IdentityMode>,
    },
    /// Instantiate a prefab and print the resulting scene
    Instantiate {
        prefab: PathBuf,
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Root position as X,Y
        #[arg(long, value_parser = commands::parse_point)]
        at: Option<Vec2>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match LoamConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
    log::debug!("{}", config.summary());

    if let Err(e) = run(cli, &config) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: &LoamConfig) -> Result<(), Box<dyn Error>> {
    let mut registry = ComponentTypeRegistry::new();
    register_builtin_components(&mut registry);

    let mut host = AssemblyHost::new();
    if let Some(plugin) = cli.plugin.as_ref().or(config.plugin.as_ref()) {
        let count = host.load_module(plugin, &mut registry)?;
        log::info!("Loaded {} plugin components from {}", count, plugin.display());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = match cli.command {
        Command::Components => commands::components(&registry, &mut out),
        Command::Inspect { scene } => commands::inspect(&registry, &scene, &mut out),
        Command::Resave { scene, out: target, identity } => commands::resave(
            &registry,
            &scene,
            target.as_deref(),
            identity.unwrap_or(config.identity),
            config.pretty,
            &mut out,
        ),
        Command::Instantiate { prefab, count, at } => {
            commands::instantiate(&registry, &prefab, count, at, config.pretty, &mut out)
        }
    };
    out.flush()?;

    host.unload(&mut registry);
    result
}

// Secret Tree - Load mounted service credentials
//
// This is the main entry point for the application.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use secret_tree::config::{Config, DEFAULT_CONFIG_FILE};
use secret_tree::loader::collisions;
use secret_tree::render::{render, render_env, OutputFormat};
use secret_tree::types::{InstanceMap, ServiceMap};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Secret Tree - Load mounted service credentials into a configuration map
#[derive(Parser, Debug)]
#[command(name = "secret-tree")]
#[command(version)]
#[command(about = "Load mounted service credentials into a configuration map", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the secrets tree and print it
    Load(LoadArgs),

    /// Check that the secrets tree is mounted and readable
    Doctor {
        /// Path to the configuration file (default: secret-tree.yaml)
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: String,

        /// Secrets root to check instead of the configured one
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Path to the configuration file (default: secret-tree.yaml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Load this directory instead of the configured root; it must exist
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Output format (default: from config, else json)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Group instances by service instead of flattening them
    #[arg(long, default_value = "false")]
    scoped: bool,

    /// Process directory entries in name order
    #[arg(long, default_value = "false")]
    sorted: bool,

    /// Print a single NAME=<json> environment assignment instead
    #[arg(long, value_name = "NAME")]
    env: Option<String>,
}

enum Loaded {
    Flat(InstanceMap),
    Scoped(ServiceMap),
}

fn load_config(path: &str) -> Result<Config> {
    let config = Config::load_or_default(path)?;
    config.validate()?;
    Ok(config)
}

fn run_load(args: LoadArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let format = args.format.unwrap_or(config.format);
    let sorted = args.sorted || config.sorted;

    let loader = config.loader()?.sorted(sorted);

    let loaded = match &args.root {
        // An explicit root must be a readable directory
        Some(root) => {
            if args.scoped {
                Loaded::Scoped(loader.load_scoped(root)?)
            } else {
                Loaded::Flat(loader.load_from_path(root)?)
            }
        }
        None => {
            if args.scoped {
                Loaded::Scoped(loader.load_default_scoped()?.unwrap_or_default())
            } else {
                Loaded::Flat(loader.load_default()?.unwrap_or_default())
            }
        }
    };

    let output = match (&loaded, &args.env) {
        (Loaded::Flat(map), Some(name)) => render_env(name, map)?,
        (Loaded::Scoped(map), Some(name)) => render_env(name, map)?,
        (Loaded::Flat(map), None) => render(map, format)?,
        (Loaded::Scoped(map), None) => render(map, format)?,
    };

    println!("{}", output.trim_end());
    Ok(())
}

fn run_doctor(config_path: &str, root: Option<PathBuf>) -> Result<()> {
    println!("🔍 Secret Tree Doctor");
    println!("Checking secrets mount...\n");

    // Check 1: configuration
    print!("1. Checking configuration '{}'... ", config_path);
    let config = match load_config(config_path) {
        Ok(config) => {
            println!("✓");
            config
        }
        Err(e) => {
            println!("✗");
            println!("   ❌ {:#}", e);
            return Err(anyhow::anyhow!("Doctor checks failed"));
        }
    };

    let root = match root {
        Some(root) => root,
        None => config.root_path()?,
    };
    let loader = config.loader()?;

    // Check 2: root existence
    print!("2. Checking if {} exists... ", root.display());
    let metadata = match fs::metadata(&root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            println!("✗");
            println!("   ❌ Secrets root not found");
            println!("   💡 Nothing is mounted; applications will start without credentials");
            return Err(anyhow::anyhow!("Doctor checks failed"));
        }
        Err(e) => {
            println!("✗");
            println!("   ❌ Cannot access secrets root: {}", e);
            return Err(anyhow::anyhow!("Doctor checks failed"));
        }
    };
    println!("✓");

    // Check 3: root is a directory
    print!("3. Checking if {} is a directory... ", root.display());
    if !metadata.is_dir() {
        println!("✗");
        println!("   ❌ Secrets root must be a directory");
        return Err(anyhow::anyhow!("Doctor checks failed"));
    }
    println!("✓");

    // Check 4: whole tree can be traversed
    print!("4. Reading services and instances... ");
    let services = match loader.load_scoped(&root) {
        Ok(services) => {
            println!("✓");
            services
        }
        Err(e) => {
            println!("✗");
            println!("   ❌ {:#}", anyhow::Error::from(e));
            return Err(anyhow::anyhow!("Doctor checks failed"));
        }
    };

    let instance_count: usize = services.values().map(|instances| instances.len()).sum();
    println!(
        "   📦 {} service(s), {} instance(s)",
        services.len(),
        instance_count
    );

    // Check 5: collisions in the flattened view
    print!("5. Checking for instance name collisions... ");
    let found = collisions(&services);
    if found.is_empty() {
        println!("✓");
    } else {
        println!("⚠️");
        for collision in &found {
            println!(
                "   ⚠️  '{}' exists in: {}",
                collision.instance,
                collision.services.join(", ")
            );
        }
        println!("   💡 Only one of each survives flattening; use 'load --scoped' to keep all");
    }

    println!();
    println!("✅ Secrets tree is readable.");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    secret_tree::logging::init(cli.verbose);

    match cli.command {
        Commands::Load(args) => {
            if let Err(e) = run_load(args) {
                eprintln!("\nError: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Doctor { config, root } => {
            if let Err(e) = run_doctor(&config, root) {
                eprintln!("\nError: {:#}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

//! Unveil CLI
//!
//! Replay scroll scripts against a page, compute stagger delays, and check
//! contact messages.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use unveil_animation::StaggerGroup;
use unveil_core::Stage;
use unveil_page::{
    submit, ContactError, ContactForm, ContactMessage, DeliveryError, MessageDelivery, PageConfig,
};
use unveil_theme::{ColorScheme, ThemeState};

mod script;
mod simulate;

use script::Script;
use simulate::{report, Simulation};

#[derive(Parser)]
#[command(name = "unveil")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Viewport reveal engine CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a page and replay a scroll script against it
    Simulate {
        /// Page config (defaults to the built-in portfolio)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Scroll script (defaults to a tour of every section)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Initial color scheme (light or dark); detected from the environment if omitted
        #[arg(long)]
        scheme: Option<ColorScheme>,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Fetch images for real, resolving relative paths against this directory
        #[arg(long)]
        live: Option<PathBuf>,
    },

    /// Print the reveal delay of each child in a staggered group
    Delays {
        /// Number of children
        #[arg(short, long)]
        count: usize,

        /// Delay before the first child (ms)
        #[arg(short, long, default_value = "0")]
        base: u64,

        /// Delay between consecutive children (ms)
        #[arg(short, long, default_value = "100")]
        interval: u64,
    },

    /// Validate a contact message and hand it to a local outbox
    Contact {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        message: String,
    },

    /// Write the built-in portfolio config as TOML
    Init {
        /// Output path
        #[arg(default_value = "page.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Simulate {
            config,
            script,
            scheme,
            json,
            live,
        } => cmd_simulate(config.as_deref(), script.as_deref(), scheme, json, live),

        Commands::Delays {
            count,
            base,
            interval,
        } => cmd_delays(count, base, interval),

        Commands::Contact {
            name,
            email,
            message,
        } => cmd_contact(name, email, message),

        Commands::Init { output } => cmd_init(&output),
    }
}

fn load_config(path: Option<&Path>) -> Result<PageConfig> {
    let Some(path) = path else {
        return Ok(PageConfig::portfolio());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    PageConfig::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn cmd_simulate(
    config: Option<&Path>,
    script: Option<&Path>,
    scheme: Option<ColorScheme>,
    json: bool,
    live: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config)?;
    let script = match script {
        Some(path) => Script::load(path)?,
        None => {
            let ids: Vec<&str> = config.sections.iter().map(|s| s.id.as_str()).collect();
            Script::tour(&ids)
        }
    };

    let theme = Rc::new(match scheme {
        Some(scheme) => ThemeState::new(scheme),
        None => ThemeState::from_system(),
    });
    theme.subscribe(|scheme| info!("Color scheme is now {}", scheme));

    let stage = Stage::default();
    if let Some(root) = &live {
        attach_network(&stage, root)?;
    }

    info!(
        "Simulating \"{}\" ({} sections, {} steps)",
        config.title,
        config.sections.len(),
        script.steps.len()
    );

    let mut simulation = Simulation::new(stage, config, theme)?;
    if live.is_some() {
        simulation = simulation.live();
    }
    simulation.run(&script)?;

    let Some(snapshot) = simulation.snapshot() else {
        anyhow::bail!("No snapshot available");
    };
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?
        );
    } else {
        print!("{}", report(&snapshot));
    }
    Ok(())
}

#[cfg(feature = "network")]
fn attach_network(stage: &Stage, root: &Path) -> Result<()> {
    let fetcher = unveil_image::NetworkFetcher::new(root)
        .context("Failed to start the fetch runtime")?;
    stage.set_backend(fetcher);
    info!("Fetching images live from {}", root.display());
    Ok(())
}

#[cfg(not(feature = "network"))]
fn attach_network(_stage: &Stage, _root: &Path) -> Result<()> {
    anyhow::bail!("--live requires building with the `network` feature")
}

fn cmd_delays(count: usize, base: u64, interval: u64) -> Result<()> {
    let group = StaggerGroup::new(base, interval);
    for (index, delay) in group.delays(count).into_iter().enumerate() {
        println!("{index:>3}  {delay}ms");
    }
    Ok(())
}

/// Messages are written to the log instead of a mail service
struct LogOutbox;

impl MessageDelivery for LogOutbox {
    fn deliver(&mut self, message: &ContactMessage) -> std::result::Result<(), DeliveryError> {
        info!("Message from {} <{}>: {}", message.name, message.email, message.message);
        Ok(())
    }
}

fn cmd_contact(name: String, email: String, message: String) -> Result<()> {
    let mut form = ContactForm::new(name, email, message);
    let mut outbox = LogOutbox;

    match submit(&mut form, &mut outbox) {
        Ok(sent) => {
            println!("Message sent! Replies go to {}", sent.reply_to);
            Ok(())
        }
        Err(ContactError::Invalid(errors)) => {
            for (field, problem) in errors.iter() {
                eprintln!("  {field}: {problem}");
            }
            anyhow::bail!("{} field(s) need attention", errors.len())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    let content = PageConfig::portfolio().to_toml()?;
    fs::write(output, content).with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {}", output.display());
    Ok(())
}

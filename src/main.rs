use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rootcause::prelude::*;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ltguide::config::ExtractionConfig;
use ltguide::export::icons::export_icons;
use ltguide::export::write_guide;
use ltguide::extract_guide;
use ltguide::guide::DisplayNameNormalizer;
use ltguide::resources::ProjectDir;

/// Read from the working directory when no project path is given.
const PROJECT_PATH_FILE: &str = "ltprojpath.txt";

/// Extracts a cross-referenced guide dataset from a Lex Talionis project
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log per-record detail. `RUST_LOG` takes precedence when set.
    #[clap(short, long, global = true)]
    verbose: bool,

    /// TOML file overriding the built-in extraction rules
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the guide and write `guide.json`
    Extract {
        #[command(flatten)]
        project: ProjectArgs,

        /// Directory the dataset is written to
        #[clap(short, long, default_value = "guide")]
        out_dir: PathBuf,

        /// Indent the JSON output
        #[clap(long)]
        pretty: bool,

        /// Also cut the configured icon sheets into PNGs under `<OUT_DIR>/icons`
        #[clap(long)]
        icons: bool,
    },
    /// Run the whole pipeline and print a summary without writing anything
    Check {
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Print the display name of each class identifier
    DisplayName {
        #[clap(required = true)]
        identifiers: Vec<String>,
    },
    /// Print the built-in extraction rules as TOML
    DefaultConfig,
}

#[derive(clap::Args, Debug)]
struct ProjectArgs {
    /// Project directory, or its `game_data` directory. Falls back to the
    /// path stored in `ltprojpath.txt`.
    #[clap(env = "LTPROJ_DIR")]
    project: Option<PathBuf>,
}

impl ProjectArgs {
    fn open(self) -> Result<ProjectDir, Report> {
        let path = match self.project {
            Some(path) => path,
            None => {
                let text = std::fs::read_to_string(PROJECT_PATH_FILE).context(
                    "No project given: pass a path, set LTPROJ_DIR or create ltprojpath.txt",
                )?;
                let path = text.trim();
                if path.is_empty() {
                    bail!("{PROJECT_PATH_FILE} is empty");
                }
                PathBuf::from(path)
            }
        };
        Ok(ProjectDir::open(&path).context("Failed to open project")?)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> Result<(), Report> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => ExtractionConfig::load(path).context("Failed to load extraction config")?,
        None => ExtractionConfig::default(),
    };

    match args.command {
        Command::Extract {
            project,
            out_dir,
            pretty,
            icons,
        } => {
            let project = project.open()?;
            let guide = extract_guide(&project, &config).context("Extraction failed")?;
            let path = write_guide(&guide, &out_dir, pretty).context("Failed to write guide")?;
            println!("Wrote {}", path.display());

            if icons {
                let written = export_icons(project.root(), &config.icon_sheets, &out_dir.join("icons"))
                    .context("Failed to export icons")?;
                println!("Wrote {written} icons");
            }
        }
        Command::Check { project } => {
            let project = project.open()?;
            let guide = extract_guide(&project, &config).context("Extraction failed")?;
            for (kind, count) in guide.counts() {
                println!("{:>10}: {count}", kind.to_string());
            }
            for (label, categories) in [
                ("skill", guide.skill_categories()),
                ("item", guide.item_categories()),
                ("class", guide.class_categories()),
                ("unit", guide.unit_categories()),
            ] {
                println!("{:>10}: {} categories", label, categories.len());
            }
            println!("All references resolve.");
        }
        Command::DisplayName { identifiers } => {
            let normalizer = DisplayNameNormalizer::new(&config.names);
            for identifier in identifiers {
                println!("{identifier}\t{}", normalizer.normalize(&identifier));
            }
        }
        Command::DefaultConfig => {
            print!(
                "{}",
                ExtractionConfig::default()
                    .to_toml_string()
                    .context("Failed to serialize default config")?
            );
        }
    }

    Ok(())
}

/// rule2hook turns the rules people already write down for an assistant
/// ("Format Python files with black after editing", "Run git status when
/// finishing a task") into hook entries in the project's settings file.
/// Existing hooks are never silently replaced: if a rule would put a
/// different command where one is already configured, nothing is written
/// and both commands are shown so a human can decide.
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rule2hook::utils::{self, ConvertRequest, logging};

#[derive(Parser)]
#[command(name = "rule2hook")]
#[command(version, about = "Convert natural-language rules into hook configuration")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default rule2hook settings for a project
    Init {
        /// Project root
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
    /// Convert rules into hooks and merge them into the settings file
    Convert {
        /// Rules separated by commas or semicolons
        rules: Option<String>,
        /// Project root
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
        /// Also convert the rules found in the project's notes files
        #[arg(long)]
        from_notes: bool,
        /// Print a standalone hooks fragment instead of merging
        #[arg(long)]
        no_merge: bool,
        /// Show the merged result without writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a hooks file, or check a fragment against it for conflicts
    Validate {
        /// Hooks document to validate
        config: PathBuf,
        /// Fragment to check against CONFIG without writing anything
        fragment: Option<PathBuf>,
    },
    /// List the rules found in the project's notes files
    Scan {
        /// Project root
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        Commands::Init { project } => utils::initialize_project(&project),
        Commands::Convert {
            rules,
            project,
            from_notes,
            no_merge,
            dry_run,
        } => utils::convert_rules(
            &project,
            &ConvertRequest {
                rules,
                from_notes,
                no_merge,
                dry_run,
            },
        ),
        Commands::Validate { config, fragment } => {
            utils::validate_files(&config, fragment.as_deref())
        }
        Commands::Scan { project } => utils::scan_rules(&project),
    }
}

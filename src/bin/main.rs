use std::path::{
    Path,
    PathBuf,
};

use clap::{
    ArgAction,
    Parser,
    Subcommand,
};
use tracing::Level;
use znp_nvram::{
    BackupDocument,
    MemoryStore,
    ResetMode,
};

#[derive(Parser)]
#[command(name = "znp-nvram")]
#[command(about = "Back up, restore and reset Z-Stack coordinator NVRAM", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the NVRAM of a device image into a JSON backup
    Read {
        /// Device image (CSV)
        image: PathBuf,

        /// Output backup file path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Restore a JSON backup onto a device image
    Write {
        /// Device image (CSV), updated in place
        image: PathBuf,

        /// Input backup file path
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Reset the NVRAM of a device image
    Reset {
        /// Device image (CSV), updated in place
        image: PathBuf,

        /// Erase every item instead of only asking Z-Stack to clear its state
        #[arg(short, long)]
        clear: bool,
    },
}

fn init_logging(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_image(path: &Path) -> Result<MemoryStore, znp_nvram::Error> {
    println!("Loading device image: {}", path.display());
    Ok(MemoryStore::from_image_file(path)?.with_fixed_slots())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Read { image, output } => {
            let mut store = load_image(&image)?;
            let backup = znp_nvram::dump(&mut store)?;
            println!("Read {} items", backup.len());

            backup.to_file(&output)?;
            println!("Successfully wrote backup: {}", output.display());

            Ok(())
        }
        Commands::Write { image, input } => {
            println!("Parsing backup file: {}", input.display());
            let backup = BackupDocument::from_file(&input)?;
            println!("Found {} items", backup.len());

            let mut store = load_image(&image)?;
            let summary = znp_nvram::restore(&mut store, &backup)?;
            store.to_image_file(&image)?;

            println!(
                "Successfully restored {} items ({} created, {} overwritten, {} resized, {} unchanged)",
                summary.total(),
                summary.created,
                summary.overwritten,
                summary.resized,
                summary.unchanged
            );

            Ok(())
        }
        Commands::Reset { image, clear } => {
            let mode = if clear {
                ResetMode::Full
            } else {
                ResetMode::Soft
            };

            let mut store = load_image(&image)?;
            znp_nvram::reset(&mut store, mode)?;
            store.to_image_file(&image)?;

            println!("Successfully reset NVRAM ({mode:?}): {}", image.display());

            Ok(())
        }
    }
}

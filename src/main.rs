use clap::{Parser, Subcommand};
use sfsave::convert::{export_save, import_save, list_saves, ConvertOptions, DEFAULT_CONTAINER_PREFIX};
use sfsave::parts::part_file_name;
use sfsave::store::DirStore;
use sfsave::SaveContainer;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sfsave", about = "Convert saves between the packed and split container layouts")]
struct Cli {
    /// Log decoding details
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header fields and the part table of a packed save
    Info {
        input: PathBuf,
        /// Print the header as JSON
        #[arg(long)]
        json: bool,
    },
    /// Split a packed save into a header file and one file per part
    Unpack {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Rebuild a packed save from a split directory
    Pack {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List saves held by a store
    List {
        #[arg(long)]
        store: PathBuf,
        #[arg(long, default_value = DEFAULT_CONTAINER_PREFIX)]
        prefix: String,
    },
    /// Copy a packed save into a store container
    Export {
        input: PathBuf,
        #[arg(long)]
        store: PathBuf,
        /// Save name inside the store (defaults to the input file name)
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long, default_value = DEFAULT_CONTAINER_PREFIX)]
        prefix: String,
    },
    /// Rebuild a packed save from a store container
    Import {
        name: String,
        #[arg(long)]
        store: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = DEFAULT_CONTAINER_PREFIX)]
        prefix: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, json } => {
            let bytes = std::fs::read(&input)?;
            let (save, diag) = SaveContainer::decode_packed_with_diagnostics(&bytes)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&save.header)?);
                return Ok(());
            }
            let h = &save.header;
            println!("── Save ─────────────────────────────────────────────────");
            println!("  Path             {}", input.display());
            println!("  Version          {}", h.version);
            println!("  Total save size  {} B", h.total_save_size);
            println!("  Payload          {} B", save.total_payload_len());
            println!("  Part size        {} B", h.part_size);
            println!("  Part table end   {:#x}", h.part_table_end);
            println!("  Flags            {:#010x}", h.flags);
            println!("  Compression      {}", h.save_compression_type);
            println!("  Unknown          {:#x} {:#x} {:#x}", h.unknown, h.unknown2, h.unknown4);
            println!("  Trailing bytes   {}", diag.trailing_bytes);
            println!("  Parts ({}):", save.part_count());
            for (i, part) in save.parts.iter().enumerate() {
                let hash = blake3::hash(part);
                println!("    {:<8} {:>12}  {}", part_file_name(i), part.len(), hex::encode(&hash.as_bytes()[..6]));
            }
        }

        // ── Unpack ───────────────────────────────────────────────────────────
        Commands::Unpack { input, output_dir } => {
            let save = SaveContainer::load_from_file(&input)?;
            save.save_to_directory(&output_dir)?;
            println!("Unpacked {} part(s) to: {}", save.part_count(), output_dir.display());
        }

        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { input, output } => {
            let save = SaveContainer::load_from_directory(&input)?;
            save.save_to_file(&output)?;
            println!("Created: {}", output.display());
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { store, prefix } => {
            let store = DirStore::open(&store)?;
            let opts = ConvertOptions { container_prefix: prefix };
            for name in list_saves(&store, &opts)? {
                println!("{name}");
            }
        }

        // ── Export ───────────────────────────────────────────────────────────
        Commands::Export { input, store, name, prefix } => {
            let name = match name {
                Some(n) => n,
                None => input
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or("input has no file name; pass --name")?,
            };
            let save = SaveContainer::load_from_file(&input)?;
            let mut store = DirStore::open(&store)?;
            let opts = ConvertOptions { container_prefix: prefix };
            let summary = export_save(&mut store, &name, &save, &opts)?;
            println!("Exported to {} ({} added, {} updated)", summary.container, summary.added, summary.updated);
        }

        // ── Import ───────────────────────────────────────────────────────────
        Commands::Import { name, store, output, prefix } => {
            let mut store = DirStore::open(&store)?;
            let opts = ConvertOptions { container_prefix: prefix };
            let save = import_save(&mut store, &name, &opts)?;
            save.save_to_file(&output)?;
            println!("Created: {}", output.display());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

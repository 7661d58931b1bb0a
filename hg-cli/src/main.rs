//! hgsave CLI - Command-line tool for .hg game save containers
//!
//! This binary provides command-line interfaces for:
//! - unpack: decode a save → JSON with readable keys
//! - pack: encode JSON → save, keeping the target's header
//! - ls: list the container header and blocks
//! - get: print the value at a JSON Pointer
//! - set: replace the value at a JSON Pointer and write the save back
//! - latest: find the most recently modified save slot in a folder

mod config;

use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use hg_format::{find_magic, BlockIter, StopReason};
use hg_io::{
    backup_path, encode_document, init_global, most_recent_save, to_short, DecodeOpts, EncodeOpts,
    MappingSource, MappingTable, NodePath, OpenSave, SaveOptions,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
const LOG_ENV_VAR: &str = "HGSAVE_LOG";

#[derive(Parser)]
#[command(name = "hgsave")]
#[command(about = "Decode, edit and re-encode .hg game save containers")]
#[command(version)]
struct Cli {
    /// Key mapping file (flat or legacy {"Mapping": [...]} JSON)
    #[arg(long, global = true)]
    mapping: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging (overridden by HGSAVE_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    /// Show a progress spinner
    #[arg(long, global = true)]
    progress: bool,
    /// Fail on truncated saves instead of keeping the readable prefix
    #[arg(long, global = true)]
    strict: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a save to JSON
    ///
    /// Examples:
    ///   hgsave unpack save2.hg -o save2.json --mapping mapping.json
    ///   hgsave unpack save2.hg -o raw.json --raw-keys --pretty
    Unpack {
        /// Input save (.hg)
        input: PathBuf,
        /// Output file (.json)
        #[arg(short, long)]
        output: PathBuf,
        /// Keep short keys instead of translating them
        #[arg(long)]
        raw_keys: bool,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Encode JSON into a save, reusing the header of an existing save
    Pack {
        /// Input file (.json)
        input: PathBuf,
        /// Existing save providing the container header
        #[arg(long)]
        target: PathBuf,
        /// Output save (defaults to the target)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Input already uses short keys
        #[arg(long)]
        short_keys: bool,
        /// Do not write <file>.bak before overwriting
        #[arg(long)]
        no_backup: bool,
    },
    /// List the header and blocks of a save
    Ls {
        /// Input save (.hg)
        input: PathBuf,
        /// Output format (table, json)
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },
    /// Print the value at a JSON Pointer
    ///
    /// Examples:
    ///   hgsave get save2.hg /PlayerStateData/Units --mapping mapping.json
    ///   hgsave get save2.hg /6f=/wGS --raw-keys
    Get {
        /// Input save (.hg)
        input: PathBuf,
        /// JSON Pointer, e.g. /PlayerStateData/Units
        pointer: String,
        /// Address the document by short keys
        #[arg(long)]
        raw_keys: bool,
    },
    /// Replace the value at a JSON Pointer and write the save back
    Set {
        /// Save to edit (.hg)
        input: PathBuf,
        /// JSON Pointer of an existing node
        pointer: String,
        /// New value as JSON (quote strings: '"text"')
        value: String,
        /// Do not write <file>.bak before overwriting
        #[arg(long)]
        no_backup: bool,
    },
    /// Print the most recently modified save<N>.hg in a folder
    Latest {
        /// Save folder
        folder: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LsFormat {
    Table,
    Json,
}

/// Settings shared by every command after merging flags and config
struct Context {
    config: Config,
    decode: DecodeOpts,
    progress: bool,
}

impl Context {
    fn table(&self, raw_keys: bool) -> &'static MappingTable {
        static IDENTITY: std::sync::OnceLock<MappingTable> = std::sync::OnceLock::new();
        if raw_keys {
            IDENTITY.get_or_init(MappingTable::identity)
        } else {
            hg_io::global()
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(mapping) = cli.mapping.as_ref().or(config.mapping.as_ref()) {
        debug!(mapping = %mapping.display(), "using key mapping");
        init_global(&MappingSource::Path(mapping.clone()));
    }

    let ctx = Context {
        decode: DecodeOpts {
            strict: cli.strict,
            ..DecodeOpts::default()
        },
        progress: cli.progress,
        config,
    };

    match cli.command {
        Commands::Unpack {
            input,
            output,
            raw_keys,
            pretty,
        } => handle_unpack(&ctx, &input, &output, raw_keys, pretty),
        Commands::Pack {
            input,
            target,
            output,
            short_keys,
            no_backup,
        } => handle_pack(&ctx, &input, &target, output, short_keys, no_backup),
        Commands::Ls { input, format } => handle_ls(&input, format),
        Commands::Get {
            input,
            pointer,
            raw_keys,
        } => handle_get(&ctx, &input, &pointer, raw_keys),
        Commands::Set {
            input,
            pointer,
            value,
            no_backup,
        } => handle_set(&ctx, &input, &pointer, &value, no_backup),
        Commands::Latest { folder } => handle_latest(&folder),
    }
}

fn handle_unpack(
    ctx: &Context,
    input: &Path,
    output: &Path,
    raw_keys: bool,
    pretty: bool,
) -> Result<(), Box<dyn Error>> {
    let start = Instant::now();
    let progress_bar = ctx.progress.then(|| create_spinner("Decoding save"));

    let table = ctx.table(raw_keys);
    let save = OpenSave::open(input, table, &ctx.decode)?.with_options(SaveOptions {
        pretty_export: pretty || ctx.config.pretty(),
        ..SaveOptions::default()
    });
    let bytes_written = save.export_json(output)?;
    let elapsed = start.elapsed();

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("Decoded {} in {:.2?}", input.display(), elapsed));
    }
    let mut stderr = std::io::stderr().lock();
    writeln!(
        &mut stderr,
        "Unpacked to {} (nodes: {}, header bytes: {}, json bytes: {}, keys: {}, elapsed: {:.2?})",
        output.display(),
        save.session().len(),
        save.header_len(),
        bytes_written,
        if table.is_loaded() { "readable" } else { "raw" },
        elapsed
    )?;
    if let Some(t) = save.truncation() {
        writeln!(
            &mut stderr,
            "Warning: {} is truncated at block {} (offset {}), output holds the readable prefix",
            input.display(),
            t.block,
            t.offset
        )?;
    }
    Ok(())
}

fn handle_pack(
    ctx: &Context,
    input: &Path,
    target: &Path,
    output: Option<PathBuf>,
    short_keys: bool,
    no_backup: bool,
) -> Result<(), Box<dyn Error>> {
    let start = Instant::now();
    let progress_bar = ctx.progress.then(|| create_spinner("Encoding save"));

    let document: Value = serde_json::from_slice(&fs::read(input)?)?;
    let document = if short_keys {
        document
    } else {
        to_short(&document, ctx.table(false))
    };
    let original = fs::read(target)?;
    let bytes = encode_document(&original, &document, &EncodeOpts::default())?;

    let output = output.unwrap_or_else(|| target.to_path_buf());
    let backup = if !no_backup && ctx.config.backup() && output.exists() {
        let backup = backup_path(&output);
        fs::copy(&output, &backup)?;
        Some(backup)
    } else {
        None
    };
    fs::write(&output, &bytes)?;
    let elapsed = start.elapsed();

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("Encoded {} in {:.2?}", output.display(), elapsed));
    }
    let mut stderr = std::io::stderr().lock();
    writeln!(
        &mut stderr,
        "Packed to {} (bytes written: {}, elapsed: {:.2?})",
        output.display(),
        bytes.len(),
        elapsed
    )?;
    if let Some(backup) = backup {
        writeln!(&mut stderr, "Previous contents saved to {}", backup.display())?;
    }
    Ok(())
}

#[derive(Debug, Clone, serde::Serialize)]
struct BlockSummary {
    block_index: usize,
    offset: usize,
    compressed_size: u32,
    uncompressed_size: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
struct ContainerSummary {
    header_len: usize,
    blocks: Vec<BlockSummary>,
    stop: String,
}

fn summarize_container(bytes: &[u8]) -> ContainerSummary {
    let Some(header_len) = find_magic(bytes) else {
        return ContainerSummary {
            header_len: bytes.len(),
            blocks: Vec::new(),
            stop: "no block magic found".to_string(),
        };
    };

    let mut iter = BlockIter::new(&bytes[header_len..]);
    let blocks = iter
        .by_ref()
        .map(|block| BlockSummary {
            block_index: block.index,
            offset: header_len + block.offset,
            compressed_size: block.header.compressed_size,
            uncompressed_size: block.header.uncompressed_size,
        })
        .collect();
    let stop = match iter.stop_reason() {
        Some(StopReason::Sentinel { offset }) => format!("sentinel at {}", header_len + offset),
        Some(StopReason::EndOfData { offset }) => format!("end of data at {}", header_len + offset),
        Some(StopReason::ForeignMagic { offset }) => {
            format!("foreign bytes at {}", header_len + offset)
        }
        Some(StopReason::Truncated(t)) => format!(
            "truncated block {} at {} ({} of {} bytes)",
            t.block,
            header_len + t.offset,
            t.available,
            t.declared
        ),
        None => "unknown".to_string(),
    };

    ContainerSummary {
        header_len,
        blocks,
        stop,
    }
}

fn handle_ls(input: &Path, format: LsFormat) -> Result<(), Box<dyn Error>> {
    let bytes = fs::read(input)?;
    let summary = summarize_container(&bytes);
    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    match format {
        LsFormat::Table => print_ls_table(&mut writer, &summary)?,
        LsFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &summary)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn print_ls_table(writer: &mut dyn Write, summary: &ContainerSummary) -> Result<(), Box<dyn Error>> {
    writeln!(writer, "Header: {} bytes", summary.header_len)?;
    writeln!(writer, "Block\tOffset\tCompressed\tUncompressed")?;
    for block in &summary.blocks {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            block.block_index, block.offset, block.compressed_size, block.uncompressed_size
        )?;
    }
    writeln!(writer, "Stop: {}", summary.stop)?;
    Ok(())
}

fn handle_get(ctx: &Context, input: &Path, pointer: &str, raw_keys: bool) -> Result<(), Box<dyn Error>> {
    let save = OpenSave::open(input, ctx.table(raw_keys), &ctx.decode)?;
    let path = NodePath::parse(pointer)?;
    let value = path
        .resolve(save.session().document())
        .ok_or_else(|| format!("no value at '{pointer}'"))?;

    let mut stdout = std::io::stdout().lock();
    if ctx.config.pretty() {
        serde_json::to_writer_pretty(&mut stdout, value)?;
    } else {
        serde_json::to_writer(&mut stdout, value)?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn handle_set(
    ctx: &Context,
    input: &Path,
    pointer: &str,
    value: &str,
    no_backup: bool,
) -> Result<(), Box<dyn Error>> {
    let value: Value =
        serde_json::from_str(value).map_err(|e| format!("value must be JSON ({e}): {value}"))?;
    let path = NodePath::parse(pointer)?;

    let mut save = OpenSave::open(input, ctx.table(false), &ctx.decode)?.with_options(SaveOptions {
        backup: !no_backup && ctx.config.backup(),
        ..SaveOptions::default()
    });
    let id = save.session_mut().set_path(&path, value)?;

    let mut stderr = std::io::stderr().lock();
    if !save.session().is_dirty(id) {
        writeln!(&mut stderr, "{pointer} unchanged, nothing written")?;
        return Ok(());
    }
    let report = save.save()?;
    writeln!(
        &mut stderr,
        "Updated {pointer} in {} (bytes written: {})",
        report.path.display(),
        report.bytes_written
    )?;
    if let Some(backup) = report.backup {
        writeln!(&mut stderr, "Previous contents saved to {}", backup.display())?;
    }
    Ok(())
}

fn handle_latest(folder: &Path) -> Result<(), Box<dyn Error>> {
    let latest = most_recent_save(folder)?
        .ok_or_else(|| format!("no save<N>.hg files found in {}", folder.display()))?;
    println!("{}", latest.display());
    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

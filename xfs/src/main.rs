//! xfs CLI - read, dump and glob structured files
//!
//! # Commands
//!
//! ```bash
//! xfs read family.csv --mode assoc        # Print a CSV file as JSON
//! xfs read config.yaml -o config.json     # Any supported format to JSON
//! xfs dump data.json out.csv --delimiter ';'
//! xfs glob 'src/**/*.rs'                  # Recursive glob
//! ```
//!
//! Defaults come from `XFS_*` environment variables (a `.env` file is
//! loaded first). Logging is controlled by `RUST_LOG` or `-v`.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use xfs::formats::json;
use xfs::{
    CsvData, CsvDialect, CsvOptions, DumpMode, Format, GlobFlags, JsonStyle, ParseMode,
    Settings, XFilesystem,
};

#[derive(Parser)]
#[command(name = "xfs")]
#[command(about = "Read, dump and glob CSV, JSON, YAML and TOML files", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a file and print it as JSON
    Read {
        /// Input path or http(s) URL
        input: String,

        /// Input format (inferred from the extension if not specified)
        #[arg(short, long)]
        format: Option<String>,

        /// CSV structure: array, assoc or object
        #[arg(short, long, default_value = "object")]
        mode: String,

        #[command(flatten)]
        dialect: DialectArgs,

        /// CSV charset, or "auto" to detect it
        #[arg(long)]
        charset: Option<String>,

        /// Allow reading from http(s) URLs
        #[arg(long)]
        allow_remote: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dump JSON data into a file of any supported format
    Dump {
        /// Input JSON file
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Output format (inferred from the extension if not specified)
        #[arg(short, long)]
        format: Option<String>,

        /// CSV shape: plain, structured or detect
        #[arg(long, default_value = "detect")]
        dump_mode: String,

        #[command(flatten)]
        dialect: DialectArgs,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print paths matching a glob pattern, one per line
    Glob {
        /// Pattern, may contain `**` segments
        pattern: String,

        /// Only match directories
        #[arg(long)]
        only_dir: bool,

        /// Append a separator to directories
        #[arg(long)]
        mark: bool,

        /// Keep discovery order
        #[arg(long)]
        no_sort: bool,

        /// Print the pattern itself when nothing matches
        #[arg(long)]
        no_check: bool,
    },
}

/// CSV dialect overrides shared by `read` and `dump`.
#[derive(clap::Args)]
struct DialectArgs {
    /// CSV delimiter, any length
    #[arg(short, long)]
    delimiter: Option<String>,

    /// CSV enclosure, any length
    #[arg(long)]
    enclosure: Option<String>,

    /// CSV escape, empty to double enclosures instead
    #[arg(long)]
    escape: Option<String>,
}

impl DialectArgs {
    fn apply(self, base: &CsvDialect) -> CsvDialect {
        CsvDialect {
            delimiter: self.delimiter.unwrap_or_else(|| base.delimiter.clone()),
            enclosure: self.enclosure.unwrap_or_else(|| base.enclosure.clone()),
            escape: self.escape.unwrap_or_else(|| base.escape.clone()),
        }
    }
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match Settings::from_env() {
        Ok(settings) => run(cli.command, &settings),
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| format!("xfs={}", default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(command: Commands, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Read {
            input,
            format,
            mode,
            dialect,
            charset,
            allow_remote,
            output,
        } => {
            let mut options = CsvOptions::with_dialect(dialect.apply(&settings.csv.dialect));
            options.charset = charset.unwrap_or_else(|| settings.csv.charset.clone());

            cmd_read(
                settings,
                &input,
                format.as_deref(),
                mode.parse()?,
                &options,
                allow_remote,
                output.as_deref(),
            )
        }

        Commands::Dump {
            input,
            output,
            format,
            dump_mode,
            dialect,
            compact,
        } => {
            let style = if compact { JsonStyle::Compact } else { JsonStyle::Pretty };
            cmd_dump(
                settings,
                &input,
                &output,
                format.as_deref(),
                dump_mode.parse()?,
                &dialect.apply(&settings.csv.dialect),
                style,
            )
        }

        Commands::Glob {
            pattern,
            only_dir,
            mark,
            no_sort,
            no_check,
        } => {
            let mut flags = GlobFlags::NONE;
            for (enabled, flag) in [
                (only_dir, GlobFlags::ONLY_DIR),
                (mark, GlobFlags::MARK),
                (no_sort, GlobFlags::NO_SORT),
                (no_check, GlobFlags::NO_CHECK),
            ] {
                if enabled {
                    flags |= flag;
                }
            }
            cmd_glob(settings, &pattern, flags)
        }
    }
}

fn resolve_format(explicit: Option<&str>, path: &Path) -> Result<Format, Box<dyn std::error::Error>> {
    match explicit {
        Some(name) => Ok(name.parse()?),
        None => Ok(Format::from_path(path)),
    }
}

fn cmd_read(
    settings: &Settings,
    input: &str,
    format: Option<&str>,
    mode: ParseMode,
    options: &CsvOptions,
    allow_remote: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut xfs = XFilesystem::from_settings(settings);
    if allow_remote {
        xfs.set_remote_allowed(true);
    }

    let format = resolve_format(format, Path::new(input))?;
    eprintln!("📄 Reading {:?}: {}", format, input);

    let value = match format {
        Format::Csv => {
            eprintln!(
                "   Dialect: delimiter '{}', enclosure '{}', escape '{}'",
                options.dialect.delimiter, options.dialect.enclosure, options.dialect.escape
            );
            eprintln!("   Charset: {}", options.charset);

            let data = xfs.read_csv_file(input, mode, options)?;
            if let CsvData::Rows(ref rows) = data {
                eprintln!("✅ Parsed {} rows", rows.len());
            } else {
                eprintln!("✅ Parsed {} records", data.len());
            }
            data.into_value()
        }
        Format::Json => xfs.read_json_file(input)?,
        Format::Yaml => xfs.read_yaml_file(input)?,
        Format::Toml => xfs.read_toml_file(input)?,
        Format::Text => Value::String(xfs.read_to_string(input)?),
    };

    let text = json::encode(&value, JsonStyle::Pretty)?;
    write_output(&xfs, &text, output)?;

    Ok(())
}

fn cmd_dump(
    settings: &Settings,
    input: &Path,
    output: &Path,
    format: Option<&str>,
    mode: DumpMode,
    dialect: &CsvDialect,
    style: JsonStyle,
) -> Result<(), Box<dyn std::error::Error>> {
    let xfs = XFilesystem::from_settings(settings);
    let format = resolve_format(format, output)?;

    eprintln!("📥 Loading: {}", input.display());
    let data = xfs.read_json_file(input)?;

    match format {
        Format::Csv => {
            let items = data
                .as_array()
                .ok_or("CSV output needs a JSON array of rows or records")?;
            eprintln!("   {} items, mode {:?}", items.len(), mode);
            xfs.dump_csv_file(output, items, dialect, mode)?;
        }
        Format::Json => xfs.dump_json_file(output, &data, style)?,
        Format::Yaml => xfs.dump_yaml_file(output, &data)?,
        Format::Toml => xfs.dump_toml_file(output, &data)?,
        Format::Text => {
            let text = data
                .as_str()
                .ok_or("Text output needs a JSON string")?;
            xfs.dump_file(output, text.as_bytes())?;
        }
    }

    eprintln!("💾 {:?} written to: {}", format, output.display());
    Ok(())
}

fn cmd_glob(
    settings: &Settings,
    pattern: &str,
    flags: GlobFlags,
) -> Result<(), Box<dyn std::error::Error>> {
    let xfs = XFilesystem::from_settings(settings);
    let matches = xfs.glob(pattern, flags)?;

    for path in &matches {
        println!("{}", path.display());
    }
    eprintln!("🔍 {} matches", matches.len());

    Ok(())
}

fn write_output(
    xfs: &XFilesystem,
    content: &str,
    path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            xfs.dump_file(p, content.as_bytes())?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

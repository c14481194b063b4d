use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use leafpath_core::{generate_file, Addressing, Config, Report};
use leafpath_mapping::{
    apply_classifications, collect_classifications, parse_mapping_lines, reformat_file, sync_files,
    write_mapping, SyncOptions,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about = "Address every leaf of an XML document with a short XPath", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log progress and the effective configuration to stderr
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write `text : xpath` for every addressable leaf
    Paths {
        /// XML file, or a directory searched for *.xml files
        input: PathBuf,

        /// Output file (directory in batch mode); stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file with configuration defaults
        #[arg(long, value_name = "FILE")]
        defaults: Option<PathBuf>,

        /// Namespace prefix for emitted steps (empty keeps the source prefix)
        #[arg(long)]
        prefix: Option<String>,

        /// Element types that take part in paths (comma-separated)
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Attribute used for predicates (empty disables)
        #[arg(long, value_name = "NAME")]
        attribute: Option<String>,

        /// Container type whose child text becomes its predicate
        #[arg(long, value_name = "TYPE")]
        filter_parent: Option<String>,

        /// Child of the filter parent that supplies the predicate text
        #[arg(long, value_name = "TYPE")]
        filter_child: Option<String>,

        /// Number repeating container pairs as `(//outer/inner)[n]`
        #[arg(long)]
        composite: bool,

        /// Emit `[1]` on first occurrences
        #[arg(long)]
        always_index: bool,
    },
    /// Turn `KEY : VALUE` lines into a mapping XML document
    Mapping {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Copy a classification field between two documents
    SyncClass {
        /// Document the values are read from
        source: PathBuf,

        /// Document the values are written into
        target: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Element type carrying both children
        #[arg(long, default_value = "IMAGE")]
        element: String,

        /// Child whose text matches elements across documents
        #[arg(long, default_value = "ImageFileName")]
        key: String,

        /// Child whose text is copied
        #[arg(long, default_value = "ImageCategoryType")]
        field: String,
    },
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct PathsArgs<'a> {
    defaults: Option<&'a Path>,
    prefix: Option<&'a str>,
    include: Option<&'a [String]>,
    attribute: Option<&'a str>,
    filter_parent: Option<&'a str>,
    filter_child: Option<&'a str>,
    composite: bool,
    always_index: bool,
    debug: bool,
}

/// Defaults, then the JSON file, then flags.
fn build_config(args: &PathsArgs<'_>) -> Result<Config> {
    let mut config = match args.defaults {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load defaults from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(prefix) = args.prefix {
        config = config.with_namespace_prefix(prefix);
    }
    if let Some(include) = args.include {
        config = config.with_include_elements(include.iter().map(|s| s.trim().to_string()));
    }
    if let Some(attribute) = args.attribute {
        config = config.with_predicate_attribute(Some(attribute.to_string()));
    }
    if let Some(parent) = args.filter_parent {
        config.filter_parent_type = Some(parent.to_string());
    }
    if let Some(child) = args.filter_child {
        config.filter_child_type = Some(child.to_string());
    }
    if args.composite {
        config = config.with_addressing(Addressing::Composite);
    }
    if args.always_index {
        config = config.with_always_show_index(true);
    }
    if args.debug {
        config = config.with_debug(true);
    }
    Ok(config)
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes).context("failed to write to stdout")?;
    stdout.flush().context("failed to write to stdout")
}

fn emit_report(report: &Report, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => report
            .write_to(path)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut text = report.render();
            if !text.is_empty() {
                text.push('\n');
            }
            write_stdout(text.as_bytes())
        }
    }
}

/// `<stem>.xpaths.txt` in `out_dir`, or next to `input`.
fn batch_output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{stem}.xpaths.txt");
    match out_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

fn run_batch(dir: &Path, out_dir: Option<&Path>, config: &Config) -> Result<()> {
    if let Some(out_dir) = out_dir {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
    }

    let mut processed = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_xml(path) {
            continue;
        }
        let target = batch_output_path(path, out_dir);
        generate_file(path, config)
            .and_then(|report| report.write_to(&target))
            .with_context(|| {
                format!(
                    "failed to process {} (batch stopped after {processed} files)",
                    path.display()
                )
            })?;
        processed += 1;
        debug!(input = %path.display(), output = %target.display(), "processed");
    }
    info!(processed, "batch finished");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Paths {
            input,
            output,
            defaults,
            prefix,
            include,
            attribute,
            filter_parent,
            filter_child,
            composite,
            always_index,
        } => {
            let config = build_config(&PathsArgs {
                defaults: defaults.as_deref(),
                prefix: prefix.as_deref(),
                include: include.as_deref(),
                attribute: attribute.as_deref(),
                filter_parent: filter_parent.as_deref(),
                filter_child: filter_child.as_deref(),
                composite,
                always_index,
                debug: cli.debug,
            })?;
            init_tracing(config.debug);

            if input.is_dir() {
                return run_batch(&input, output.as_deref(), &config);
            }
            let report = generate_file(&input, &config)
                .with_context(|| format!("failed to process {}", input.display()))?;
            emit_report(&report, output.as_deref())
        }
        Commands::Mapping { input, output } => {
            init_tracing(cli.debug);
            match output {
                Some(output) => {
                    let count = reformat_file(&input, &output)
                        .with_context(|| format!("failed to reformat {}", input.display()))?;
                    info!(count, output = %output.display(), "mapping written");
                    Ok(())
                }
                None => {
                    let text = fs::read_to_string(&input)
                        .with_context(|| format!("failed to read {}", input.display()))?;
                    let bytes = write_mapping(&parse_mapping_lines(&text), Vec::new())?;
                    write_stdout(&bytes)
                }
            }
        }
        Commands::SyncClass {
            source,
            target,
            output,
            element,
            key,
            field,
        } => {
            init_tracing(cli.debug);
            let options = SyncOptions {
                element,
                discriminator: key,
                field,
            };
            let report = match output {
                Some(output) => sync_files(&source, &target, &output, &options)
                    .with_context(|| format!("failed to sync into {}", output.display()))?,
                None => {
                    let source_text = fs::read_to_string(&source)
                        .with_context(|| format!("failed to read {}", source.display()))?;
                    let target_text = fs::read_to_string(&target)
                        .with_context(|| format!("failed to read {}", target.display()))?;
                    let values = collect_classifications(&source_text, &options)
                        .with_context(|| format!("failed to collect values from {}", source.display()))?;
                    let (updated, report) = apply_classifications(&target_text, &values, &options)
                        .with_context(|| format!("failed to update {}", target.display()))?;
                    write_stdout(updated.as_bytes())?;
                    report
                }
            };
            eprintln!("{report}");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

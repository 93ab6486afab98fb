use clap::{Parser, Subcommand};
use imageview::config::{CliArgs, Config};
use imageview::preview::{DownloadArgs, file_uri};
use imageview::reference::remote_reference_at;
use imageview::{ImageView, Position};
use log::{LevelFilter, debug, error, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Parser)]
#[command(name = "imageview")]
#[command(about = "Preview image references in text files and browse workspace images")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Workspace root (repeatable)
    #[arg(short, long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Directory for temporary hover downloads
    #[arg(long, global = true)]
    temp_dir: Option<PathBuf>,

    /// Directory under the workspace root where downloads are saved
    #[arg(long, global = true)]
    images_dir: Option<String>,

    /// Preview width in pixels
    #[arg(short, long, global = true)]
    width: Option<u32>,

    /// Keep temporary downloads on exit
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = "true")]
    keep_temp_files: Option<bool>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the markdown preview for the image literal at a position
    Hover {
        /// Document containing the literal
        #[arg(short, long)]
        input: PathBuf,
        /// Zero-based line
        #[arg(short, long)]
        line: usize,
        /// Zero-based column
        #[arg(short = 'C', long)]
        column: usize,
    },
    /// Print the image library as HTML
    Library {
        /// Print one path per line instead of HTML
        #[arg(long)]
        list: bool,
    },
    /// Download a remote image literal into the workspace and rewrite it
    Download {
        /// Document containing the literal
        #[arg(short, long, required_unless_present = "args")]
        input: Option<PathBuf>,
        /// Zero-based line
        #[arg(short, long, required_unless_present = "args")]
        line: Option<usize>,
        /// Zero-based column
        #[arg(short = 'C', long, required_unless_present = "args")]
        column: Option<usize>,
        /// Arguments of a download command link (percent-encoded or raw JSON)
        #[arg(long, conflicts_with_all = ["input", "line", "column"])]
        args: Option<String>,
        /// Where to save the image (default: <root>/<images-dir>/image.<ext>)
        #[arg(short, long)]
        target: Option<PathBuf>,
    },
}

fn init_logger(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp(None)
        .init();
}

fn hover(view: &ImageView, input: &Path, position: Position) -> io::Result<()> {
    let text = fs::read_to_string(input)?;
    match view.hover(input, &text, position) {
        Some(hover) => {
            debug!("Hover range: {:?}", hover.range);
            println!("{}", hover.contents);
        }
        None => info!("No image reference at {}:{}", position.line, position.character),
    }
    Ok(())
}

fn library(view: &ImageView, list: bool) -> io::Result<()> {
    if list {
        for path in view.list_images().map_err(io::Error::other)? {
            println!("{}", path.display());
        }
    } else {
        print!("{}", view.library().map_err(io::Error::other)?);
    }
    Ok(())
}

fn download(
    view: &ImageView,
    args: DownloadArgs,
    input: &Path,
    target: Option<&Path>,
) -> io::Result<()> {
    let text = fs::read_to_string(input)?;

    match view.download_and_replace(&args, input, &text, target) {
        Ok(Some(replacement)) => {
            let Some(updated) = replacement.apply(&text) else {
                return Err(io::Error::other("document changed during download"));
            };
            fs::write(input, updated)?;
            println!("✅ Saved: ./{}", replacement.relative_path);
            Ok(())
        }
        Ok(None) => {
            warn!(
                "Nothing to replace at {}:{}",
                args.position.line, args.position.character
            );
            Ok(())
        }
        Err(e) => {
            error!("❌ {}", e);
            Err(io::Error::other(e))
        }
    }
}

/// Download arguments either from a command link or from the literal at a position.
fn download_args(
    encoded: Option<String>,
    input: Option<PathBuf>,
    position: Option<Position>,
) -> io::Result<(DownloadArgs, PathBuf)> {
    if let Some(encoded) = encoded {
        let args = DownloadArgs::from_command_args(&encoded).map_err(io::Error::other)?;
        let input = Url::parse(&args.document_uri)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .ok_or_else(|| io::Error::other(format!("Not a file URI: {}", args.document_uri)))?;
        return Ok((args, input));
    }

    let (Some(input), Some(position)) = (input, position) else {
        return Err(io::Error::other("--input, --line and --column are required"));
    };
    let text = fs::read_to_string(&input)?;
    let url = remote_reference_at(&text, position)
        .map(|m| m.reference.as_str().to_string())
        .unwrap_or_default();
    let args = DownloadArgs {
        url,
        document_uri: std::path::absolute(&input)
            .ok()
            .and_then(|p| file_uri(&p))
            .unwrap_or_default(),
        position,
    };
    Ok((args, input))
}

fn run(view: &ImageView, command: Command) -> io::Result<()> {
    match command {
        Command::Hover {
            input,
            line,
            column,
        } => hover(view, &input, Position::new(line, column)),
        Command::Library { list } => library(view, list),
        Command::Download {
            input,
            line,
            column,
            args,
            target,
        } => {
            let position = line.zip(column).map(|(l, c)| Position::new(l, c));
            let (args, input) = download_args(args, input, position)?;
            download(view, args, &input, target.as_deref())
        }
    }
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logger(args.verbose, args.quiet);

    let cli_args = CliArgs {
        roots: args.roots,
        temp_dir: args.temp_dir,
        images_dir: args.images_dir,
        preview_width: args.width,
        keep_temp_files: args.keep_temp_files,
    };
    let cfg = Config::build(cli_args, args.config);

    debug!("Roots: {:?}", cfg.roots);
    debug!("Temp dir: {:?}", cfg.temp_dir);
    debug!("Images dir: {}", cfg.images_dir);

    let view = ImageView::new(cfg);
    let result = run(&view, args.command);
    view.shutdown();
    result
}

use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use log::warn;

use snappy_tree_lib::config::ViewerConfig;
use snappy_tree_lib::file::{open_clipboard, open_file, Payload};
use snappy_tree_lib::node::{
    collapse_node, copy_all, copy_node_value, expand_node, get_node_value, toggle_node,
};
use snappy_tree_lib::render::{render_text, Marker};
use snappy_tree_lib::search::search;
use snappy_tree_lib::{AppState, Node, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Browse a JSON document as a collapsible, searchable tree.
#[derive(Debug, Parser)]
#[command(name = "snappy-tree", version)]
struct Cli {
    /// JSON file to open, or `-` for stdin
    file: Option<PathBuf>,

    /// Read the document from the system clipboard
    #[arg(long, conflicts_with = "file")]
    clipboard: bool,

    /// Input is an API response envelope; its body is displayed
    #[arg(long)]
    response: bool,

    /// Search term (case-insensitive substring)
    #[arg(short, long, default_value = "")]
    search: String,

    /// Label of the top-level node
    #[arg(long)]
    root_label: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expand a node and its ancestors (dotted path or JSON Pointer)
    #[arg(long, value_name = "PATH")]
    expand: Vec<String>,

    /// Collapse a node
    #[arg(long, value_name = "PATH")]
    collapse: Vec<String>,

    #[arg(long)]
    expand_all: bool,

    /// Copy a node's pretty-printed JSON to the clipboard
    #[arg(long, value_name = "PATH")]
    copy: Option<String>,

    /// Copy the whole unfiltered document to the clipboard
    #[arg(long)]
    copy_all: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Highlight search matches with terminal colors
    #[arg(long)]
    color: bool,

    /// Read commands from stdin after the first render
    #[arg(short, long)]
    interactive: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn reads_document_from_stdin(&self) -> bool {
        !self.clipboard && self.file.as_deref().map_or(true, |p| p == Path::new("-"))
    }
}

// Interactive commands arrive on stdin, so the document must come from elsewhere.
fn parse_cli<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    if cli.interactive && cli.reads_document_from_stdin() {
        return Err(Cli::command().error(
            ErrorKind::ArgumentConflict,
            "--interactive reads commands from stdin; pass a FILE or --clipboard",
        ));
    }
    Ok(cli)
}

fn main() -> ExitCode {
    let cli = parse_cli(std::env::args_os()).unwrap_or_else(|e| e.exit());
    init_logging(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(cli: Cli) -> Result<()> {
    let config = ViewerConfig::load(cli.config.as_deref())?;
    let root_label = cli.root_label.clone().unwrap_or_else(|| config.root_label.clone());
    let state = AppState::new(config);
    let payload = if cli.response {
        Payload::Response
    } else {
        Payload::Document
    };

    if cli.clipboard {
        open_clipboard(payload, &root_label, &state)?;
    } else {
        let path = cli.file.clone().unwrap_or_else(|| PathBuf::from("-"));
        open_file(&path, payload, &root_label, &state)?;
    }

    let mut rows = search(&cli.search, &state)?;
    if cli.expand_all {
        state.with_viewer(|v| Ok(v.expand_all()))?;
    }
    for path in &cli.expand {
        report(expand_node(path, &state));
    }
    for path in &cli.collapse {
        report(collapse_node(path, &state));
    }
    if !cli.expand.is_empty() || !cli.collapse.is_empty() || cli.expand_all {
        rows = state.rows()?;
    }

    if let Some(path) = &cli.copy {
        report(copy_node_value(path, false, &state));
    }
    if cli.copy_all {
        report(copy_all(&state));
    }

    let marker = if cli.color {
        Marker::Ansi
    } else {
        Marker::None
    };
    print_rows(&rows, cli.format, marker, &state)?;

    if cli.interactive {
        interactive(&state, cli.format, marker)?;
    }
    Ok(())
}

// Failures in view actions are shown but never abort the session.
fn report(result: Result<impl Sized>) {
    if let Err(e) = result {
        warn!("{e}");
    }
}

fn print_rows(rows: &[Node], format: Format, marker: Marker, state: &AppState) -> Result<()> {
    let mut out = io::stdout().lock();
    match format {
        Format::Text => out.write_all(render_text(rows, state.config.indent, marker).as_bytes())?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, rows)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

const HELP: &str = "\
/TERM   search (`/` clears)
t PATH  toggle node
e | c   expand | collapse everything
g PATH  print node JSON
y PATH  copy node      v PATH  copy raw string
Y       copy whole document
p       print          q  quit";

fn interactive(state: &AppState, format: Format, marker: Marker) -> Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim_end();
        let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
        let arg = arg.trim();
        let rows = match cmd {
            "q" => break,
            "p" => state.rows(),
            "e" => state.with_viewer(|v| {
                v.expand_all();
                Ok(v.rows())
            }),
            "c" => state.with_viewer(|v| {
                v.collapse_all();
                Ok(v.rows())
            }),
            "t" => toggle_node(arg, state).and_then(|_| state.rows()),
            "y" => {
                report(copy_node_value(arg, false, state));
                continue;
            }
            "g" => {
                match get_node_value(arg, state) {
                    Ok(json) => println!("{json}"),
                    Err(e) => report(Err::<(), _>(e)),
                }
                continue;
            }
            "v" => {
                report(copy_node_value(arg, true, state));
                continue;
            }
            "Y" => {
                report(copy_all(state));
                continue;
            }
            _ if cmd.starts_with('/') => search(&line[1..], state),
            _ => {
                eprintln!("{HELP}");
                continue;
            }
        };
        match rows {
            Ok(rows) => print_rows(&rows, format, marker, state)?,
            Err(e) => report(Err::<(), _>(e)),
        }
    }
    Ok(())
}

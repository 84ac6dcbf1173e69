//! vitrine - catalogue page editor core

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use vitrine::{Editor, EditorConfig, EditorState, ExportFormat, MemoryStore, Template};

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(version, about = "Render and export template-driven catalogue pages", long_about = None)]
#[command(after_help = "EXAMPLES:
    vitrine render skincare.json --data products.json    Render the first page
    vitrine inspect saved.json                           Summarize saved editor state
    vitrine export skincare.json --state saved.json      Export the saved page as HTML")]
struct Cli {
    /// JSON editor config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one page of a template with live data
    Render {
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Live data (JSON)
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Page index
        #[arg(short, long, default_value_t = 0)]
        page: usize,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Summarize a saved editor state
    Inspect {
        #[arg(value_name = "STATE")]
        state: PathBuf,
    },
    /// Apply a saved editor state to a template and export it
    Export {
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        state: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Format::Html)]
        format: Format,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Json,
}

const CLI_DOCUMENT: &str = "cli";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vitrine=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> vitrine::Result<()> {
    let config = match &cli.config {
        Some(path) => EditorConfig::from_file(path)?,
        None => EditorConfig::from_env(),
    };

    match cli.command {
        Command::Render {
            template,
            data,
            page,
            output,
        } => {
            let template = Template::open(&template)?;
            let data = match data {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => Value::Object(Default::default()),
            };
            let mut editor = Editor::new(CLI_DOCUMENT, template, Box::new(MemoryStore::new()))
                .with_config(config)
                .with_live_data(data);
            editor.mount();
            editor.goto_page(page)?;
            write_output(output, editor.export_html().as_bytes())
        }
        Command::Inspect { state } => {
            let state: EditorState = serde_json::from_str(&fs::read_to_string(&state)?)?;
            show_state(&state);
            Ok(())
        }
        Command::Export {
            template,
            state,
            format,
            output,
        } => {
            let template = Template::open(&template)?;
            let state: EditorState = serde_json::from_str(&fs::read_to_string(&state)?)?;
            let store = MemoryStore::with_state(CLI_DOCUMENT, state);
            let mut editor =
                Editor::new(CLI_DOCUMENT, template, Box::new(store)).with_config(config);
            editor.mount();
            let format = match format {
                Format::Html => ExportFormat::Html,
                Format::Json => ExportFormat::Json,
            };
            write_output(output, &editor.export(format, None)?)
        }
    }
}

fn show_state(state: &EditorState) {
    println!("Template: {}", state.template_id);
    println!("Pages: {}", state.pages.len());
    for (index, page) in state.pages.iter().enumerate() {
        let marker = if index == state.current_page_index { "*" } else { " " };
        println!(
            "  {marker} {index}: {} ({} bytes, updated {})",
            page.name,
            page.html.len(),
            page.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!("Style overrides: {}", state.style_mutations.len());
    for (path, patch) in &state.style_mutations {
        let shown = if path.is_root() { "<root>".to_string() } else { path.to_string() };
        println!("  {shown}: {}", patch.to_css());
    }
    if !state.hover_styles.is_empty() {
        println!("Hover styles: {}", state.hover_styles.len());
    }
    println!("Zoom: {:.0}%", state.zoom * 100.0);
    println!("Grid: {}", if state.grid_visible { "on" } else { "off" });
    match state.last_saved_at {
        Some(at) => println!("Last saved: {}", at.to_rfc3339()),
        None => println!("Last saved: never"),
    }
}

fn write_output(output: Option<PathBuf>, bytes: &[u8]) -> vitrine::Result<()> {
    match output {
        Some(path) => fs::write(path, bytes)?,
        None => {
            use std::io::Write;
            std::io::stdout().write_all(bytes)?;
        }
    }
    Ok(())
}

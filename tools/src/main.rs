mod session;
mod table;

use anyhow::{Context as _, Result};
use clap::Parser;
use libime_core::{FilterChain, FilterRegistry, Grammar, SchemaConfig};
use libranking::{GrammarOptions, WordBigramGrammar};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use session::Session;
use table::CodeTable;

/// Drive a filter chain from the terminal.
#[derive(Parser)]
#[command(name = "ime_console")]
struct Args {
    /// TOML schema with the `filters` list and per-filter tables
    #[arg(long)]
    schema: PathBuf,

    /// Code table: code<TAB>text[<TAB>weight] per line
    #[arg(long)]
    table: PathBuf,

    /// Word bigram model, overriding `grammar.model` in the schema
    #[arg(long)]
    grammar: Option<PathBuf>,

    #[arg(long, default_value_t = 5)]
    page_size: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let schema = SchemaConfig::load_toml(&args.schema)
        .with_context(|| format!("load schema {}", args.schema.display()))?;
    let base_dir = args
        .schema
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let grammar = load_grammar(&schema, &base_dir, args.grammar.as_deref())?;

    let mut registry = FilterRegistry::new();
    libopencc::register(&mut registry);
    libranking::register(&mut registry);
    let chain = FilterChain::from_schema(&schema, &registry, grammar);
    info!("filters: {:?}", chain.names());

    let table = CodeTable::load(&args.table)?;
    if table.is_empty() {
        warn!("table {} has no entries", args.table.display());
    }
    println!("✓ Loaded {} table entries from '{}'", table.len(), args.table.display());

    let mut session = Session::new(table, chain, args.page_size);
    println!("Type a code, or a command (`show context` lists the state, `exit` quits).");
    prompt(&session)?;
    for line in io::stdin().lock().lines() {
        let line = line?;
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        for out in session.execute(&line) {
            println!("{}", out);
        }
        prompt(&session)?;
    }
    Ok(())
}

fn prompt(session: &Session) -> Result<()> {
    let ctx = session.context();
    if ctx.is_composing() {
        print!("[{}] > ", ctx.input());
    } else {
        print!("> ");
    }
    io::stdout().flush()?;
    Ok(())
}

fn load_grammar(
    schema: &SchemaConfig,
    base_dir: &Path,
    model: Option<&Path>,
) -> Result<Option<Arc<dyn Grammar>>> {
    let mut options: GrammarOptions = schema.section("grammar")?;
    if let Some(model) = model {
        // Relative to the working directory, not the schema.
        options.model = Some(std::env::current_dir()?.join(model));
    }
    let grammar = WordBigramGrammar::from_options(&options, base_dir)?;
    match &grammar {
        Some(g) => println!("✓ Loaded grammar with {} bigrams", g.model().total_bigrams()),
        None => println!("⚠ No grammar configured, contextual ranking stays idle"),
    }
    Ok(grammar.map(|g| Arc::new(g) as Arc<dyn Grammar>))
}

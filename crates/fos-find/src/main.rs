//! fOS Find - command line front end
//!
//! Runs one query against an HTML file and prints what the find bar would
//! show.

use std::path::PathBuf;

use anyhow::{Context, bail};
use fos_find::{FindConfig, FindEngine, Highlighter, Replacer, Scope};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: fos-find <file.html> <query> [--replace TEXT] [--scope input|page|html] \
[--case-sensitive] [--whole-word] [--hidden] [--editable] [--config FILE]";

struct Args {
    file: PathBuf,
    query: String,
    replacement: Option<String>,
    scope: Option<Scope>,
    case_sensitive: bool,
    whole_word: bool,
    hidden: bool,
    editable: bool,
    config: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut args = Args {
        file: PathBuf::new(),
        query: String::new(),
        replacement: None,
        scope: None,
        case_sensitive: false,
        whole_word: false,
        hidden: false,
        editable: false,
        config: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--replace" => args.replacement = Some(iter.next().context("--replace needs a value")?),
            "--scope" => {
                let value = iter.next().context("--scope needs a value")?;
                args.scope = Some(Scope::parse(&value).with_context(|| format!("unknown scope {value:?}"))?);
            }
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--case-sensitive" => args.case_sensitive = true,
            "--whole-word" => args.whole_word = true,
            "--hidden" => args.hidden = true,
            "--editable" => args.editable = true,
            "-h" | "--help" => bail!(USAGE),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    match (positional.next(), positional.next(), positional.next()) {
        (Some(file), Some(query), None) => {
            args.file = file.into();
            args.query = query;
            Ok(args)
        }
        _ => bail!(USAGE),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => FindConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => FindConfig::default(),
    };

    let mut options = config.search_options();
    options.case_sensitive |= args.case_sensitive;
    options.whole_word |= args.whole_word;
    options.search_hidden |= args.hidden;
    options.include_editable_fields |= args.editable;
    if let Some(scope) = args.scope {
        options.scope = scope;
    }

    let html = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let mut document = fos_html::parse(&html).context("parsing HTML")?;

    let mut engine = FindEngine::new(config.clone());
    let matches = engine.search(&document, &args.query, options.clone()).as_slice().to_vec();
    let mode = engine.search_mode();
    tracing::info!("mode: {}", mode.map_or("-", |m| m.label()));

    for (i, m) in matches.iter().enumerate() {
        println!("{:>5}  {:<16} {:?}", i + 1, format!("{:?}", m.kind()), m.text());
    }
    println!("{}", engine.status_text());

    if let Some(mode) = mode {
        let mut highlighter = Highlighter::new(&config);
        highlighter.highlight_matches(&document, &matches, engine.current_index(), mode);
        tracing::info!(
            "paint model: {} range(s), {} element(s), {} marker(s)",
            highlighter.ranges().len(),
            highlighter.elements().len(),
            highlighter.markers().len()
        );

        if let Some(replacement) = &args.replacement {
            let mut replacer = Replacer::from_config(&config);
            let report =
                replacer.replace_all(&mut document, &matches, replacement, options.scope, mode, &args.query);
            println!("replaced {}, failed {}", report.success_count, report.fail_count);
            for error in &report.errors {
                println!("  {error}");
            }
            println!("{}", fos_html::inner_html(document.tree(), document.body()));
        }
    }

    Ok(())
}

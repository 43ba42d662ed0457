use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use urlgraph_canon::{Canonicalizer, extract_components, get_domain_parts};
use urlgraph_core::data::{SkippedLine, load_pages, load_records, write_jsonl};
use urlgraph_core::model::enrich_records;
use urlgraph_core::report::{
    DiscoveryStats, ExportFormat, GraphReport, ReportFormat, analyze_pages, discovery_stats,
    generate_dedup_json_report, generate_dedup_text_report, generate_json_report,
    generate_text_report, generate_tree_report, generate_tree_summary, save_report,
};
use urlgraph_core::{AnalyzerConfig, CanonicalIndex, CanonicalPartition, LinkGraph, LinkGraphBuilder};

/// Printed to stderr so that reports on stdout stay pipeable.
pub fn print_banner() {
    eprintln!(
        "{} {}",
        "urlgraph".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    eprintln!("{}", "canonical URLs and link graphs for crawl output".bright_black());
    eprintln!();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn spinner(quiet: bool, msg: impl Into<String>) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(msg.into());
    Ok(spinner)
}

fn warn_skipped(skipped: &[SkippedLine]) {
    if skipped.is_empty() {
        return;
    }
    eprintln!(
        "{} Skipped {} malformed line(s)",
        "⚠".yellow().bold(),
        skipped.len()
    );
    for line in skipped.iter().take(5) {
        eprintln!("  {} line {}: {}", "•".yellow(), line.line, line.reason);
    }
}

/// Loads the file named by `--config`, or the default location, or the
/// built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    let expanded = path.map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref()));
    let config = AnalyzerConfig::load_or_default(expanded.as_deref())?;
    Ok(config)
}

fn config_from_args(args: &ArgMatches) -> Result<AnalyzerConfig> {
    load_config(args.get_one::<PathBuf>("config").map(PathBuf::as_path))
}

fn report_format(args: &ArgMatches) -> Result<ReportFormat> {
    let raw = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    ReportFormat::from_str(raw).ok_or_else(|| anyhow!("Unsupported report format: {}", raw))
}

/// Writes `content` to `output` when given, otherwise prints it.
fn emit(content: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            save_report(content, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Writes a default config to `path`. Returns false when the file exists and
/// `force` is not set.
pub fn write_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    AnalyzerConfig::default().save(path)?;
    info!("Wrote default config to {}", path.display());
    Ok(true)
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  URLGRAPH INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let raw_path = args
        .get_one::<String>("PATH")
        .ok_or_else(|| anyhow!("No config path given"))?;
    let path = PathBuf::from(shellexpand::tilde(raw_path).as_ref());
    let mut force = args.get_flag("force");

    println!(
        "{} Target: {}",
        "→".blue(),
        path.display().to_string().bright_white()
    );
    println!();

    if path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A config file already exists at this location.");
        let response = print_prompt("Overwrite it with defaults? [y/N]:")?;
        println!();
        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
        force = true;
    }

    write_default_config(&path, force)?;
    println!(
        "{} Default config written to {}",
        "✓".green().bold(),
        path.display().to_string().bright_white()
    );
    Ok(())
}

pub struct CanonOptions {
    pub normalize: bool,
    pub remove_trackers: bool,
    pub parts: bool,
}

impl Default for CanonOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            remove_trackers: true,
            parts: false,
        }
    }
}

pub fn render_canon(
    canonicalizer: &Canonicalizer,
    urls: &[String],
    options: &CanonOptions,
    format: ReportFormat,
) -> Result<String> {
    let clean = |url: &str| canonicalizer.clean(url, options.normalize, options.remove_trackers);
    let whatwg_error = |url: &str| {
        canonicalizer
            .clean_parsed(url, options.normalize, options.remove_trackers)
            .to_url()
            .err()
            .map(|e| e.to_string())
    };

    match format {
        ReportFormat::Json => {
            let entries: Vec<serde_json::Value> = urls
                .iter()
                .map(|url| {
                    let mut entry = serde_json::json!({
                        "url": url,
                        "canonical": clean(url),
                    });
                    if options.parts {
                        entry["components"] = serde_json::json!(extract_components(url));
                        entry["domain_parts"] = serde_json::json!(get_domain_parts(url));
                        entry["whatwg_error"] = serde_json::json!(whatwg_error(url));
                    }
                    entry
                })
                .collect();
            Ok(serde_json::to_string_pretty(&entries)? + "\n")
        }
        ReportFormat::Text => {
            let mut out = String::new();
            for url in urls {
                if !options.parts {
                    out.push_str(&format!("{}\n", clean(url)));
                    continue;
                }

                let components = extract_components(url);
                let domain = get_domain_parts(url);
                out.push_str(&format!("{}\n", url));
                out.push_str(&format!("  canonical:  {}\n", clean(url)));
                out.push_str(&format!("  scheme:     {}\n", components.scheme));
                out.push_str(&format!("  host:       {}\n", components.hostname));
                if let Some(port) = components.port {
                    out.push_str(&format!("  port:       {}\n", port));
                }
                out.push_str(&format!(
                    "  domain:     {} | {} | {}\n",
                    domain.subdomain, domain.domain, domain.tld
                ));
                out.push_str(&format!(
                    "  path:       {} (depth {})\n",
                    components.path, components.path_depth
                ));
                if components.has_query {
                    out.push_str(&format!(
                        "  query:      {} param(s)\n",
                        components.query_param_count
                    ));
                }
                if components.has_fragment {
                    out.push_str(&format!("  fragment:   {}\n", components.fragment));
                }
                match whatwg_error(url) {
                    None => out.push_str("  whatwg:     valid\n"),
                    Some(e) => out.push_str(&format!("  whatwg:     invalid ({})\n", e)),
                }
                out.push('\n');
            }
            Ok(out)
        }
    }
}

pub fn handle_canon(args: &ArgMatches) -> Result<()> {
    let config = config_from_args(args)?;
    let format = report_format(args)?;

    let mut urls: Vec<String> = args
        .get_many::<String>("URL")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if urls.is_empty() {
        debug!("No URLs given, reading from stdin");
        for line in io::stdin().lock().lines() {
            let line = line?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                urls.push(trimmed.to_string());
            }
        }
    }

    let options = CanonOptions {
        normalize: !args.get_flag("no-normalize"),
        remove_trackers: !args.get_flag("keep-trackers"),
        parts: args.get_flag("parts"),
    };
    let content = render_canon(&config.canonicalizer(), &urls, &options, format)?;
    print!("{}", content);
    Ok(())
}

/// Loads `records` and partitions it by canonical URL.
pub fn dedup_records(
    records: &Path,
    config: &AnalyzerConfig,
) -> Result<(CanonicalPartition, Vec<SkippedLine>)> {
    let batch = load_records(records)?;
    let partition = CanonicalIndex::new(config.canonicalizer()).partition(batch.items);
    Ok((partition, batch.skipped))
}

pub fn handle_dedup(args: &ArgMatches) -> Result<()> {
    let config = config_from_args(args)?;
    let format = report_format(args)?;
    let quiet = args.get_flag("quiet");
    let records = args
        .get_one::<PathBuf>("records")
        .ok_or_else(|| anyhow!("--records is required"))?;

    let progress = spinner(quiet, format!("Canonicalizing {}", records.display()))?;
    let (partition, skipped) = dedup_records(records, &config)?;
    progress.finish_and_clear();
    warn_skipped(&skipped);

    let report = partition.report();
    let content = match format {
        ReportFormat::Text => generate_dedup_text_report(&report),
        ReportFormat::Json => generate_dedup_json_report(&report)? + "\n",
    };
    emit(&content, args.get_one::<PathBuf>("output"))?;

    if let Some(unique_out) = args.get_one::<PathBuf>("unique-out") {
        let written = write_jsonl(partition.representatives(), unique_out)?;
        println!(
            "{} Wrote {} canonical records to {}",
            "✓".green().bold(),
            written,
            unique_out.display().to_string().bright_white()
        );
    }
    Ok(())
}

pub fn render_graph_report(report: &GraphReport, format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => generate_text_report(report),
        ReportFormat::Json => generate_json_report(report)? + "\n",
    })
}

pub fn export_graph(graph: &LinkGraph, path: &Path, format: ExportFormat) -> Result<()> {
    let content = match format {
        ExportFormat::Dot => graph.to_dot(),
        ExportFormat::Json => serde_json::to_string_pretty(&graph.to_edge_list())?,
    };
    save_report(&content, path).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn handle_graph(args: &ArgMatches) -> Result<()> {
    let mut config = config_from_args(args)?;
    let format = report_format(args)?;
    let quiet = args.get_flag("quiet");
    if let Some(top) = args.get_one::<usize>("top") {
        config.top_n = *top;
        config.validate()?;
    }
    let pages = args
        .get_one::<PathBuf>("pages")
        .ok_or_else(|| anyhow!("--pages is required"))?;

    let progress = spinner(quiet, format!("Loading {}", pages.display()))?;
    let batch = load_pages(pages)?;
    progress.set_message(format!("Analyzing {} pages", batch.len()));
    let (graph, report) = analyze_pages(&batch.items, &config);
    progress.finish_and_clear();
    warn_skipped(&batch.skipped);

    emit(
        &render_graph_report(&report, format)?,
        args.get_one::<PathBuf>("output"),
    )?;

    if let Some(export) = args.get_one::<PathBuf>("export") {
        let raw = args
            .get_one::<String>("export-format")
            .map(String::as_str)
            .unwrap_or("dot");
        let export_format = ExportFormat::from_str(raw)
            .ok_or_else(|| anyhow!("Unsupported export format: {}", raw))?;
        export_graph(&graph, export, export_format)?;
        println!(
            "{} Graph exported to {}",
            "✓".green().bold(),
            export.display().to_string().bright_white()
        );
    }
    Ok(())
}

pub fn render_tree(
    graph: &LinkGraph,
    discovery: &DiscoveryStats,
    format: ReportFormat,
) -> Result<String> {
    let stats = graph.stats();
    Ok(match format {
        ReportFormat::Text => {
            generate_tree_report(graph) + "\n" + &generate_tree_summary(&stats, discovery)
        }
        ReportFormat::Json => {
            let edge_list = graph.to_edge_list();
            let tree = serde_json::json!({
                "graph_stats": stats,
                "discovery": discovery,
                "nodes": edge_list.nodes,
                "edges": edge_list.edges,
            });
            serde_json::to_string_pretty(&tree)? + "\n"
        }
    })
}

pub fn handle_tree(args: &ArgMatches) -> Result<()> {
    let config = config_from_args(args)?;
    let format = report_format(args)?;
    let records = args
        .get_one::<PathBuf>("records")
        .ok_or_else(|| anyhow!("--records is required"))?;

    let mut batch = load_records(records)?;
    warn_skipped(&batch.skipped);

    if let Some(pages) = args.get_one::<PathBuf>("pages") {
        let pages = load_pages(pages)?;
        warn_skipped(&pages.skipped);
        let enriched = enrich_records(&mut batch.items, &pages.items);
        debug!("Enriched {} records from crawled pages", enriched);
    }

    let graph = LinkGraphBuilder::new(config.canonicalizer()).from_records(&batch.items);
    let discovery = discovery_stats(&batch.items);

    emit(
        &render_tree(&graph, &discovery, format)?,
        args.get_one::<PathBuf>("output"),
    )
}

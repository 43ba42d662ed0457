use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("urlgraph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("urlgraph")
        .about("Canonical URL deduplication and link-graph analysis for crawl output")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner, progress and informational logs")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Enable debug logging")
                .required(false)
                .global(true)
                .conflicts_with("quiet"),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Config file (default: ~/.config/urlgraph/config.json)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes a default analyzer config file")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Where to write the config")
                        .default_value("~/.config/urlgraph/config.json"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing config without asking")
                        .required(false),
                ),
        )
        .subcommand(
            command!("canon")
                .about("Prints the canonical form of each URL (reads stdin when none are given)")
                .arg(arg!([URL] ...).required(false).help("URLs to canonicalize"))
                .arg(
                    arg!(--"parts")
                        .required(false)
                        .help("Also show URL components and domain parts")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-normalize")
                        .required(false)
                        .help("Only strip tracking parameters")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"keep-trackers")
                        .required(false)
                        .help("Only normalize, keep tracking parameters")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(format_arg()),
        )
        .subcommand(
            command!("dedup")
                .about("Groups crawl records by canonical URL and reports duplicates")
                .arg(
                    arg!(-r --"records" <PATH>)
                        .required(true)
                        .help("URL records file (JSON Lines)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(output_arg())
                .arg(format_arg())
                .arg(
                    arg!(--"unique-out" <PATH>)
                        .required(false)
                        .help("Write one record per canonical URL to this JSON Lines file")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            command!("graph")
                .about("Builds the page link graph and reports PageRank, HITS, centrality and page types")
                .arg(
                    arg!(-p --"pages" <PATH>)
                        .required(true)
                        .help("Page content file (JSON Lines)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(output_arg())
                .arg(format_arg())
                .arg(
                    arg!(--"top" <N>)
                        .required(false)
                        .help("Entries per ranking (default: top_n from config)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"export" <PATH>)
                        .required(false)
                        .help("Also write the graph itself to this file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"export-format" <FORMAT>)
                        .required(false)
                        .help("Graph export format: dot, json")
                        .value_parser(["dot", "json"])
                        .default_value("dot"),
                ),
        )
        .subcommand(
            command!("tree")
                .about("Prints the discovery tree built from parent links in crawl records, with tree stats")
                .arg(
                    arg!(-r --"records" <PATH>)
                        .required(true)
                        .help("URL records file (JSON Lines)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-p --"pages" <PATH>)
                        .required(false)
                        .help("Crawled pages file (JSON Lines) used to fill in status codes and titles")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(output_arg())
                .arg(format_arg()),
        )
}

fn output_arg() -> clap::Arg {
    arg!(-o --"output" <PATH>)
        .required(false)
        .help("Save report to file (default: display to screen)")
        .value_parser(clap::value_parser!(PathBuf))
}

fn format_arg() -> clap::Arg {
    arg!(-f --"format" <FORMAT>)
        .required(false)
        .help("Report format: text, json")
        .value_parser(["text", "json"])
        .default_value("text")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_valid() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_global_config_reaches_subcommand() {
        let matches = command_argument_builder()
            .try_get_matches_from(["urlgraph", "dedup", "-r", "urls.jsonl", "-c", "cfg.json"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(
            sub.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("cfg.json"))
        );
        assert_eq!(sub.get_one::<String>("format").map(String::as_str), Some("text"));
    }

    #[test]
    fn test_graph_requires_pages() {
        assert!(
            command_argument_builder()
                .try_get_matches_from(["urlgraph", "graph"])
                .is_err()
        );
    }
}

#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{
    CanonOptions, dedup_records, export_graph, load_config, render_canon, render_graph_report,
    render_tree, write_default_config,
};

//! Example: List the datasets, nodes and data items a DVID server holds
//!
//! Run with: cargo run --example list_datasets -- localhost:8000

use anyhow::Context;
use dvid_volume::{list_datasets, ClientConfig, HttpConnection};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let hostname = std::env::args()
        .nth(1)
        .context("usage: list_datasets <hostname[:port]>")?;

    let config = ClientConfig::default();
    let mut connection = HttpConnection::connect(&hostname, &config)?;
    let listing = list_datasets(&mut connection, &config.api_root)
        .with_context(|| format!("couldn't list the datasets on {}", hostname))?;

    println!("Datasets on {}", connection.base_url());
    println!("==========={}\n", "=".repeat(connection.base_url().len()));

    if listing.data_items.is_empty() {
        println!("(none)");
    }
    for id in listing.dataset_ids() {
        println!("Dataset {}", id);
        println!("  Nodes:");
        for node in &listing.node_ids[id] {
            println!("    {}", node);
        }
        println!("  Data:");
        for name in &listing.data_items[id] {
            println!("    {}", name);
        }
        println!();
    }

    Ok(())
}

use anyhow::Result;
use strata::config::StrataConfig;
use strata::graph::navigate::{navigate as neighbours, Neighbor};

/// Print a document's neighbourhood.
pub fn navigate(config: &StrataConfig, id: &str, include_hierarchy: bool) -> Result<()> {
    let index = super::open_index(config)?;
    let graph = super::require_graph(&index)?;
    let hood = neighbours(&graph, id, include_hierarchy)?;

    println!("{}", hood.id);
    println!("{}", "=".repeat(40));
    print_group("Links to", &hood.outbound);
    print_group("Linked from", &hood.inbound);
    if let Some(parents) = &hood.parents {
        print_group("Parents", parents);
    }
    if let Some(children) = &hood.children {
        print_group("Children", children);
    }
    if let Some(siblings) = &hood.siblings {
        print_group("Siblings", siblings);
    }

    Ok(())
}

fn print_group(label: &str, items: &[Neighbor]) {
    println!("{label}:");
    if items.is_empty() {
        println!("  (none)");
    }
    for n in items {
        println!("  {:<40} {}", n.id, n.title);
    }
    println!();
}

//! CLI example that builds an item hierarchy from a JSON payload and prints
//! the visible sequence before and after expanding a group
//!
//! Usage:
//!   cargo run --example print_visible
//!
//! Set RUST_LOG=debug to watch the tree's mutation logging.

use heatmap_index::prelude::*;

const PAYLOAD: &str = r#"{
    "name": "editions",
    "is_open": true,
    "children": [
        { "name": "Hamlet", "values": [12.0, 3.0, 7.0], "projection": { "x": 0.4, "y": -0.2 } },
        {
            "name": "Histories",
            "is_open": false,
            "children": [
                { "name": "Henry V", "values": [5.0, 1.0, 9.0] },
                { "name": "Richard III", "values": [8.0, 2.0, 4.0] }
            ]
        },
        { "name": "Macbeth", "values": [10.0, 6.0, 2.0] }
    ]
}"#;

fn main() {
    env_logger::init();

    let payload: NodePayload = match serde_json::from_str(PAYLOAD) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("Error parsing payload: {}", e);
            std::process::exit(1);
        }
    };

    let sorter = Sorter::with_criteria(vec![
        Box::new(ByHasChildren::new(false)),
        Box::new(ByName::new(false)),
    ]);

    let mut tree = match HierarchyTree::items(&payload, sorter) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Error building tree: {}", e);
            std::process::exit(1);
        }
    };

    println!("Total nodes: {}", tree.total_count());
    println!();
    println!("Visible rows (groups closed):");
    print_visible(&tree);

    // Open the one closed group and show how positions shift.
    let histories = tree
        .visible_nodes()
        .into_iter()
        .find(|&id| tree[id].has_children() && id != tree.root())
        .expect("payload contains a group");
    tree.toggle_expansion(histories);

    println!();
    println!("Visible rows after expanding '{}':", tree[histories].name);
    print_visible(&tree);

    println!();
    println!("Max visible depth: {}", tree.max_depth());
}

fn print_visible(tree: &HierarchyTree) {
    for id in tree.visible_nodes() {
        let node = &tree[id];
        let indent = "  ".repeat(node.depth().max(0) as usize);
        let marker = if node.has_children() {
            if node.is_open() {
                "▼"
            } else {
                "▶"
            }
        } else {
            "·"
        };
        println!("  [{:>2}] {}{} {}", node.position(), indent, marker, node.name);
    }
}

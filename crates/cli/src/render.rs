//! Plain-text rendering of cluster views for the terminal.

use std::fmt::Write;

use shardwatch_activity_log::ActivityEvent;
use shardwatch_monitor::ClusterView;
use shardwatch_node_client::{InventoryListing, NodeProbe, NodeStatus};

pub fn view(view: &ClusterView) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "cycle {} at {} ({}/{} online){}",
        view.cycle,
        view.refreshed_at.format("%H:%M:%S"),
        view.snapshot.online_count(),
        view.snapshot.len(),
        if view.healing { " HEALING" } else { "" }
    );
    for status in view.snapshot.iter() {
        let _ = writeln!(out, "  {}", node(status));
    }
    if let Some(latest) = view.activity.first() {
        let _ = writeln!(out, "  latest: {}", event(latest));
    }

    out
}

pub fn node(status: &NodeStatus) -> String {
    match &status.probe {
        NodeProbe::Online(payload) => {
            let usage = payload
                .storage_usage()
                .map_or_else(|| "?".to_string(), |count| count.to_string());
            format!(
                "{:<4} online   storage={} peers={}",
                status.node_id,
                usage,
                payload.peers().len()
            )
        }
        NodeProbe::Unreachable => format!("{:<4} offline", status.node_id),
        NodeProbe::Error(detail) => format!("{:<4} offline  ({detail})", status.node_id),
    }
}

pub fn event(event: &ActivityEvent) -> String {
    format!(
        "{} [{}] {}",
        event.time.format("%Y-%m-%d %H:%M:%S"),
        event.server,
        event.action
    )
}

pub fn inventory(listing: &InventoryListing) -> String {
    let mut out = String::new();
    for (master_hash, chunks) in listing {
        let _ = writeln!(out, "{master_hash} ({} chunks)", chunks.len());
        for chunk in chunks {
            let _ = writeln!(out, "  {chunk}");
        }
    }
    out
}

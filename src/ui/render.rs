use super::styles::*;
use crate::types::{ContextSummary, ImportCandidate};

const NONE: &str = "-";

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).chain(std::iter::once(header.len())).max().unwrap_or(0)
}

pub fn format_contexts(contexts: &[ContextSummary]) -> Vec<String> {
    let name_w = column_width("NAME", contexts.iter().map(|c| c.name.as_str()));
    let cluster_w = column_width("CLUSTER", contexts.iter().map(|c| c.cluster.as_str()));
    let user_w = column_width("USER", contexts.iter().map(|c| c.user.as_str()));

    let mut lines = vec![format!(
        "  {:name_w$}  {:cluster_w$}  {:user_w$}  NAMESPACE",
        "NAME", "CLUSTER", "USER"
    )];
    for ctx in contexts {
        lines.push(format!(
            "{} {:name_w$}  {:cluster_w$}  {:user_w$}  {}",
            if ctx.is_current { "*" } else { " " },
            ctx.name,
            ctx.cluster,
            ctx.user,
            ctx.namespace.as_deref().unwrap_or(NONE)
        ));
    }
    lines
}

pub fn render_contexts(contexts: &[ContextSummary]) {
    if contexts.is_empty() {
        println!("{}", dim_style().apply("No contexts configured"));
        return;
    }
    let lines = format_contexts(contexts);
    println!("{}", dim_style().apply(&lines[0]));
    for (line, ctx) in lines.iter().skip(1).zip(contexts) {
        if ctx.is_current {
            println!("{}", current_marker_style().apply(line));
        } else {
            println!("{}", line);
        }
    }
}

pub fn format_import_candidates(candidates: &[ImportCandidate]) -> Vec<String> {
    let name_w = column_width("NAME", candidates.iter().map(|c| c.name.as_str()));
    let server_w = column_width(
        "SERVER",
        candidates.iter().map(|c| c.server.as_deref().unwrap_or(NONE)),
    );

    let mut lines = vec![format!("{:name_w$}  {:server_w$}  STATUS", "NAME", "SERVER")];
    for candidate in candidates {
        let status = match (candidate.has_conflict, candidate.certificate_changed) {
            (false, _) => "new",
            (true, false) => "conflict",
            (true, true) => "conflict, credentials changed",
        };
        lines.push(format!(
            "{:name_w$}  {:server_w$}  {}",
            candidate.name,
            candidate.server.as_deref().unwrap_or(NONE),
            status
        ));
    }
    lines
}

pub fn render_import_candidates(candidates: &[ImportCandidate]) {
    for line in format_import_candidates(candidates) {
        println!("{}", line);
    }
}

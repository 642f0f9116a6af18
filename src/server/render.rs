//! HTML rendering of an aggregation result

use crate::resource::{AggregationResult, ResourceSummary};

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn group_label(summary: &ResourceSummary) -> &str {
    if summary.group.is_empty() {
        "core"
    } else {
        &summary.group
    }
}

fn object_cell(summary: &ResourceSummary, name: &str) -> String {
    match summary.labels.get(name) {
        Some(labels) if !labels.is_empty() => {
            let labels = labels
                .iter()
                .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("<li>{} <small>{}</small></li>", escape(name), labels)
        }
        _ => format!("<li>{}</li>", escape(name)),
    }
}

/// Render the result as a standalone HTML page with one row per kind
pub fn render_html(result: AggregationResult) -> String {
    let summaries = result.into_sorted();
    let total: usize = summaries.iter().map(|s| s.names.len()).sum();

    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Cluster resources</title>\n\
         <style>\
         body{font-family:sans-serif;margin:2em}\
         table{border-collapse:collapse;width:100%}\
         th,td{border:1px solid #ccc;padding:4px 8px;text-align:left;vertical-align:top}\
         th{background:#eee}ul{margin:0;padding-left:1.2em}small{color:#666}\
         </style>\n</head>\n<body>\n",
    );

    html.push_str(&format!(
        "<h1>Cluster resources</h1>\n<p>{} kinds, {} objects</p>\n",
        summaries.len(),
        total
    ));
    html.push_str(
        "<table>\n<thead><tr><th>Resource</th><th>Group</th><th>Version</th>\
         <th>Count</th><th>Objects</th></tr></thead>\n<tbody>\n",
    );

    for summary in &summaries {
        let objects: String = summary
            .names
            .iter()
            .map(|name| object_cell(summary, name))
            .collect();
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><ul>{}</ul></td></tr>\n",
            escape(&summary.resource_name),
            escape(group_label(summary)),
            escape(&summary.version),
            summary.names.len(),
            objects
        ));
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

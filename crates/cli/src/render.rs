use chrono::Local;
use lanshare_core::format::{format_size, format_upload_date, FileKind};
use lanshare_core::models::FileItem;

const ANALYZING: &str = "(analyzing...)";

pub fn render_table(items: &[&FileItem]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<34} {:<9} {:>9} {:<13} {}\n",
        "ID", "KIND", "SIZE", "UPLOADED", "NAME"
    ));
    for f in items {
        out.push_str(&format!(
            "{:<34} {:<9} {:>9} {:<13} {}\n",
            f.id,
            FileKind::from_mime(&f.mime).label(),
            format_size(f.size),
            format_upload_date(&f.uploaded_at.with_timezone(&Local)),
            f.name
        ));
        if f.analyzing {
            out.push_str(&format!("{:>36}{}\n", "", ANALYZING));
        } else if let Some(desc) = &f.description {
            out.push_str(&format!("{:>36}{}\n", "", desc));
        }
        if let Some(tags) = f.tags.as_ref().filter(|t| !t.is_empty()) {
            let tags: Vec<String> = tags.iter().map(|t| format!("#{t}")).collect();
            out.push_str(&format!("{:>36}{}\n", "", tags.join(" ")));
        }
    }
    out
}

pub fn render_json(items: &[&FileItem]) -> serde_json::Result<String> {
    let rows: Vec<serde_json::Value> = items
        .iter()
        .map(|f| {
            serde_json::json!({
                "id": f.id,
                "name": f.name,
                "size": f.size,
                "size_display": format_size(f.size),
                "type": f.mime,
                "kind": FileKind::from_mime(&f.mime),
                "uploaded_at": f.uploaded_at,
                "description": f.description,
                "tags": f.tags,
                "analyzing": f.analyzing,
            })
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}

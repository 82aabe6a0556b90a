//! Human-readable renderings of file attributes.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// `0 B`, `1.2 KB`, `5.3 MB`; base 1024 with a trailing `.0` dropped.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0} {}", rounded, SIZE_UNITS[unit])
    } else {
        format!("{:.1} {}", rounded, SIZE_UNITS[unit])
    }
}

/// Size as it is described to the annotation model.
pub fn size_label(bytes: u64) -> String {
    format!("{:.2}KB", bytes as f64 / 1024.0)
}

/// Short zh-CN date, e.g. `10月18日 14:03`.
pub fn format_upload_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%-m月%-d日 %H:%M").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Archive,
    Code,
    Document,
}

impl FileKind {
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        if mime.starts_with("image/") {
            FileKind::Image
        } else if mime.starts_with("video/") {
            FileKind::Video
        } else if mime.starts_with("audio/") {
            FileKind::Audio
        } else if mime.contains("zip") || mime.contains("compressed") {
            FileKind::Archive
        } else if mime.contains("javascript") || mime.contains("html") || mime.contains("css") {
            FileKind::Code
        } else {
            FileKind::Document
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Archive => "archive",
            FileKind::Code => "code",
            FileKind::Document => "document",
        }
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use colored::*;
use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use bmcfleet_common::device::DeviceRecord;
use bmcfleet_core::discovery::ProbeObserver;

use crate::terminal::colors;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

/// Style of every span shown with `indicatif.pb_show`.
pub fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}

/// Spinner message updater for a discovery run over `total` targets.
pub fn discovery_progress(span: Span, total: usize) -> ProbeObserver {
    let probed = Arc::new(AtomicUsize::new(0));
    let found = Arc::new(AtomicUsize::new(0));

    span.pb_set_message(&progress_message(0, total, 0));

    Arc::new(move |record: &DeviceRecord| {
        let probed = probed.fetch_add(1, Ordering::Relaxed) + 1;
        let found = if record.responded() {
            found.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            found.load(Ordering::Relaxed)
        };
        span.pb_set_message(&progress_message(probed, total, found));
    })
}

fn progress_message(probed: usize, total: usize, found: usize) -> String {
    format!(
        "Probed {}/{} targets, {} controllers so far...",
        probed.to_string().bold(),
        total,
        found.to_string().green().bold()
    )
    .color(colors::TEXT_DEFAULT)
    .to_string()
}

pub fn refresh_message(kind: &str, members: usize) -> String {
    format!(
        "Refreshing {} of {} members...",
        kind.bold(),
        members.to_string().green().bold()
    )
    .color(colors::TEXT_DEFAULT)
    .to_string()
}

//! The photo view's bottom dock: metadata list and download button.

use crate::manifest::MetaField;
use crate::metadata::format_date_time_label;

pub const DATE_LABEL: &str = "Date";
pub const DOWNLOAD_LABEL: &str = "Download";
pub const DOWNLOAD_BUSY_LABEL: &str = "Preparing";

/// What the metadata area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockMeta {
    Loading,
    Hidden,
    Items(Vec<MetaField>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaDock {
    image_ready: bool,
    items: Option<Vec<MetaField>>,
}

impl MetaDock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata arrived. The date (if any) goes first.
    pub fn set_metadata(&mut self, date: Option<&str>, fields: &[MetaField]) {
        let mut items = Vec::with_capacity(fields.len() + 1);
        if let Some(label) = date.and_then(format_date_time_label) {
            items.push(MetaField::new(DATE_LABEL, label));
        }
        items.extend(fields.iter().cloned());
        self.items = Some(items);
    }

    pub fn on_image_ready(&mut self) {
        self.image_ready = true;
    }

    pub fn state(&self) -> DockMeta {
        match (&self.items, self.image_ready) {
            (Some(items), true) if items.is_empty() => DockMeta::Hidden,
            (Some(items), true) => DockMeta::Items(items.clone()),
            _ => DockMeta::Loading,
        }
    }

    /// Rendered `label: value` lines; empty unless items are showing.
    pub fn lines(&self) -> Vec<String> {
        match self.state() {
            DockMeta::Items(items) => items
                .iter()
                .map(|f| format!("{}: {}", f.label, f.value))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DownloadState {
    #[default]
    Idle,
    Busy,
}

/// Download button. Busy while an export runs, idle again afterwards
/// whatever the outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadButton {
    state: DownloadState,
}

impl DownloadButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DownloadState {
        self.state
    }

    pub fn label(&self) -> &'static str {
        match self.state {
            DownloadState::Idle => DOWNLOAD_LABEL,
            DownloadState::Busy => DOWNLOAD_BUSY_LABEL,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state == DownloadState::Idle
    }

    /// Run `export` with the button busy. `None` when already busy.
    pub fn run<T, E>(&mut self, export: impl FnOnce() -> Result<T, E>) -> Option<Result<T, E>> {
        if !self.is_enabled() {
            return None;
        }
        self.state = DownloadState::Busy;
        let result = export();
        self.state = DownloadState::Idle;
        Some(result)
    }
}

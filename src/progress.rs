use std::{borrow::Cow, sync::Arc};

use parking_lot::Mutex;

use crate::config::Config;

const KNOWN_TOTAL_TEMPLATE: &str =
    "{prefix}{spinner:.green} [{bar:40.cyan/blue}] {binary_bytes}/{binary_total_bytes} {binary_bytes_per_sec} ({eta}) {wide_msg}";
const UNKNOWN_TOTAL_TEMPLATE: &str =
    "{prefix}{spinner:.green} {binary_bytes} {binary_bytes_per_sec} {wide_msg}";
const COUNTED_TEMPLATE: &str =
    "{prefix}{spinner:.green} [{bar:40.cyan/blue}] {human_pos}/{human_len} {wide_msg}";
const SPINNER_TEMPLATE: &str = "{prefix}{spinner:.green} {wide_msg}";

pub struct ProgressBar {
    inner: indicatif::ProgressBar,
    children: Mutex<Vec<Arc<ProgressBar>>>,
}

/// Owns the `MultiProgress` every bar draws into. Hidden entirely when
/// progress is disabled in the config.
#[derive(Debug)]
pub struct ProgressBarManager {
    root: indicatif::MultiProgress,
}

impl ProgressBar {
    fn new_root() -> Self {
        let style = indicatif::ProgressStyle::default_bar()
            .template(UNKNOWN_TOTAL_TEMPLATE)
            .unwrap();
        let inner = indicatif::ProgressBar::new_spinner().with_style(style);
        Self {
            inner,
            children: Mutex::new(Vec::new()),
        }
    }

    fn bar(&self) -> &indicatif::ProgressBar {
        &self.inner
    }

    fn switch_to_unknown_template(&self) {
        self.inner.set_style(
            indicatif::ProgressStyle::default_bar()
                .template(UNKNOWN_TOTAL_TEMPLATE)
                .unwrap(),
        );
    }

    fn switch_to_known_template(&self, total: u64) {
        self.inner.set_style(
            indicatif::ProgressStyle::default_bar()
                .template(KNOWN_TOTAL_TEMPLATE)
                .unwrap()
                .progress_chars("##-"),
        );
        self.inner.set_length(total);
    }

    /// Switch to a message-only spinner.
    pub fn switch_to_spinner(&self) {
        self.inner.set_style(
            indicatif::ProgressStyle::default_bar()
                .template(SPINNER_TEMPLATE)
                .unwrap(),
        );
    }

    /// Switch to an item-counting bar of the given length.
    pub fn switch_to_counted(&self, total: u64) {
        self.inner.set_style(
            indicatif::ProgressStyle::default_bar()
                .template(COUNTED_TEMPLATE)
                .unwrap()
                .progress_chars("##-"),
        );
        self.inner.set_length(total);
    }

    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    pub fn set_message(&self, msg: impl Into<Cow<'static, str>>) {
        self.inner.set_message(msg);
    }

    pub fn finish(&self, msg: impl Into<Cow<'static, str>>) {
        self.inner.finish_with_message(msg);
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    pub fn update_template(&self, total: Option<u64>) {
        if let Some(total) = total {
            self.switch_to_known_template(total);
        } else {
            self.switch_to_unknown_template();
        }
    }

    pub fn inc(&self, n: u64) {
        self.inner.inc(n);
    }
}

impl ProgressBarManager {
    pub fn new(config: &Config) -> Self {
        let root = if config.progress() {
            indicatif::MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::stderr())
        } else {
            indicatif::MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden())
        };
        Self { root }
    }

    pub fn add_root(&self) -> Arc<ProgressBar> {
        let bar = Arc::new(ProgressBar::new_root());
        self.root.add(bar.inner.clone());
        bar
    }

    /// Add a bar below its parent, after any earlier siblings.
    pub fn add_child(&self, parent: &Arc<ProgressBar>) -> Arc<ProgressBar> {
        let bar = Arc::new(ProgressBar::new_root());
        let previous_bar = {
            let mut children = parent.children.lock();
            let previous = children
                .last()
                .map(|last| last.bar().clone())
                .unwrap_or_else(|| parent.bar().clone());
            children.push(bar.clone());
            previous
        };
        self.root.insert_after(&previous_bar, bar.bar().clone());
        bar
    }
}

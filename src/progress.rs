// src/progress.rs

//! Byte-level progress of tarball downloads.
#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Receives the progress of one download at a time.
///
/// A download calls [`start`](Self::start) once, [`advance`](Self::advance) for
/// every chunk written and [`finish`](Self::finish) when the file is complete.
/// `finish` is not called for failed downloads.
///
/// # Examples
///
/// ```
/// use gitsnap::progress::ProgressReporter;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// #[derive(Default)]
/// struct Counter(AtomicU64);
///
/// impl ProgressReporter for Counter {
///     fn start(&self, _total: Option<u64>) {
///         self.0.store(0, Ordering::SeqCst);
///     }
///     fn advance(&self, bytes: u64) {
///         self.0.fetch_add(bytes, Ordering::SeqCst);
///     }
///     fn finish(&self) {}
/// }
///
/// let counter = Counter::default();
/// counter.start(Some(8192));
/// counter.advance(4096);
/// counter.advance(4096);
/// assert_eq!(counter.0.load(Ordering::SeqCst), 8192);
/// ```
pub trait ProgressReporter: Send + Sync {
    /// A download begins; `total` is the announced size, if the server sent one.
    fn start(&self, total: Option<u64>);
    /// `bytes` more bytes were written.
    fn advance(&self, bytes: u64);
    /// The download completed.
    fn finish(&self);
}

/// Ignores all progress.
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    fn start(&self, _total: Option<u64>) {}
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
}

/// Draws an `indicatif` bar on stderr: a byte bar when the size is known, a
/// spinner with a byte count otherwise.
#[cfg(feature = "progress")]
#[derive(Clone)]
pub struct IndicatifProgress {
    bar: ProgressBar,
}

#[cfg(feature = "progress")]
impl IndicatifProgress {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    fn style(total: Option<u64>) -> ProgressStyle {
        let template = match total {
            Some(_) => "{spinner:.green} tarball [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
            None => "{spinner:.green} tarball {bytes} ({bytes_per_sec})",
        };
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }
}

#[cfg(feature = "progress")]
impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "progress")]
impl ProgressReporter for IndicatifProgress {
    fn start(&self, total: Option<u64>) {
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_style(Self::style(total));
        self.bar.set_length(total.unwrap_or(0));
        self.bar.reset();
    }

    fn advance(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

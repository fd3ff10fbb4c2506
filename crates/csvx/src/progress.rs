//! Read progress reporting.
//!
//! [`ProgressReader`] wraps a byte source of known size, counts the bytes
//! that pass through it, and periodically renders a status line such as
//! `"12.3 MB/45.6 MB (2.1 MB/s; 15s estimated)"`. When everything has been
//! read the line becomes `"read 45.6 MB in 21.402s"`.
//!
//! The throughput shown is a trailing average over a fixed window of rate
//! samples, one sample per draw.

use std::io::{self, Read};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

/// Number of rate samples averaged by default.
pub const DEFAULT_WINDOW: usize = 30;

/// Minimum time between two redraws by default.
pub const DEFAULT_DRAW_INTERVAL: Duration = Duration::from_secs(1);

const BYTE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Formats a byte count with decimal units and three significant digits.
///
/// Counts that round up to 1000 move to the next unit. Past the largest
/// unit the number switches to exponent form, e.g. `1.84e+04 PB`.
pub fn format_bytes(n: u64) -> String {
    let mut size = n as f64;
    let mut unit = 0;
    while unit + 1 < BYTE_UNITS.len() && round_significant(size, 3) >= 1000.0 {
        size /= 1000.0;
        unit += 1;
    }
    format!("{} {}", significant(size, 3), BYTE_UNITS[unit])
}

/// Number of digits before the decimal point, negative for values below 0.1.
fn magnitude(value: f64) -> i32 {
    value.abs().log10().floor() as i32 + 1
}

/// Rounds `value` to `digits` significant digits.
fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let shift = digits - magnitude(value);
    if shift >= 0 {
        let factor = 10f64.powi(shift);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-shift);
        (value / factor).round() * factor
    }
}

/// Formats `value` with at most `digits` significant digits, dropping
/// trailing zeros. Values needing more integer digits use exponent form.
fn significant(value: f64, digits: i32) -> String {
    let rounded = round_significant(value, digits);
    if rounded == 0.0 || !rounded.is_finite() {
        return format!("{rounded}");
    }
    let magnitude = magnitude(rounded);
    if magnitude > digits {
        return exponent(rounded, digits);
    }
    let decimals = (digits - magnitude).max(0) as usize;
    trim_fraction(&format!("{rounded:.decimals$}"))
}

fn exponent(value: f64, digits: i32) -> String {
    let precision = (digits - 1).max(0) as usize;
    let formatted = format!("{value:.precision$e}");
    let (mantissa, exp) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or_default();
    format!("{}e{exp:+03}", trim_fraction(mantissa))
}

fn trim_fraction(formatted: &str) -> String {
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted.to_string()
    }
}

/// Formats a duration as hours, minutes, and seconds, e.g. `1h2m3.5s`.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    if d < Duration::from_secs(1) {
        return format!("{}ms", significant(d.as_secs_f64() * 1000.0, 6));
    }

    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = (total_secs % 60) as f64 + f64::from(d.subsec_millis()) / 1000.0;
    let seconds = significant(seconds, 5);

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Renders status lines from (bytes read, total bytes) pairs.
///
/// Holds a ring of the last `window` rate samples. A sample is taken on each
/// call that comes after a nonzero amount of time; zero samples are left out
/// of the average.
#[derive(Debug, Clone)]
pub struct TimeRemainingFormatter {
    rates: Vec<u64>,
    cursor: usize,
    start: Instant,
    last_time: Instant,
    last_progress: u64,
}

impl TimeRemainingFormatter {
    pub fn new(window: usize) -> Self {
        Self::starting_at(window, Instant::now())
    }

    /// Creates a formatter whose session started at `start`.
    pub fn starting_at(window: usize, start: Instant) -> Self {
        Self {
            rates: vec![0; window.max(1)],
            cursor: 0,
            start,
            last_time: start,
            last_progress: 0,
        }
    }

    /// Moves the sampling baseline to `now` without recording a sample.
    pub fn mark(&mut self, progress: u64, now: Instant) {
        self.last_time = now;
        self.last_progress = progress;
    }

    pub fn format(&mut self, progress: u64, total: u64) -> String {
        self.format_at(progress, total, Instant::now())
    }

    /// Records a sample at `now` and renders the status line.
    pub fn format_at(&mut self, progress: u64, total: u64, now: Instant) -> String {
        let elapsed = now.saturating_duration_since(self.last_time);
        if !elapsed.is_zero() {
            let block = progress.saturating_sub(self.last_progress);
            self.rates[self.cursor] = (block as f64 / elapsed.as_secs_f64()) as u64;
            self.cursor = (self.cursor + 1) % self.rates.len();
        }
        self.last_time = now;
        self.last_progress = progress;

        if progress >= total {
            return format!(
                "read {} in {}",
                format_bytes(total),
                format_duration(now.saturating_duration_since(self.start))
            );
        }

        let rate = self.average_rate();
        let remaining = if rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs((total - progress) / rate)
        };

        format!(
            "{}/{} ({}/s; {} estimated)",
            format_bytes(progress),
            format_bytes(total),
            format_bytes(rate),
            format_duration(remaining)
        )
    }

    /// Mean of the nonzero rate samples, in bytes per second.
    pub fn average_rate(&self) -> u64 {
        let (sum, count) = self
            .rates
            .iter()
            .filter(|&&rate| rate != 0)
            .fold((0u64, 0u64), |(sum, count), &rate| {
                (sum.saturating_add(rate), count + 1)
            });
        if count == 0 { 0 } else { sum / count }
    }
}

/// Receives rendered status lines.
pub trait DrawTarget {
    /// Replaces the current status line.
    fn draw(&mut self, line: &str);

    /// Shows the final line. Called once per session.
    fn finish(&mut self, line: &str);
}

/// Terminal status line backed by an `indicatif` progress bar.
pub struct TerminalDraw {
    bar: ProgressBar,
}

impl TerminalDraw {
    /// Draws to standard error.
    pub fn stderr() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Draws nowhere.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        let style =
            ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        Self { bar }
    }
}

impl DrawTarget for TerminalDraw {
    fn draw(&mut self, line: &str) {
        self.bar.set_message(line.to_string());
    }

    fn finish(&mut self, line: &str) {
        self.bar.finish_with_message(line.to_string());
    }
}

/// Adapts a closure into a [`DrawTarget`]. The final line goes through the
/// same closure.
pub struct DrawFn<F>(pub F);

impl<F: FnMut(&str)> DrawTarget for DrawFn<F> {
    fn draw(&mut self, line: &str) {
        (self.0)(line);
    }

    fn finish(&mut self, line: &str) {
        (self.0)(line);
    }
}

/// Where a reader's progress line goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressSink {
    #[default]
    Stderr,
    Hidden,
}

/// Progress reporting settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressOptions {
    /// Number of rate samples in the moving average.
    pub window: usize,
    /// Minimum time between redraws.
    pub interval: Duration,
    pub sink: ProgressSink,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            interval: DEFAULT_DRAW_INTERVAL,
            sink: ProgressSink::default(),
        }
    }
}

impl ProgressOptions {
    #[must_use]
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: ProgressSink) -> Self {
        self.sink = sink;
        self
    }

    /// Builds the draw target selected by `sink`.
    pub fn draw_target(&self) -> Box<dyn DrawTarget> {
        match self.sink {
            ProgressSink::Stderr => Box::new(TerminalDraw::stderr()),
            ProgressSink::Hidden => Box::new(TerminalDraw::hidden()),
        }
    }
}

/// A `Read` decorator that reports progress against a known total size.
pub struct ProgressReader<R> {
    inner: R,
    read: u64,
    total: u64,
    interval: Duration,
    last_draw: Option<Instant>,
    formatter: TimeRemainingFormatter,
    target: Box<dyn DrawTarget>,
    finished: bool,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, total: u64, options: ProgressOptions, target: Box<dyn DrawTarget>) -> Self {
        Self {
            inner,
            read: 0,
            total,
            interval: options.interval,
            last_draw: None,
            formatter: TimeRemainingFormatter::new(options.window),
            target,
            finished: false,
        }
    }

    /// Bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Draws the final line. Later calls do nothing.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let line = self.formatter.format(self.read, self.total);
        self.target.finish(&line);
        debug!(bytes = self.read, total = self.total, "finished reading");
    }

    fn maybe_draw(&mut self) {
        let now = Instant::now();
        match self.last_draw {
            // The first chunk arrives before any reading time has passed.
            None => self.formatter.mark(self.read, now),
            Some(last) if now.saturating_duration_since(last) < self.interval => return,
            Some(_) => {}
        }
        self.last_draw = Some(now);
        let line = self.formatter.format_at(self.read, self.total, now);
        self.target.draw(&line);
    }
}

impl<R> Drop for ProgressReader<R> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        if self.finished {
            return Ok(n);
        }
        if (n == 0 && !buf.is_empty()) || self.read >= self.total {
            self.finish();
        } else {
            self.maybe_draw();
        }
        Ok(n)
    }
}

//! # Diagnostic stack capture with a growing buffer.
//!
//! [`StackTrace`] asks a [`StackSource`] to write a dump into a fixed-size
//! buffer. A dump that fills the buffer is treated as truncated: the buffer is
//! doubled and the capture repeated until the dump fits.
//!
//! ```text
//! buf = [0; initial]
//! loop {
//!   n = source.write_stack(&mut buf)
//!   n <  buf.len() ─► return buf[..n]
//!   n >= buf.len() ─► buf = [0; 2 * buf.len()]
//! }
//! ```
//!
//! The default [`BacktraceSource`] renders the calling thread's backtrace
//! (captured unconditionally, regardless of `RUST_BACKTRACE`).

use std::backtrace::Backtrace;

/// Initial capture buffer size in bytes.
pub const DEFAULT_STACK_BUFFER: usize = 10_000;

/// Something that can write a textual stack dump into a caller-provided buffer.
///
/// Mirrors a "write as much as fits" contract: implementations copy at most
/// `buf.len()` bytes and return the number of bytes written. Returning
/// `buf.len()` signals that the dump may have been truncated.
pub trait StackSource {
    /// Writes the dump into `buf`, returning the number of bytes written.
    fn write_stack(&self, buf: &mut [u8]) -> usize;
}

impl<F> StackSource for F
where
    F: Fn(&mut [u8]) -> usize,
{
    fn write_stack(&self, buf: &mut [u8]) -> usize {
        self(buf)
    }
}

/// Backtrace of the calling thread, headed by the thread name.
#[derive(Clone, Copy, Debug, Default)]
pub struct BacktraceSource;

impl StackSource for BacktraceSource {
    fn write_stack(&self, buf: &mut [u8]) -> usize {
        let current = std::thread::current();
        let name = current.name().unwrap_or("<unnamed>");
        let dump = format!(
            "thread '{name}' ({:?}):\n{}",
            current.id(),
            Backtrace::force_capture()
        );
        copy_truncated(dump.as_bytes(), buf)
    }
}

/// Copies as much of `src` as fits into `dst`, returning the copied length.
pub fn copy_truncated(src: &[u8], dst: &mut [u8]) -> usize {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}

/// Stack capturer with a doubling buffer.
#[derive(Clone, Debug)]
pub struct StackTrace<S = BacktraceSource> {
    source: S,
    initial: usize,
}

impl StackTrace<BacktraceSource> {
    /// Capturer over the calling thread's backtrace with the default buffer.
    pub fn new() -> Self {
        Self::with_source(BacktraceSource, DEFAULT_STACK_BUFFER)
    }
}

impl Default for StackTrace<BacktraceSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StackSource> StackTrace<S> {
    /// Capturer over `source`, starting at `initial` bytes (min 1).
    pub fn with_source(source: S, initial: usize) -> Self {
        Self {
            source,
            initial: initial.max(1),
        }
    }

    /// Returns a new capturer with a different initial buffer size.
    pub fn with_initial(mut self, initial: usize) -> Self {
        self.initial = initial.max(1);
        self
    }

    /// Initial buffer size in bytes.
    pub fn initial(&self) -> usize {
        self.initial
    }

    /// Captures the full dump, growing the buffer until nothing is truncated.
    pub fn capture(&self) -> String {
        let mut buf = vec![0u8; self.initial];
        loop {
            let n = self.source.write_stack(&mut buf);
            if n < buf.len() {
                buf.truncate(n);
                return String::from_utf8_lossy(&buf).into_owned();
            }
            let grown = buf.len().saturating_mul(2);
            buf = vec![0u8; grown];
        }
    }
}

/// Captures the calling thread's stack with the default buffer size.
pub fn stacktrace() -> String {
    StackTrace::new().capture()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn synthetic_dump_larger_than_buffer_is_not_truncated() {
        let mut dump = "frame\n".repeat(500);
        dump.push_str("DEEPEST-FRAME-MARKER");
        let calls = Cell::new(0);
        let source = |buf: &mut [u8]| {
            calls.set(calls.get() + 1);
            copy_truncated(dump.as_bytes(), buf)
        };

        let captured = StackTrace::with_source(source, 16).capture();

        assert_eq!(captured, dump);
        assert!(captured.ends_with("DEEPEST-FRAME-MARKER"));
        // 16 → 32 → ... → 4096 (first size above 3020 bytes)
        assert_eq!(calls.get(), 9);
    }

    #[test]
    fn exact_fit_is_treated_as_truncated() {
        let dump = "x".repeat(64);
        let source = |buf: &mut [u8]| copy_truncated(dump.as_bytes(), buf);
        let captured = StackTrace::with_source(source, 64).capture();
        assert_eq!(captured.len(), 64);
    }

    #[test]
    fn zero_initial_is_clamped() {
        let st = StackTrace::new().with_initial(0);
        assert_eq!(st.initial(), 1);
    }

    #[inline(never)]
    fn recurse_then_capture(depth: usize, initial: usize) -> String {
        if depth == 0 {
            return deepest_frame_marker(initial);
        }
        let out = recurse_then_capture(depth - 1, initial);
        std::hint::black_box(out)
    }

    #[inline(never)]
    fn deepest_frame_marker(initial: usize) -> String {
        StackTrace::new().with_initial(initial).capture()
    }

    #[test]
    fn deep_backtrace_is_captured_whole() {
        let trace = recurse_then_capture(64, 32);
        assert!(trace.len() > 32, "trace should outgrow the initial buffer");
        assert!(trace.starts_with("thread '"));
        assert!(
            trace.contains("deepest_frame_marker"),
            "deepest frame missing from trace"
        );
        assert!(trace.contains("recurse_then_capture"));
    }
}

//! Utilities for command handlers.

use std::io::{self, ErrorKind, IsTerminal, Write};

use clap::ValueEnum;

/// A writer wrapper that silently handles broken pipe errors.
///
/// When the underlying writer returns a broken pipe error (EPIPE), this wrapper
/// converts it to a successful write. This allows commands to exit cleanly when
/// output is piped to a process that closes early (e.g. `chartest render ... | head -1`).
pub struct BrokenPipeGuard<W> {
	inner: W,
}

impl<W> BrokenPipeGuard<W> {
	pub fn new(inner: W) -> Self {
		Self { inner }
	}
}

impl<W: Write> Write for BrokenPipeGuard<W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		match self.inner.write(buf) {
			Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(buf.len()),
			other => other,
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		match self.inner.flush() {
			Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
			other => other,
		}
	}
}

/// When to colour output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
	/// Colour when stdout is a terminal and `NO_COLOR` is unset
	#[default]
	Auto,
	Always,
	Never,
}

impl ColorMode {
	pub fn enabled(self) -> bool {
		match self {
			Self::Always => true,
			Self::Never => false,
			Self::Auto => {
				std::env::var_os("NO_COLOR").map_or(true, |v| v.is_empty())
					&& io::stdout().is_terminal()
			}
		}
	}
}

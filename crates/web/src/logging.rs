use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;
use web_sys::console;

/// Installs a console subscriber. Safe to call more than once.
///
/// 0 = warnings only, 1 = info for the wallet targets, 2+ = debug.
pub fn init_logging(verbosity: u8) {
	let filter = match verbosity {
		0 => "warn",
		1 => "warn,wallet=info",
		_ => "debug",
	};

	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::new(filter))
		.with_writer(MakeConsoleWriter)
		.with_target(true)
		.with_level(true)
		.without_time()
		.compact()
		.try_init();
}

/// Routes formatted lines to the console method matching their level.
#[derive(Debug, Clone, Copy)]
struct MakeConsoleWriter;

impl<'a> MakeWriter<'a> for MakeConsoleWriter {
	type Writer = ConsoleWriter;

	fn make_writer(&'a self) -> Self::Writer {
		ConsoleWriter::new(Level::INFO)
	}

	fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
		ConsoleWriter::new(*meta.level())
	}
}

/// Buffers one event and flushes it to the console on drop.
struct ConsoleWriter {
	level: Level,
	buffer: Vec<u8>,
}

impl ConsoleWriter {
	fn new(level: Level) -> Self {
		Self { level, buffer: Vec::new() }
	}
}

impl io::Write for ConsoleWriter {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.buffer.extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl Drop for ConsoleWriter {
	fn drop(&mut self) {
		let line = String::from_utf8_lossy(&self.buffer);
		let line = JsValue::from_str(line.trim_end());
		match self.level {
			Level::ERROR => console::error_1(&line),
			Level::WARN => console::warn_1(&line),
			Level::INFO => console::info_1(&line),
			Level::DEBUG => console::log_1(&line),
			_ => console::debug_1(&line),
		}
	}
}

pub mod builders;
pub mod fake_backend;

use std::io::{self, Write};
use std::sync::{Arc, Mutex, Once};

use parallel_runner::engine::{Console, Terminal};
use tracing_subscriber::{EnvFilter, fmt};

pub use builders::{CommandFileBuilder, RunnerConfigBuilder};
pub use fake_backend::{FakeBackend, FakeScript, FakeStats};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// In-memory `Write` sink that can be read back while shared.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Time pattern used by captured consoles.
pub const TEST_TIME_FORMAT: &str = "%H:%M:%S";

/// A console writing into two separate buffers.
pub struct CapturedConsole {
    pub console: Console,
    pub out: SharedBuffer,
    pub err: SharedBuffer,
}

pub fn capture_console(color: bool) -> CapturedConsole {
    let out = SharedBuffer::new();
    let err = SharedBuffer::new();
    let terminal = Terminal::new(Box::new(out.clone()), Box::new(err.clone()), color);
    CapturedConsole {
        console: Console::new(terminal, TEST_TIME_FORMAT),
        out,
        err,
    }
}

/// A console whose stdout and stderr land in the same buffer, in the order
/// they were written.
pub fn capture_merged_console() -> (Console, SharedBuffer) {
    let buf = SharedBuffer::new();
    let terminal = Terminal::new(Box::new(buf.clone()), Box::new(buf.clone()), false);
    (Console::new(terminal, TEST_TIME_FORMAT), buf)
}

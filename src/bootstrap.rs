//! Process bootstrap: startup banner plus the configured application.

use std::io::{self, Write};

use tracing::{info, warn};

use crate::app::App;
use crate::middleware::{Cors, JsonBody};

pub const SERVICE_NAME: &str = "Messaging Bridge API";
pub const VERSION: &str = "v2.9.6";
/// Version of the embedded messaging library this bridge is built against.
pub const LIBRARY_VERSION: &str = "7.0.0-rc.9";
pub const FEATURE_NOTE: &str = "complete synchronization with profile photos";
/// `rustc --version` of the toolchain that built this binary.
pub const RUNTIME_VERSION: &str = env!("MSGBRIDGE_RUSTC_VERSION");

const SEPARATOR_WIDTH: usize = 60;

/// Prints the startup banner to stdout and returns the application with its
/// middleware chain configured: [`Cors::permissive`], then [`JsonBody::new`].
///
/// Each call builds a fresh, independent [`App`].
pub fn initialize() -> App {
    initialize_to(&mut io::stdout().lock())
}

/// Like [`initialize`], writing the banner to `out` instead of stdout.
///
/// A failed banner write is logged and otherwise ignored.
pub fn initialize_to<W: Write>(out: &mut W) -> App {
    if let Err(e) = write_banner(out) {
        warn!("failed to write startup banner: {e}");
    }

    let app = App::new()
        .layer(Cors::permissive())
        .layer(JsonBody::new());

    info!(version = VERSION, middleware = ?app.middleware_names(), "application initialized");
    app
}

fn write_banner<W: Write>(out: &mut W) -> io::Result<()> {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    writeln!(out, "{separator}")?;
    writeln!(out, "{SERVICE_NAME} {VERSION}")?;
    writeln!(out, "Messaging library: {LIBRARY_VERSION}")?;
    writeln!(out, "Features: {FEATURE_NOTE}")?;
    writeln!(out, "Runtime: {RUNTIME_VERSION}")?;
    writeln!(out, "{separator}")?;
    out.flush()
}

//! # Larek Storefront Entry Point
//!
//! Loads the catalog headlessly and prints it. Renderers attach to the same
//! `Storefront` through the event bus.
//!
//! ## Usage
//! ```text
//! larek-storefront [CONFIG.toml]
//! RUST_LOG=larek=trace larek-storefront
//! LAREK_API_ORIGIN=http://localhost:3000 larek-storefront
//! ```

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // The actual setup is in lib.rs for testability
    match larek_storefront::run(std::env::args().nth(1).map(Into::into)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("larek-storefront: {e}");
            ExitCode::FAILURE
        }
    }
}

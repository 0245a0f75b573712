//! kodegen_bundler_clickonce - dual-algorithm signing for ClickOnce publish output.

use kodegen_bundler_clickonce::cli;
use kodegen_bundler_clickonce::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Never quiet for fatal errors
            let output = OutputManager::new(false, false);
            output.error(&format!("Fatal error: {e}"));

            output.suggestions(&e.recovery_suggestions());

            process::exit(e.exit_code());
        }
    }
}

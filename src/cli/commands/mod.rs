//! Command execution functions.
//!
//! Each command returns `Result<()>`; this module turns the outcome into a
//! process exit code and prints errors with their recovery suggestions.

mod restore;
mod sign;
mod thumbprint;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{CliError, Result, SignError};

use restore::execute_restore;
use sign::execute_sign;
use thumbprint::execute_thumbprint;

/// Execute the command named by the parsed arguments and return the exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    let config = RuntimeConfig::from(&args);

    if let Err(validation_error) = args.validate() {
        let e = SignError::from(CliError::InvalidArguments {
            reason: validation_error,
        });
        config.error_println(&e.to_string());
        return Ok(e.exit_code());
    }

    let result = match &args.command {
        Command::Sign(sign) => execute_sign(sign, &config).await,
        Command::Restore { publish_dir } => execute_restore(publish_dir.as_deref(), &config).await,
        Command::Thumbprint {
            cert_file,
            cert_password,
            openssl,
        } => execute_thumbprint(cert_file, cert_password, openssl.as_deref(), &config).await,
    };

    match result {
        Ok(()) => Ok(0),
        Err(e) => {
            report_failure(args.command.name(), &e, &config);
            Ok(e.exit_code())
        }
    }
}

fn report_failure(command: &str, e: &SignError, config: &RuntimeConfig) {
    config.error_println(&format!("Command '{}' failed: {}", command, e));

    if e.may_leave_payload_modified() {
        config.warning_println("The payload may still be missing its marker extension");
    }

    config.output().suggestions(&e.recovery_suggestions());
}

use std::process::ExitCode;

fn main() -> ExitCode {
    pkgsmith::init_tracing();
    match pkgsmith::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(pkgsmith::core::error::PkgsmithError::ReviewFailed { errors, warnings }) => {
            tracing::debug!(errors, warnings, "review failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {:#}", anyhow::Error::new(e));
            ExitCode::FAILURE
        }
    }
}

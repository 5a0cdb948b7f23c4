use std::process::ExitCode;

use tracing::error;

mod app;

fn main() -> ExitCode {
    let wiring = match app::build_app() {
        Ok(wiring) => wiring,
        Err(err) => {
            report_startup_error(&err);
            return ExitCode::FAILURE;
        }
    };
    app::run(wiring)
}

fn report_startup_error(err: &app::BootstrapError) {
    error!(error = %err, "startup_failed");
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    // Verbosity comes from RUST_LOG
    env_logger::init();

    workflow_canvas::run_app()
}

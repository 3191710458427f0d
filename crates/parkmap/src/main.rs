mod app;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    // `--help` and usage errors exit here, before the data directory is touched
    let (cli, _log_file_flush_guard) = app::start_from(std::env::args_os()).unwrap_or_else(|e| e.exit());
    cli.run().await
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    app::telemetry::init();
    let args: Vec<String> = std::env::args().collect();
    if app::cli::handle_commands(&args)? {
        return Ok(());
    }
    anyhow::bail!(app::cli::USAGE);
}

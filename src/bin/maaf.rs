use agreement_forest::app;
use tracing_subscriber::EnvFilter;

/// Main function
fn main() {
    let cfg = app::Config::new();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = app::read_input(&cfg.input)
        .and_then(|(taxa, trees)| app::compute(&cfg, taxa, trees))
        .and_then(|report| app::write_output(cfg.output.as_deref(), &report));

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

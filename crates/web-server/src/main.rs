use configuration::{init_tracing, load_default_config};

// Entry point for `cargo run -p web-server`. Reads `brokerwatch.toml` from the
// working directory plus `BROKERWATCH_*` overrides, then serves.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_default_config()?;
    let _guard = init_tracing(&settings.logging)?;
    web_server::run_server(settings).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = academy_notes::run().await {
        eprintln!("academy-notes fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = question_bank_api::run_seed_admin().await {
        eprintln!("seed-admin fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

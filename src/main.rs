#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = question_bank_api::run().await {
        eprintln!("question-bank-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

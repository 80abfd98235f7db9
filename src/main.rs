#[tokio::main]
async fn main() -> anyhow::Result<()> {
    straysafe_lib::run().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stark_vip::server::run().await
}

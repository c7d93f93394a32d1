#[tokio::main]
async fn main() -> std::io::Result<()> {
    service_booking::run().await
}

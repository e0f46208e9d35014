#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ssau_timetable::run().await
}

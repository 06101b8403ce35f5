use log_tail::tail_file;
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "app.log".to_string());

    // Follow the file from its first byte with lines up to 4 KiB
    let mut tail = tail_file(&path, 4096).await?;

    println!("Following {} - showing the first 10 lines...", path);

    let mut count = 0;
    while let Some(line) = tail.next().await {
        count += 1;
        println!("  [{}]: {}", count, line);
        if count >= 10 {
            break;
        }
    }

    tail.stop().await;

    if let Some(err) = tail.error() {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

use log_tail::{SourceConfig, StopOutcome, TailConfig, TailStream};
use std::io::Write;
use std::time::Duration;
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Log Tail Comprehensive Example ===\n");

    let dir = std::env::temp_dir().join(format!("log-tail-demo-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("demo.log");
    std::fs::write(&path, "boot: starting\nboot: config loaded\n")?;

    println!("1. Following with the external tail:");
    follow(&path, TailConfig::new(4096)).await?;

    println!("\n{}\n", "=".repeat(50));

    println!("2. Following in-process with a small queue:");
    let config = TailConfig::new(4096)
        .with_queue_capacity(8)
        .with_stop_timeout(Duration::from_millis(500))
        .with_source(SourceConfig::native());
    follow(&path, config).await?;

    println!("\n{}\n", "=".repeat(50));

    println!("3. A line longer than the buffer:");
    std::fs::write(&path, format!("short\n{}\n", "x".repeat(256)))?;
    let config = TailConfig::new(64).with_source(SourceConfig::native());
    let mut tail = TailStream::with_config(&path, config).await?;
    while let Some(line) = tail.next().await {
        println!("  line: {}", line);
    }
    match tail.error() {
        Some(err) => println!("  stream ended with: {}", err),
        None => println!("  stream ended cleanly"),
    }
    tail.stop().await;

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

async fn follow(path: &std::path::Path, config: TailConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut tail = TailStream::with_config(path, config).await?;

    for i in 0..3 {
        let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
        writeln!(file, "request #{} handled", i)?;
    }

    let mut seen = 0;
    while let Ok(Some(line)) = tokio::time::timeout(Duration::from_secs(1), tail.next()).await {
        seen += 1;
        println!("  [{}]: {}", seen, line);
    }

    match tail.stop().await {
        StopOutcome::Graceful => println!("  stopped cleanly after {} lines", seen),
        StopOutcome::Forced => println!("  source had to be killed after {} lines", seen),
        StopOutcome::AlreadyStopped => {}
    }
    Ok(())
}

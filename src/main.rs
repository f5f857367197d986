use log::{error, info};
use p1telegram::{DsmrManager, CONFIG};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    let default_filter = std::env::var("P1_LOG_LEVEL").unwrap_or("info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    let home_tz = {
        let holder = CONFIG.read().unwrap();
        match holder.config.dsmr.home_timezone() {
            Ok(tz) => tz,
            Err(e) => {
                error!("Configuration error: {}", e);
                return Ok(());
            }
        }
    };

    // Channel from the stdin reader to the parser, and one for the results
    let (raw_sender, raw_receiver) = tokio::sync::mpsc::channel(10);
    let (parsed_sender, mut parsed_receiver) = tokio::sync::mpsc::channel(10);

    let mut threads: Vec<JoinHandle<()>> = Vec::new();

    let mut manager = DsmrManager::new(home_tz, parsed_sender);
    threads.push(tokio::spawn(async move {
        manager.start_thread(raw_receiver).await;
    }));

    threads.push(tokio::spawn(async move {
        read_stdin_frames(raw_sender).await;
    }));

    info!("All modules started, reading telegrams from stdin");
    while let Some(reading) = parsed_receiver.recv().await {
        match serde_json::to_string(&reading) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize reading: {}", e),
        }
    }

    for task in threads.iter_mut() {
        task.abort();
    }
    Ok(())
}

async fn read_stdin_frames(sender: Sender<String>) {
    let mut stdin = tokio::io::stdin();
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let read = match stdin.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                error!("stdin read error: {}", e);
                break;
            }
        };
        buffer.extend_from_slice(&chunk[..read]);

        while let Some(frame) = extract_frame(&mut buffer) {
            if sender.send(frame).await.is_err() {
                return;
            }
        }
    }
}

/// Cut the next complete frame out of the stream buffer: start marker
/// through the 4 checksum characters after the end marker. Returns None
/// until a whole frame has arrived; telegrams must never be handed to the
/// parser split mid-frame.
fn extract_frame(buffer: &mut Vec<u8>) -> Option<String> {
    let start = buffer.iter().position(|&b| b == b'/')?;
    if start > 0 {
        buffer.drain(..start);
    }

    let end = buffer.iter().position(|&b| b == b'!')?;
    if buffer.len() < end + 5 {
        return None;
    }

    let frame: Vec<u8> = buffer.drain(..end + 5).collect();
    Some(String::from_utf8_lossy(&frame).into_owned())
}

// src/bin/client.rs
// Terminal front end: upload a PDF, confirm it, then ask questions.

use std::path::PathBuf;

use clap::Parser;
use pdfchat::client::ApiClient;
use pdfchat::config::DEFAULT_MAX_UPLOAD_BYTES;
use pdfchat::session::{ChatSession, Role};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "pdfchat-client", about = "Chat with a PDF through a pdfchat server")]
struct Cli {
    /// PDF to upload
    file: PathBuf,

    /// Server base URL
    #[arg(long, env = "PDFCHAT_URL", default_value = "http://127.0.0.1:3010")]
    server: String,

    /// Client-side upload limit in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_bytes: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = ApiClient::new(&cli.server, cli.max_bytes);
    let mut session = ChatSession::new();
    print_last(&session);

    session.select_file();
    let uploaded = match client.upload(&cli.file).await {
        Ok(uploaded) => uploaded,
        Err(e) => {
            eprintln!("Upload failed: {}", e);
            std::process::exit(1);
        }
    };
    println!("{} ({})", uploaded.message, uploaded.path.display());
    session.mark_uploaded(&uploaded.filename);

    match client.process(&uploaded.filename).await {
        Ok(processed) => {
            debug!(status = %processed.document.status, "Document confirmed");
            session.mark_ready()?;
            println!("{}", processed.message);
        }
        Err(e) => {
            eprintln!("Processing failed: {}", e);
            std::process::exit(1);
        }
    }

    println!("Ask a question (empty line or Ctrl-D to quit).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            break;
        }
        let filename = match session.begin_turn(&line) {
            Ok(filename) => filename,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        match client.chat(&filename, &line).await {
            Ok(reply) => {
                debug!(chunks_used = reply.chunks_used, "Reply received");
                session.record_reply(&reply.message);
            }
            Err(e) => {
                session.record_error(&e.to_string());
            }
        }
        print_last(&session);
    }

    Ok(())
}

fn print_last(session: &ChatSession) {
    if let Some(message) = session.messages().last() {
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        println!(
            "[{}] {}: {}",
            message.timestamp.format("%H:%M:%S"),
            who,
            message.content
        );
    }
}

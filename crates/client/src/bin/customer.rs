use chrono::Utc;
use client::{
    ClientConfig, ClientError, ServiceClient, api::Photo, customer::CustomerSession,
};
use log::error;
use models::request_type::RequestType;
use std::{path::Path, process::ExitCode, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{self, UnboundedSender},
    time::MissedTickBehavior,
};

const HELP: &str = "Pick 1-6 to call staff (a toilet issue needs a photo path, e.g. \"2 sink.jpg\"), q to quit";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(slug), Some(label)) = (args.next(), args.next()) else {
        eprintln!("Usage: customer <restaurant-slug> <table-label>");
        return ExitCode::FAILURE;
    };

    let client = match ServiceClient::new(&ClientConfig::from_env()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut session = match CustomerSession::load(&client, &slug, &label).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let (lines_tx, mut lines) = mpsc::unbounded_channel();
    tokio::spawn(read_lines(lines_tx));

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut notice = String::from(HELP);
    draw(&session, &notice);

    loop {
        tokio::select! {
            _ = ticker.tick(), if session.needs_tick() => {
                session.tick(Utc::now());
                draw(&session, &notice);
            }
            line = lines.recv() => {
                let Some(line) = line else { break };
                let line = line.trim();
                if line == "q" {
                    break;
                }

                notice = match submit(&client, &mut session, line).await {
                    Ok(request_type) => format!("{} sent, staff are on their way", request_type.label()),
                    Err(e) => e.to_string(),
                };
                draw(&session, &notice);
            }
        }
    }

    ExitCode::SUCCESS
}

async fn read_lines(tx: UnboundedSender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(e) => {
                error!("Failed to read input: {e}");
                return;
            }
        }
    }
}

async fn submit(
    client: &ServiceClient,
    session: &mut CustomerSession,
    line: &str,
) -> Result<RequestType, ClientError> {
    let mut words = line.split_whitespace();
    let request_type = words
        .next()
        .and_then(|word| word.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| RequestType::all().get(index).copied())
        .ok_or_else(|| ClientError::Validation(HELP.to_string()))?;

    let photo = match words.next() {
        Some(path) => Some(read_photo(Path::new(path)).await?),
        None => None,
    };

    session
        .submit(client, request_type, photo, Utc::now())
        .await?;
    Ok(request_type)
}

async fn read_photo(path: &Path) -> Result<Photo, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo.jpg".to_string());

    Ok(Photo { file_name, bytes })
}

fn draw(session: &CustomerSession, notice: &str) {
    print!("\x1b[2J\x1b[H");
    println!("{}", session.render(Utc::now()));
    println!("{notice}");
}

use chrono::Utc;
use client::{
    ClientConfig, ServiceClient,
    api::StreamMessage,
    dashboard::{Dashboard, DashboardEvent, StaffAction, dispatch},
};
use futures::StreamExt;
use log::{error, info, warn};
use std::{process::ExitCode, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{self, UnboundedSender},
    time::MissedTickBehavior,
};

const MAX_BACKOFF_SECS: u64 = 30;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = ClientConfig::from_env();
    if let Err(e) = config.require_token() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let client = match ServiceClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (events_tx, mut events) = mpsc::unbounded_channel();
    tokio::spawn(read_actions(events_tx.clone()));
    tokio::spawn(follow_changes(client.clone(), events_tx.clone()));

    let mut dashboard = Dashboard::new(Utc::now());
    dispatch(&client, dashboard.reload(), &events_tx);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // This loop is the only writer of the dashboard state
    loop {
        let event = tokio::select! {
            _ = ticker.tick() => DashboardEvent::Tick(Utc::now()),
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let commands = dashboard.handle(event);
        if dashboard.should_quit() {
            break;
        }
        dispatch(&client, commands, &events_tx);

        print!("\x1b[2J\x1b[H");
        println!("{}", dashboard.render());
        println!("s N start · c N complete · t LABEL complete table · x clear · f FILTER · r reload · q quit");
    }

    info!("Dashboard closed");
    ExitCode::SUCCESS
}

async fn read_actions(events: UnboundedSender<DashboardEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let event = match StaffAction::parse(&line) {
            Ok(action) => DashboardEvent::Action(action),
            Err(message) => DashboardEvent::Notice(message),
        };
        if events.send(event).is_err() {
            return;
        }
    }
    // Stdin closed
    let _ = events.send(DashboardEvent::Action(StaffAction::Quit));
}

/// Keeps the change stream open, reconnecting with backoff. Every
/// reconnect asks the dashboard to resync, since changes may have been
/// missed in between.
async fn follow_changes(client: ServiceClient, events: UnboundedSender<DashboardEvent>) {
    let mut backoff = 1;
    let mut connected_before = false;

    loop {
        let reason = match client.changes().await {
            Ok(stream) => {
                info!("Connected to the change stream");
                backoff = 1;
                if connected_before
                    && events
                        .send(DashboardEvent::Stream(StreamMessage::Resync))
                        .is_err()
                {
                    return;
                }
                connected_before = true;

                let mut stream = std::pin::pin!(stream);
                loop {
                    match stream.next().await {
                        Some(Ok(message)) => {
                            if events.send(DashboardEvent::Stream(message)).is_err() {
                                return;
                            }
                        }
                        Some(Err(e)) => break e.to_string(),
                        None => break "stream ended".to_string(),
                    }
                }
            }
            Err(e) => e.to_string(),
        };

        warn!("Change stream closed: {reason}, retrying in {backoff}s");
        if events.send(DashboardEvent::StreamClosed(reason)).is_err() {
            return;
        }

        tokio::time::sleep(Duration::from_secs(backoff)).await;
        backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
    }
}

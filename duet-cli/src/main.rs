use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use duet_client::{Call, ControllerEvent, NegotiationState, SyntheticCapture};
use duet_server::{ServerConfig, SignalingServer};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duet", version, about = "Two-party WebRTC signaling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve(ServerConfig),
    /// Join a call through a signaling server.
    Call {
        #[arg(long, env = "DUET_URL", default_value = "ws://127.0.0.1:4000/ws")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Commands::Serve(config) => serve(config).await,
        Commands::Call { url } => call(&url).await,
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    println!("{}", "Starting duet signaling server...".green().bold());
    if config.churn {
        println!(
            "   Simulated participants every {}s, staying {}s",
            config.churn_interval_secs, config.churn_lifetime_secs
        );
    }

    let server = SignalingServer::bind(config).await?;
    println!("   Listening on ws://{}/ws", server.local_addr()?);

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            println!("{}", "Shutting down".yellow());
            Ok(())
        }
    }
}

async fn call(url: &str) -> Result<()> {
    println!("{}", format!("Calling through {}...", url).green().bold());

    let capture = SyntheticCapture::default()
        .with_talk_spurts(Duration::from_secs(2), Duration::from_secs(3));
    let mut call = Call::start(url, &capture)
        .await
        .with_context(|| format!("Failed to start call via {}", url))?;
    println!(
        "{}",
        "Type 'm' + Enter to toggle mute, 'c' for camera, 'q' to hang up.".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut speaking = call.stream().speaking_changes();

    loop {
        tokio::select! {
            event = call.next_event() => {
                match event {
                    Some(event) => print_event(event),
                    None => break,
                }
            }

            Ok(()) = speaking.changed() => {
                if *speaking.borrow_and_update() {
                    println!("   {}", "Speaking".green());
                } else {
                    println!("   {}", "Quiet".dimmed());
                }
            }

            line = lines.next_line() => {
                match line?.as_deref().map(str::trim) {
                    Some("m") => {
                        let muted = call.stream().toggle_mute();
                        println!("   Microphone {}", if muted { "muted".red() } else { "live".green() });
                    }
                    Some("c") => {
                        let off = call.stream().toggle_camera();
                        println!("   Camera {}", if off { "off".red() } else { "on".green() });
                    }
                    Some("q") | None => break,
                    Some(_) => {}
                }
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    call.hang_up().await;
    println!("{}", "Call ended".yellow());
    Ok(())
}

fn print_event<R>(event: ControllerEvent<R>) {
    match event {
        ControllerEvent::LocalId(id) => println!("   You are {}", id.to_string().cyan()),
        ControllerEvent::StateChanged { remote, state } => {
            let label = state.to_string();
            let label = match state {
                NegotiationState::Connected => label.green().bold(),
                NegotiationState::Closed => label.red(),
                _ => label.yellow(),
            };
            println!("   {} {}", remote.to_string().cyan(), label);
        }
        ControllerEvent::RemoteTrack { remote, .. } => {
            println!("   Receiving media from {}", remote.to_string().cyan());
        }
    }
}

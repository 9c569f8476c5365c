use clap::{Parser, Subcommand};
use robovac_agent::{
    config::load_config,
    error::{AgentError, Result as AgentResult},
    tools::{create_vacuum_registry, ToolResult},
    vacuum::{BasicCommand, DeviceSessionManager, RoborockWebApi, RpcBridgeConnector},
};
use serde_json::{json, Value};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "robovac-agent")]
#[command(about = "Drive a Roborock vacuum through its cloud account")]
#[command(long_about = "
Runs the vacuum tools by hand. Credentials come from ROBOROCK_USERNAME and
ROBOROCK_PASSWORD (a .env file in the working directory is read too).

EXAMPLES:
  # Battery, state and whether the vacuum is docked
  robovac-agent status

  # Send it home
  robovac-agent command app_charge

  # Clean two rooms by name, or by segment number
  robovac-agent clean Hallway \"Dining Room\"
  robovac-agent clean --segment 21 --segment 22
")]
struct Args {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Show the vacuum status
    Status,
    /// Send a parameterless command (see `robovac-agent commands`)
    Command { name: String },
    /// Clean rooms by name and/or segment number
    Clean {
        rooms: Vec<String>,
        #[arg(long = "segment")]
        segments: Vec<u32>,
    },
    /// List the room → segment mapping
    Rooms,
    /// List the known basic commands
    Commands,
    /// Print the LLM tool definitions as JSON
    Tools,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> AgentResult<()> {
    let config = load_config()?;

    let api = Arc::new(RoborockWebApi::new(config.base_url.clone())?);
    let connector = Arc::new(RpcBridgeConnector::new(
        config.bridge_url.clone(),
        config.request_timeout,
    ));
    let manager = Arc::new(DeviceSessionManager::new(api, connector, config.credentials));
    let registry = create_vacuum_registry(manager, config.rooms);

    let (tool, arguments) = match args.action {
        Action::Status => ("get_status", json!({})),
        Action::Command { name } => ("send_basic_command", json!({ "command": name })),
        Action::Clean { rooms, segments } => {
            if rooms.is_empty() && segments.is_empty() {
                return Err(AgentError::InvalidInput(
                    "name at least one room or --segment".to_string(),
                ));
            }
            ("app_segment_clean", json!({ "rooms": rooms, "segments": segments }))
        }
        Action::Rooms => {
            for room in registry.rooms().rooms() {
                println!("{:>4}  {}", room.segment, room.name);
            }
            return Ok(());
        }
        Action::Commands => {
            for command in BasicCommand::iter() {
                println!("{:<24}{}", command.as_ref(), command.description());
            }
            return Ok(());
        }
        Action::Tools => {
            let definitions = Value::Array(registry.get_tool_definitions());
            println!("{}", serde_json::to_string_pretty(&definitions)?);
            return Ok(());
        }
    };

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Received Ctrl+C, cancelling...");
            ctrl_c_token.cancel();
        }
    });

    log::info!("🚀 Running {}", tool);
    let result = registry
        .execute_tool_and_reset(tool, arguments, cancel_token)
        .await?;

    match result {
        ToolResult::Success(Some(message)) => println!("{}", message),
        ToolResult::Success(None) => {}
        ToolResult::Escalation(data) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            if let Some(error) = data.get("error").and_then(|e| e.as_str()) {
                return Err(AgentError::Device(error.to_string()));
            }
        }
    }

    Ok(())
}

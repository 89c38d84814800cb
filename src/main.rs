use std::path::{Path, PathBuf};

use agentdeck::app::App;
use agentdeck::client::Clients;
use agentdeck::config::{ClientMode, ConsoleConfig};
use agentdeck::event::Event;
use agentdeck::i18n::Locale;
use agentdeck::model::Role;
use agentdeck::store::MemoryStore;
use agentdeck::tui::{self, Tui};
use agentdeck::{logging, ui};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{Event as CrosstermEvent, EventStream};
use futures_util::StreamExt;
use log::info;

/// Terminal console for conversational agents.
#[derive(Debug, Parser)]
#[command(name = "agentdeck", version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Never contact the remote service; use the in-memory store only
    #[arg(long, global = true)]
    mock: bool,
    /// Base URL of the agent service
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// UI language (de or en)
    #[arg(long, global = true)]
    lang: Option<Locale>,
    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the full-screen console (default)
    Tui,
    /// Print all agents
    List {
        #[arg(long)]
        json: bool,
    },
    /// Send one message to an agent and print the reply
    Chat { agent_id: String, message: String },
    /// Print an agent's chat transcript
    History { agent_id: String },
    /// Room primitives of the agent service
    #[command(subcommand)]
    Rooms(RoomCommand),
    /// Write the effective configuration as TOML
    WriteConfig {
        /// Target file; defaults to the resolved config path
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum RoomCommand {
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Agents taking part in the room
        #[arg(long = "agent")]
        agents: Vec<String>,
    },
    Send {
        room_id: String,
        content: String,
        #[arg(long, default_value = "user")]
        sender: String,
    },
    Messages {
        room_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, config_path) =
        ConsoleConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.mock {
        config.mode = ClientMode::MockOnly;
    }
    if let Some(url) = cli.api_url.clone() {
        config.api_url = url;
    }
    if let Some(lang) = cli.lang {
        config.locale = lang;
    }

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_tui(config, &config_path, cli.verbose).await,
        command => {
            logging::init_cli_logging(cli.verbose);
            run_command(command, config, &config_path).await
        }
    }
}

async fn run_tui(config: ConsoleConfig, config_path: &Path, verbose: bool) -> Result<()> {
    let log_dir = config.log_dir_for(config_path);
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    logging::init_file_logging(&log_dir, config_dir, verbose)?;
    info!("using config {}", config_path.display());

    let clients = Clients::from_config(&config, MemoryStore::shared())
        .context("failed to set up the agent clients")?;
    let mut app = App::new(config, clients);

    tui::install_panic_hook();
    let mut terminal = tui::init().context("failed to initialise the terminal")?;
    let result = event_loop(&mut terminal, &mut app).await;
    tui::restore().context("failed to restore the terminal")?;
    result
}

async fn event_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut stream = EventStream::new();
    let mut interval = tokio::time::interval(app.tick_rate());

    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;

        let event = tokio::select! {
            _ = interval.tick() => Event::Tick,
            maybe_event = stream.next() => {
                match maybe_event {
                    Some(Ok(CrosstermEvent::Key(key))) => Event::Key(key),
                    Some(Ok(CrosstermEvent::Resize(..))) => Event::Resize,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => return Err(err).context("failed to read terminal events"),
                    None => break,
                }
            }
        };

        match event {
            Event::Tick => app.on_tick(),
            Event::Key(key) => {
                app.handle_key(key);
                app.on_tick();
            }
            Event::Resize => {}
        }
    }
    Ok(())
}

async fn run_command(command: Command, config: ConsoleConfig, config_path: &Path) -> Result<()> {
    if let Command::WriteConfig { path } = &command {
        let target = path.as_deref().unwrap_or(config_path);
        config
            .save_to_file(target)
            .with_context(|| format!("failed to write {}", target.display()))?;
        println!("{}", target.display());
        return Ok(());
    }

    let clients = Clients::from_config(&config, MemoryStore::shared())
        .context("failed to set up the agent clients")?;
    match command {
        Command::List { json } => {
            let agents = clients.agents.list_all().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&agents)?);
            } else {
                for agent in agents {
                    println!(
                        "{}\t{}\t{}\t{}",
                        agent.id,
                        agent.name,
                        agent.llm.model,
                        agent.knowledge.len()
                    );
                }
            }
        }
        Command::Chat { agent_id, message } => {
            let reply = clients.chat.send(&agent_id, &message).await;
            println!("{}", reply.content);
        }
        Command::History { agent_id } => {
            for message in clients.chat.history(&agent_id).await {
                let who = match message.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                println!("{who}: {}", message.content);
            }
        }
        Command::Rooms(room) => {
            let value = match room {
                RoomCommand::Create {
                    name,
                    description,
                    agents,
                } => clients
                    .rooms
                    .create_room(&name, &description, &agents)
                    .await
                    .context("failed to create room")?,
                RoomCommand::Send {
                    room_id,
                    content,
                    sender,
                } => clients
                    .rooms
                    .send_room_message(&room_id, &content, &sender)
                    .await
                    .context("failed to send room message")?,
                RoomCommand::Messages { room_id } => clients
                    .rooms
                    .room_messages(&room_id)
                    .await
                    .context("failed to load room messages")?,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Tui | Command::WriteConfig { .. } => {}
    }
    Ok(())
}

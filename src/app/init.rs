use std::time::{Duration, Instant};

use log::info;

use super::{App, Screen};
use crate::client::Clients;
use crate::config::ConsoleConfig;
use crate::state::AgentsState;

impl App {
    /// Creates a new `App` and requests the agent list.
    ///
    /// Must be called from within a tokio runtime, since loading starts right away.
    pub fn new(config: ConsoleConfig, clients: Clients) -> Self {
        let locale = config.locale;
        let mode = clients.mode();
        let mut agents = AgentsState::new(clients.agents.clone());
        agents.refresh();
        info!("console started in {mode} mode against {}", config.api_url);

        Self {
            should_quit: false,
            screen: Screen::Agents,
            locale,
            mode,
            agents,
            agent_cursor: 0,
            form: None,
            knowledge: None,
            chat: None,
            status_message: locale.strings().status_ready().to_string(),
            overlay: None,
            spinner_frame: 0,
            clients,
            config,
            last_tick: Instant::now(),
            tick_rate: Duration::from_millis(250),
        }
    }
}

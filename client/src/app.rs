//! Session controller: ties the connection, the match loops, input and
//! navigation together on one task.

use crate::config::{ClientConfig, LEAVE_REASON};
use crate::error::ClientError;
use crate::game::{Match, MatchTick};
use crate::identity::IdentityStore;
use crate::input::{InputEvent, InputManager};
use crate::network::{Connection, ConnectionEvent, ConnectionState, Connector};
use crate::rendering::{Renderer, Surface};
use crate::timer::Clock;
use log::{debug, error, info, warn};
use shared::protocol::{Message, MessageKind};
use std::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Upper bound on waiting for the transport to confirm a local close.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Menu,
    Room { room_id: String },
}

/// Host-side navigation and error presentation.
pub trait Navigator: Send {
    fn navigate(&mut self, view: &View);
    fn report(&mut self, error: &ClientError);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&mut self, view: &View) {
        match view {
            View::Menu => info!("Showing menu"),
            View::Room { room_id } => info!("Entering room {}", room_id),
        }
    }

    fn report(&mut self, error: &ClientError) {
        if error.offers_menu_return() {
            error!("{} (back to menu)", error);
        } else {
            error!("{}", error);
        }
    }
}

enum Step {
    Connection(ConnectionEvent),
    Message(Message),
    Error(ClientError),
    Input(Option<InputEvent>),
    Tick(MatchTick),
}

pub struct App<S: Surface> {
    config: ClientConfig,
    connection: Connection,
    renderer: Renderer<S>,
    identity: Box<dyn IdentityStore>,
    navigator: Box<dyn Navigator>,
    messages: mpsc::UnboundedReceiver<Message>,
    errors: mpsc::UnboundedReceiver<ClientError>,
    game: Option<Match>,
    view: View,
    established: bool,
    queued: bool,
    online: u32,
}

impl<S: Surface> App<S> {
    pub fn new(
        config: ClientConfig,
        connector: Box<dyn Connector>,
        clock: Arc<dyn Clock>,
        surface: S,
        identity: Box<dyn IdentityStore>,
        navigator: Box<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let renderer = Renderer::new(surface)?;

        let (errors_tx, errors) = mpsc::unbounded_channel();
        let mut connection = Connection::new(config.endpoint.url(), connector, clock, errors_tx)
            .with_ping_period(config.ping_period);

        let (messages_tx, messages) = mpsc::unbounded_channel();
        for kind in [
            MessageKind::Hello,
            MessageKind::Online,
            MessageKind::Game,
            MessageKind::World,
            MessageKind::ExitGame,
        ] {
            let messages_tx = messages_tx.clone();
            connection.register_handler(kind, move |message| {
                let _ = messages_tx.send(message.clone());
            });
        }

        Ok(Self {
            config,
            connection,
            renderer,
            identity,
            navigator,
            messages,
            errors,
            game: None,
            view: View::Menu,
            established: false,
            queued: false,
            online: 0,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn renderer(&self) -> &Renderer<S> {
        &self.renderer
    }

    pub fn game(&self) -> Option<&Match> {
        self.game.as_ref()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn is_established(&self) -> bool {
        self.established
    }

    pub fn is_queued(&self) -> bool {
        self.queued
    }

    pub fn online(&self) -> u32 {
        self.online
    }

    /// Runs the session until the player quits (`Ok`) or the connection
    /// fails (`Err` with the reported error).
    pub async fn run(
        &mut self,
        inputs: &mut mpsc::UnboundedReceiver<InputEvent>,
    ) -> Result<(), ClientError> {
        self.connection.open();
        self.renderer.draw_menu();
        self.navigator.navigate(&self.view);

        loop {
            match self.next_step(inputs).await {
                Step::Input(Some(InputEvent::Quit)) | Step::Input(None) => {
                    self.shutdown().await;
                    return Ok(());
                }
                step => self.apply(step)?,
            }
        }
    }

    /// Waits for the next thing to do. Connection-side work always wins over
    /// input and match ticks that are ready on the same poll.
    async fn next_step(&mut self, inputs: &mut mpsc::UnboundedReceiver<InputEvent>) -> Step {
        let connection = &mut self.connection;
        let messages = &mut self.messages;
        let errors = &mut self.errors;
        let game = &mut self.game;

        tokio::select! {
            biased;

            Some(error) = errors.recv() => Step::Error(error),
            Some(message) = messages.recv() => Step::Message(message),
            event = connection.process_next() => Step::Connection(event),
            input = inputs.recv() => Step::Input(input),
            tick = next_match_tick(game) => Step::Tick(tick),
        }
    }

    fn apply(&mut self, step: Step) -> Result<(), ClientError> {
        match step {
            Step::Connection(event) => {
                if event == ConnectionEvent::Opened {
                    self.greet()?;
                }
                self.dispatch_pending()
            }
            Step::Message(message) => {
                self.handle_message(message);
                Ok(())
            }
            Step::Error(error) => self.handle_error(error),
            Step::Input(Some(input)) => self.handle_input(input),
            Step::Input(None) => Ok(()),
            Step::Tick(tick) => self.handle_tick(tick),
        }
    }

    /// Handles whatever the last connection event forwarded, before any
    /// match tick gets a chance to run.
    fn dispatch_pending(&mut self) -> Result<(), ClientError> {
        while let Ok(message) = self.messages.try_recv() {
            self.handle_message(message);
        }
        while let Ok(error) = self.errors.try_recv() {
            self.handle_error(error)?;
        }
        Ok(())
    }

    fn greet(&mut self) -> Result<(), ClientError> {
        let stored = self.identity.load();
        debug!("Greeting server as {:?}", stored);
        match self.connection.send(&Message::hello(stored.as_deref())) {
            Ok(()) => Ok(()),
            Err(e) => self.handle_error(e),
        }
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::Hello { player_id } => {
                if !player_id.is_empty() {
                    self.identity.store(&player_id);
                }
                info!("Session established");
                self.established = true;
                self.connection.run_ping();
            }
            Message::Online { count } => {
                debug!("{} players online", count);
                self.online = count;
            }
            Message::Game { room_id } => {
                if let Some(mut previous) = self.game.take() {
                    previous.stop();
                }
                self.queued = false;
                self.game = Some(Match::start(room_id.clone(), &self.config));
                self.view = View::Room { room_id };
                self.navigator.navigate(&self.view);
            }
            Message::World(snapshot) => match self.game.as_mut() {
                Some(game) if game.is_running() => game.state_mut().receive_world(&snapshot),
                _ => debug!("World update outside a match"),
            },
            Message::ExitGame { reason } => {
                if let Some(mut game) = self.game.take() {
                    game.stop();
                }
                info!("Match ended by server: {}", reason);
                self.navigator.report(&ClientError::GameExited { reason });
                self.show_menu();
            }
            other => debug!("Unhandled {} message", other.kind()),
        }
    }

    fn handle_error(&mut self, error: ClientError) -> Result<(), ClientError> {
        self.navigator.report(&error);
        if !error.is_fatal() {
            warn!("{}", error);
            return Ok(());
        }

        if let Some(mut game) = self.game.take() {
            game.stop();
        }
        Err(error)
    }

    fn handle_input(&mut self, input: InputEvent) -> Result<(), ClientError> {
        match input {
            InputEvent::Pointer(event) => {
                let Some(game) = self.game.as_mut() else {
                    return Ok(());
                };
                let bounds = self.renderer.surface().bounds();
                if let Some(point) = InputManager::pointer_to_game(&bounds, event) {
                    game.state_mut().move_player(point);
                }
                Ok(())
            }
            InputEvent::ToggleDebug => {
                self.config.debug_overlay = !self.config.debug_overlay;
                if let Some(game) = self.game.as_mut() {
                    game.state_mut().set_debug(self.config.debug_overlay);
                }
                Ok(())
            }
            InputEvent::FindGame => self.find_game(),
            InputEvent::LeaveGame => {
                let Some(mut game) = self.game.take() else {
                    return Ok(());
                };
                let result = game.exit(LEAVE_REASON, &mut self.connection);
                self.show_menu();
                match result {
                    Ok(()) => Ok(()),
                    Err(e) => self.handle_error(e),
                }
            }
            InputEvent::Quit => Ok(()),
        }
    }

    /// Enters the matchmaking queue, or leaves it when already queued.
    fn find_game(&mut self) -> Result<(), ClientError> {
        if self.game.is_some() {
            debug!("Already in a match");
            return Ok(());
        }

        let request = if self.queued {
            Message::UnQueue
        } else {
            Message::Queue
        };
        match self.connection.send(&request) {
            Ok(()) => {
                self.queued = !self.queued;
                info!("{}", if self.queued { "Queued" } else { "Left queue" });
                Ok(())
            }
            Err(e) => self.handle_error(e),
        }
    }

    fn handle_tick(&mut self, tick: MatchTick) -> Result<(), ClientError> {
        let Some(game) = self.game.as_mut() else {
            return Ok(());
        };

        match tick {
            MatchTick::Capture => match game.capture(&mut self.connection) {
                Ok(()) => Ok(()),
                Err(e) => self.handle_error(e),
            },
            MatchTick::Render => {
                game.render(&mut self.renderer);
                Ok(())
            }
        }
    }

    fn show_menu(&mut self) {
        self.view = View::Menu;
        self.renderer.draw_menu();
        self.navigator.navigate(&self.view);
    }

    async fn shutdown(&mut self) {
        if let Some(mut game) = self.game.take() {
            if let Err(e) = game.exit(LEAVE_REASON, &mut self.connection) {
                warn!("Could not announce leaving: {}", e);
            }
        }

        self.connection.close();
        let connection = &mut self.connection;
        let drained = tokio::time::timeout(CLOSE_GRACE, async {
            while connection.state() == ConnectionState::Closing {
                connection.process_next().await;
            }
        })
        .await;
        if drained.is_err() {
            debug!("Transport did not confirm close in {:?}", CLOSE_GRACE);
        }
        info!("Session ended");
    }
}

async fn next_match_tick(game: &mut Option<Match>) -> MatchTick {
    match game.as_mut() {
        Some(game) => game.next_tick().await,
        None => future::pending().await,
    }
}

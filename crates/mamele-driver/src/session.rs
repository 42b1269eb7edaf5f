//! Driver side of a mamele session
//!
//! The driver talks in strict alternation with the emulator: every update
//! it receives is answered by exactly one command. `act` sends its input and
//! then waits for the resulting frame straight away, so the next command can
//! go out without a round trip. Anything that sends first drains a pending
//! update when the previous send has not been answered yet.

use crate::config::{DriverConfig, ResetTiming};
use crate::launcher::EmulatorLauncher;
use mamele_bridge::{Connection, DriverCommand, EmulatorMessage};
use mamele_core::{
    Action, ActionSpace, ActionTable, Capabilities, Frame, MameleError, Result, ScreenSize,
    SwitchStates,
};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    /// Score and game-over reports are ignored while the game restarts
    Resetting,
    Closed,
}

/// A connected, handshaken session with one emulator
pub struct DriverSession<S> {
    connection: Option<Connection<S>>,
    phase: Phase,
    capabilities: Capabilities,
    table: ActionTable,
    timing: ResetTiming,
    score: i64,
    previous_score: i64,
    /// Latched: set by any game-over report, cleared only by a restart
    game_over: bool,
    /// The last update has been received and not yet answered
    last_received: bool,
    frame: Frame,
    /// Emulator process we launched, reaped on close
    emulator: Option<Child>,
    exit_grace: Duration,
}

#[cfg(unix)]
impl DriverSession<tokio::net::UnixStream> {
    /// Listen on a fresh socket, launch the emulator against it and wait for
    /// it to connect and describe itself
    pub async fn start(
        game: &str,
        launcher: &impl EmulatorLauncher,
        config: &DriverConfig,
    ) -> Result<Self> {
        let listener = mamele_bridge::listen()?;
        let emulator = launcher.launch(game, listener.address())?;

        let accept = listener.accept();
        let accepted = tokio::time::timeout(config.accept_timeout(), accept).await;
        let connection = match accepted {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => {
                kill(emulator).await;
                return Err(e);
            }
            Err(_) => {
                kill(emulator).await;
                return Err(MameleError::ConnectError(format!(
                    "Emulator did not connect within {}s",
                    config.accept_timeout_secs
                )));
            }
        };

        match Self::handshake(connection, config.timing).await {
            Ok(mut session) => {
                session.emulator = emulator;
                session.exit_grace = config.exit_grace();
                Ok(session)
            }
            Err(e) => {
                kill(emulator).await;
                Err(e)
            }
        }
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> DriverSession<S> {
    /// Read the screen size and button usage the emulator opens with.
    /// The connection is closed if either is missing or malformed.
    pub async fn handshake(mut connection: Connection<S>, timing: ResetTiming) -> Result<Self> {
        let capabilities = match receive_capabilities(&mut connection).await {
            Ok(capabilities) => capabilities,
            Err(e) => {
                error!("Handshake failed: {}", e);
                connection.close().await;
                return Err(e);
            }
        };

        let table = ActionTable::new(ActionSpace::from_used(&capabilities.used));
        info!(
            "Emulator connected: screen {}, {} button groups, {} actions",
            capabilities.screen,
            table.space().len(),
            table.space().action_count()
        );

        Ok(Self {
            connection: Some(connection),
            phase: Phase::Ready,
            frame: Frame::blank(capabilities.screen),
            capabilities,
            table,
            timing,
            score: 0,
            previous_score: 0,
            game_over: true,
            last_received: false,
            emulator: None,
            exit_grace: DriverConfig::default().exit_grace(),
        })
    }

    /// Width and height of the game screen
    pub fn screen_dimensions(&self) -> ScreenSize {
        self.capabilities.screen
    }

    /// Button groups the game actually uses
    pub fn minimal_action_set(&self) -> &ActionSpace {
        self.table.space()
    }

    pub fn action_table(&self) -> &ActionTable {
        &self.table
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Latest frame as received, 4 bytes per pixel in BGRA order
    pub fn pixel_buffer(&self) -> &[u8] {
        self.frame.bgra()
    }

    /// Latest frame as packed RGB
    pub fn screen_rgb(&self) -> Vec<u8> {
        self.frame.to_rgb()
    }

    /// Hold `action` for one frame. Returns the score change it produced.
    pub async fn act(&mut self, action: &Action) -> Result<i64> {
        let states = self.table.lookup(action)?;
        self.send_command(DriverCommand::Input(states)).await?;
        self.receive_message().await?;
        Ok(self.score - self.previous_score)
    }

    /// Let the emulator run `frames` frames without reporting them
    pub async fn skip(&mut self, frames: u32) -> Result<()> {
        self.send_command(DriverCommand::Skip(frames)).await
    }

    /// Put the game back at the start of play: reset the machine if a game
    /// is in progress, then insert a coin and press player 1 start
    pub async fn restart_game(&mut self) -> Result<()> {
        info!("Restarting game");
        self.phase = Phase::Resetting;
        let result = self.restart_sequence().await;
        if self.phase == Phase::Resetting {
            self.phase = Phase::Ready;
        }
        result?;

        self.game_over = false;
        self.score = 0;
        self.previous_score = 0;
        Ok(())
    }

    async fn restart_sequence(&mut self) -> Result<()> {
        let timing = self.timing;
        if !self.game_over {
            self.send_command(DriverCommand::Reset).await?;
            self.skip(timing.reset_frames).await?;
        }

        self.insert_coin().await?;
        self.skip(timing.press_frames).await?;
        self.press_nothing().await?;
        self.skip(timing.coin_to_start_frames).await?;

        self.start_player1().await?;
        self.skip(timing.press_frames).await?;
        self.press_nothing().await?;
        self.skip(timing.start_to_live_frames).await
    }

    async fn insert_coin(&mut self) -> Result<()> {
        let coin = self.table.coin();
        self.send_command(DriverCommand::Input(coin)).await
    }

    async fn start_player1(&mut self) -> Result<()> {
        let start = self.table.player1();
        self.send_command(DriverCommand::Input(start)).await
    }

    async fn press_nothing(&mut self) -> Result<()> {
        self.send_command(DriverCommand::Input(SwitchStates::none()))
            .await
    }

    /// Tell the emulator to exit and close the connection. Does not wait
    /// for the emulator to acknowledge.
    pub async fn quit(&mut self) -> Result<()> {
        if self.phase == Phase::Closed {
            return Ok(());
        }
        info!("Quitting");
        let result = self.send_command(DriverCommand::Quit).await;
        self.close().await;
        result
    }

    fn connection_mut(&mut self) -> Result<&mut Connection<S>> {
        self.connection
            .as_mut()
            .ok_or_else(|| MameleError::ProtocolError("Session is closed".into()))
    }

    /// Send one command, first draining the update it answers if that has
    /// not been read yet
    async fn send_command(&mut self, command: DriverCommand) -> Result<()> {
        if !self.last_received {
            self.receive_message().await?;
        }

        let sent = self.connection_mut()?.send_driver_command(&command).await;
        if let Err(e) = sent {
            return Err(self.fail(e).await);
        }
        self.last_received = false;
        Ok(())
    }

    async fn receive_message(&mut self) -> Result<()> {
        let screen = self.capabilities.screen;
        let received = self
            .connection_mut()?
            .receive_emulator_message(Some(screen))
            .await;
        let message = match received {
            Ok(message) => message,
            Err(e) => return Err(self.fail(e).await),
        };

        match message {
            EmulatorMessage::Update(update) => {
                if self.phase == Phase::Resetting {
                    debug!("Ignoring score {} during restart", update.score);
                } else {
                    self.previous_score = self.score;
                    self.score = update.score;
                    self.game_over |= update.game_over;
                }
                self.frame = Frame::new(screen, update.pixels);
                self.last_received = true;
                Ok(())
            }
            EmulatorMessage::Quit => {
                info!("Emulator quit");
                self.close().await;
                Err(MameleError::UnexpectedQuit)
            }
            other => Err(self
                .fail(MameleError::ProtocolError(format!(
                    "Unexpected {} after handshake",
                    other.tag()
                )))
                .await),
        }
    }

    /// Log a fatal session error and tear the connection down
    async fn fail(&mut self, e: MameleError) -> MameleError {
        error!("Session with the emulator failed: {}", e);
        self.close().await;
        e
    }

    async fn close(&mut self) {
        self.phase = Phase::Closed;
        self.last_received = false;
        if let Some(connection) = self.connection.take() {
            connection.close().await;
        }
        if let Some(emulator) = self.emulator.take() {
            reap(emulator, self.exit_grace).await;
        }
    }
}

/// Wait for the emulator to exit, killing it once `grace` has passed
async fn reap(mut emulator: Child, grace: Duration) {
    match tokio::time::timeout(grace, emulator.wait()).await {
        Ok(Ok(status)) => info!("Emulator exited: {}", status),
        Ok(Err(e)) => warn!("Failed to wait for the emulator: {}", e),
        Err(_) => {
            warn!("Emulator still running after {:?}, killing it", grace);
            kill(Some(emulator)).await;
        }
    }
}

async fn kill(emulator: Option<Child>) {
    if let Some(mut emulator) = emulator {
        if let Err(e) = emulator.kill().await {
            warn!("Failed to kill the emulator: {}", e);
        }
    }
}

async fn receive_capabilities<S: AsyncRead + AsyncWrite + Unpin>(
    connection: &mut Connection<S>,
) -> Result<Capabilities> {
    let screen = match connection.receive_emulator_message(None).await? {
        EmulatorMessage::Size(screen) => screen,
        EmulatorMessage::Quit => return Err(MameleError::UnexpectedQuit),
        other => {
            return Err(MameleError::ProtocolError(format!(
                "Expected size, got {}",
                other.tag()
            )));
        }
    };

    let used = match connection.receive_emulator_message(Some(screen)).await? {
        EmulatorMessage::Used(used) => used,
        EmulatorMessage::Quit => return Err(MameleError::UnexpectedQuit),
        other => {
            return Err(MameleError::ProtocolError(format!(
                "Expected used, got {}",
                other.tag()
            )));
        }
    };

    Ok(Capabilities { screen, used })
}

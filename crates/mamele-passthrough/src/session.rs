//! Emulator-side session
//!
//! Runs inside the emulator process. Reports capabilities once, then
//! exchanges one update for one command per reported frame.

use mamele_bridge::{Connection, DriverCommand, EmulatorMessage, Update};
use mamele_core::{ButtonBank, MameleError, Result, ScreenSize, Switch, SwitchStates};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info, warn};

/// What the host should do after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAdvance {
    /// Skip calling the frame hook for this many frames
    Skip(u32),
    /// The driver asked us to quit; the connection is closed
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connected,
    Announced,
    Closed,
}

/// Emulator end of a mamele session
pub struct EmulatorSession<S> {
    connection: Option<Connection<S>>,
    phase: Phase,
    buttons: ButtonBank,
    used: SwitchStates,
    screen: Option<ScreenSize>,
    game_name: String,
    frames_to_skip: u32,
    reset_requested: bool,
    update_count: u64,
}

#[cfg(unix)]
impl EmulatorSession<tokio::net::UnixStream> {
    /// Connect to the driver listening at `address`
    pub async fn connect(address: impl AsRef<std::path::Path>) -> Result<Self> {
        let connection = mamele_bridge::connect(address).await?;
        Ok(Self::new(connection))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> EmulatorSession<S> {
    pub fn new(connection: Connection<S>) -> Self {
        Self {
            connection: Some(connection),
            phase: Phase::Connected,
            buttons: ButtonBank::new(),
            used: SwitchStates::none(),
            screen: None,
            game_name: String::new(),
            frames_to_skip: 0,
            reset_requested: false,
            update_count: 0,
        }
    }

    fn connection(&mut self) -> Result<&mut Connection<S>> {
        self.connection
            .as_mut()
            .ok_or_else(|| MameleError::SendError("Session is closed".into()))
    }

    /// Report screen size and used switches. Must be called exactly once,
    /// before the first frame.
    pub async fn announce(
        &mut self,
        game_name: &str,
        width: u32,
        height: u32,
        buttons_used: [bool; Switch::COUNT],
    ) -> Result<()> {
        if self.phase != Phase::Connected {
            return Err(MameleError::ProtocolError(
                "Capabilities can only be announced once, before the first frame".into(),
            ));
        }
        if width == 0 || height == 0 {
            return Err(MameleError::ProtocolError(format!(
                "Screen dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let screen = ScreenSize::new(width, height);
        let used = SwitchStates::from_array(buttons_used);
        info!("Announcing {} at {} using {}", game_name, screen, used);

        let result = async {
            let connection = self.connection()?;
            connection
                .send_emulator_message(&EmulatorMessage::Size(screen))
                .await?;
            connection
                .send_emulator_message(&EmulatorMessage::Used(used))
                .await
        }
        .await;

        if let Err(e) = result {
            return Err(self.fail(e).await);
        }

        self.game_name = game_name.to_string();
        self.screen = Some(screen);
        self.used = used;
        self.phase = Phase::Announced;
        Ok(())
    }

    /// Called by the host once per emulated frame.
    ///
    /// Sends an update and waits for the driver's next command, unless the
    /// driver asked for frames to be skipped.
    pub async fn on_frame(
        &mut self,
        score: i64,
        game_over: bool,
        pixels: &[u8],
    ) -> Result<FrameAdvance> {
        let screen = match self.phase {
            Phase::Announced => self.screen.ok_or_else(|| {
                MameleError::ProtocolError("Screen size missing after announce".into())
            })?,
            Phase::Connected => {
                return Err(MameleError::ProtocolError(
                    "Frame reported before capabilities were announced".into(),
                ));
            }
            Phase::Closed => return Err(MameleError::SendError("Session is closed".into())),
        };

        self.update_count += 1;

        if self.frames_to_skip > 0 {
            let skip = self.frames_to_skip - 1;
            self.frames_to_skip = 0;
            return Ok(FrameAdvance::Skip(skip));
        }

        if pixels.len() != screen.frame_len() {
            return Err(MameleError::ProtocolError(format!(
                "Frame is {} bytes, expected {} for {}",
                pixels.len(),
                screen.frame_len(),
                screen
            )));
        }

        let update = EmulatorMessage::Update(Update {
            score,
            game_over,
            pixels: pixels.to_vec(),
        });

        let result = async {
            let connection = self.connection()?;
            connection.send_emulator_message(&update).await?;
            connection.receive_driver_command().await
        }
        .await;

        match result {
            Ok(command) => self.handle(command).await,
            Err(e) => Err(self.fail(e).await),
        }
    }

    async fn handle(&mut self, command: DriverCommand) -> Result<FrameAdvance> {
        match command {
            DriverCommand::Input(states) => self.buttons.apply(&states),
            DriverCommand::Reset => self.reset_requested = true,
            DriverCommand::Skip(frames) => self.frames_to_skip = frames,
            DriverCommand::Quit => {
                info!("Driver asked us to quit");
                if let Some(connection) = self.connection.take() {
                    connection.close().await;
                }
                self.phase = Phase::Closed;
                return Ok(FrameAdvance::Quit);
            }
        }
        Ok(FrameAdvance::Skip(0))
    }

    /// Switch states for the host to apply this frame. Unused switches are
    /// always released.
    pub fn poll_buttons(&mut self) -> [bool; Switch::COUNT] {
        let current = self.buttons.states().as_array();
        let used = self.used.as_array();
        let mut polled = [false; Switch::COUNT];
        for ((slot, pressed), used) in polled.iter_mut().zip(current).zip(used) {
            *slot = pressed && used;
        }
        self.buttons.tick();
        polled
    }

    /// One-shot: true once after each `rest` command
    pub fn should_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }

    /// Tell the driver we are going away and close the connection
    pub async fn shutdown(&mut self) {
        self.phase = Phase::Closed;
        if let Some(mut connection) = self.connection.take() {
            info!("Shutting down after {} updates", self.update_count);
            if let Err(e) = connection
                .send_emulator_message(&EmulatorMessage::Quit)
                .await
            {
                warn!("Could not tell the driver we are quitting: {}", e);
            }
            connection.close().await;
        }
    }

    /// Log a session-ending failure and tear down
    async fn fail(&mut self, e: MameleError) -> MameleError {
        error!("Something went wrong talking to the driver: {}", e);
        self.shutdown().await;
        e
    }

    pub fn buttons(&self) -> &ButtonBank {
        &self.buttons
    }

    pub fn screen(&self) -> Option<ScreenSize> {
        self.screen
    }

    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    /// Frames reported by the host so far, skipped ones included
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::DuplexStream;

    const ALL_USED: [bool; Switch::COUNT] = [true; Switch::COUNT];

    async fn announced(
        used: [bool; Switch::COUNT],
    ) -> (EmulatorSession<DuplexStream>, Connection<DuplexStream>) {
        let (emulator_end, driver_end) = tokio::io::duplex(64 * 1024);
        let mut session = EmulatorSession::new(Connection::new(emulator_end));
        let mut driver = Connection::new(driver_end);

        session.announce("testgame", 2, 1, used).await.unwrap();
        assert_eq!(
            driver.receive_emulator_message(None).await.unwrap(),
            EmulatorMessage::Size(ScreenSize::new(2, 1))
        );
        assert_eq!(
            driver.receive_emulator_message(None).await.unwrap(),
            EmulatorMessage::Used(SwitchStates::from_array(used))
        );
        (session, driver)
    }

    async fn expect_update(driver: &mut Connection<DuplexStream>, score: i64) {
        match driver
            .receive_emulator_message(Some(ScreenSize::new(2, 1)))
            .await
            .unwrap()
        {
            EmulatorMessage::Update(update) => assert_eq!(update.score, score),
            other => panic!("Expected update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_announce_once() {
        let (mut session, _driver) = announced(ALL_USED).await;
        assert_eq!(session.game_name(), "testgame");
        assert!(matches!(
            session.announce("again", 2, 1, ALL_USED).await,
            Err(MameleError::ProtocolError(_))
        ));
    }

    #[tokio::test]
    async fn test_frame_before_announce() {
        let (emulator_end, _driver_end) = tokio::io::duplex(1024);
        let mut session = EmulatorSession::new(Connection::new(emulator_end));
        assert!(matches!(
            session.on_frame(0, false, &[0; 8]).await,
            Err(MameleError::ProtocolError(_))
        ));
    }

    #[tokio::test]
    async fn test_input_presses_used_switches() {
        let (mut session, mut driver) = announced(ALL_USED).await;

        let left = SwitchStates::parse("100000000000").unwrap();
        driver
            .send_driver_command(&DriverCommand::Input(left))
            .await
            .unwrap();
        assert_eq!(
            session.on_frame(0, false, &[0; 8]).await.unwrap(),
            FrameAdvance::Skip(0)
        );
        expect_update(&mut driver, 0).await;

        let polled = session.poll_buttons();
        assert!(polled[0]);
        assert!(polled[1..].iter().all(|&on| !on));
    }

    #[tokio::test]
    async fn test_unused_switch_never_polled() {
        let mut used = ALL_USED;
        used[Switch::Left.index()] = false;
        let (mut session, mut driver) = announced(used).await;

        driver
            .send_driver_command(&DriverCommand::Input(SwitchStates::only(Switch::Left)))
            .await
            .unwrap();
        session.on_frame(0, false, &[0; 8]).await.unwrap();

        assert!(session.buttons().current_state(Switch::Left).unwrap());
        assert_eq!(session.poll_buttons(), [false; Switch::COUNT]);
    }

    #[tokio::test]
    async fn test_poll_ticks_buttons() {
        let (mut session, mut driver) = announced(ALL_USED).await;
        driver
            .send_driver_command(&DriverCommand::Input(SwitchStates::only(Switch::Coin)))
            .await
            .unwrap();
        session.on_frame(0, false, &[0; 8]).await.unwrap();

        assert!(session.buttons().changed_since_last_tick(Switch::Coin).unwrap());
        session.poll_buttons();
        assert!(!session.buttons().changed_since_last_tick(Switch::Coin).unwrap());
    }

    #[tokio::test]
    async fn test_skip_frames() {
        let (mut session, mut driver) = announced(ALL_USED).await;

        driver
            .send_driver_command(&DriverCommand::Skip(3))
            .await
            .unwrap();
        assert_eq!(
            session.on_frame(1, false, &[0; 8]).await.unwrap(),
            FrameAdvance::Skip(0)
        );
        expect_update(&mut driver, 1).await;

        // No round trip: the host is told to skip the remaining frames
        assert_eq!(
            session.on_frame(2, false, &[0; 8]).await.unwrap(),
            FrameAdvance::Skip(2)
        );

        driver
            .send_driver_command(&DriverCommand::Input(SwitchStates::none()))
            .await
            .unwrap();
        assert_eq!(
            session.on_frame(3, false, &[0; 8]).await.unwrap(),
            FrameAdvance::Skip(0)
        );
        expect_update(&mut driver, 3).await;
        assert_eq!(session.update_count(), 3);
    }

    #[tokio::test]
    async fn test_reset_is_one_shot() {
        let (mut session, mut driver) = announced(ALL_USED).await;
        assert!(!session.should_reset());

        driver
            .send_driver_command(&DriverCommand::Reset)
            .await
            .unwrap();
        session.on_frame(0, false, &[0; 8]).await.unwrap();

        assert!(session.should_reset());
        assert!(!session.should_reset());
    }

    #[tokio::test]
    async fn test_quit_from_driver() {
        let (mut session, mut driver) = announced(ALL_USED).await;

        driver
            .send_driver_command(&DriverCommand::Quit)
            .await
            .unwrap();
        assert_eq!(
            session.on_frame(0, true, &[0; 8]).await.unwrap(),
            FrameAdvance::Quit
        );
        assert!(session.is_closed());
        assert!(session.on_frame(0, true, &[0; 8]).await.is_err());
    }

    #[tokio::test]
    async fn test_bad_input_shuts_down() {
        let (mut session, mut driver) = announced(ALL_USED).await;

        driver.send(b"inpt 10\n").await.unwrap();
        assert!(matches!(
            session.on_frame(7, false, &[0; 8]).await,
            Err(MameleError::ProtocolError(_))
        ));
        assert!(session.is_closed());

        expect_update(&mut driver, 7).await;
        assert_eq!(
            driver.receive_emulator_message(None).await.unwrap(),
            EmulatorMessage::Quit
        );
    }

    #[tokio::test]
    async fn test_wrong_frame_length() {
        let (mut session, _driver) = announced(ALL_USED).await;
        assert!(matches!(
            session.on_frame(0, false, &[0; 3]).await,
            Err(MameleError::ProtocolError(_))
        ));
        assert!(!session.is_closed());
    }

    #[tokio::test]
    async fn test_host_shutdown_sends_quit() {
        let (mut session, mut driver) = announced(ALL_USED).await;
        session.shutdown().await;
        assert_eq!(
            driver.receive_emulator_message(None).await.unwrap(),
            EmulatorMessage::Quit
        );
    }
}

//! Host-facing hook interface
//!
//! The emulator owns the frame loop and calls into us synchronously.
//! `PassthroughHook` drives an [`EmulatorSession`] on a private
//! current-thread runtime, so each call blocks the host exactly as long as
//! the round trip to the driver takes.

use crate::session::{EmulatorSession, FrameAdvance};
use mamele_core::{MameleError, Result, Switch};
use std::path::Path;
use tokio::net::UnixStream;
use tokio::runtime::Runtime;
use tracing::info;

/// Calls the emulator host makes into an agent
pub trait FrameHook {
    /// Report the game and its capabilities. Called once, before any frame.
    fn announce(
        &mut self,
        game_name: &str,
        width: u32,
        height: u32,
        buttons_used: [bool; Switch::COUNT],
    ) -> Result<()>;

    /// Report one emulated frame. The host must honour the returned advance.
    fn on_frame(&mut self, score: i64, game_over: bool, pixels: &[u8]) -> Result<FrameAdvance>;

    /// Switch states to apply this frame
    fn poll_buttons(&mut self) -> [bool; Switch::COUNT];

    /// True once for each reset the agent requested
    fn should_reset(&mut self) -> bool;

    /// The host is shutting down
    fn shutdown(&mut self);
}

/// Relays frames to a driver listening on a Unix socket
pub struct PassthroughHook {
    runtime: Runtime,
    session: EmulatorSession<UnixStream>,
}

impl PassthroughHook {
    /// Connect to the driver at `address`
    pub fn connect(address: impl AsRef<Path>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| MameleError::SetupError(format!("Failed to start runtime: {}", e)))?;

        let session = runtime.block_on(EmulatorSession::connect(address))?;
        Ok(Self { runtime, session })
    }

    /// Connect using the option string the emulator passes through to the
    /// agent module. The string is the driver's socket path.
    pub fn from_options(options: &str) -> Result<Self> {
        let address = options.trim();
        if address.is_empty() {
            return Err(MameleError::ConnectError(
                "No socket path in the agent options".into(),
            ));
        }
        info!("Passthrough connecting to {}", address);
        Self::connect(address)
    }

    pub fn session(&self) -> &EmulatorSession<UnixStream> {
        &self.session
    }
}

impl FrameHook for PassthroughHook {
    fn announce(
        &mut self,
        game_name: &str,
        width: u32,
        height: u32,
        buttons_used: [bool; Switch::COUNT],
    ) -> Result<()> {
        self.runtime
            .block_on(self.session.announce(game_name, width, height, buttons_used))
    }

    fn on_frame(&mut self, score: i64, game_over: bool, pixels: &[u8]) -> Result<FrameAdvance> {
        self.runtime
            .block_on(self.session.on_frame(score, game_over, pixels))
    }

    fn poll_buttons(&mut self) -> [bool; Switch::COUNT] {
        self.session.poll_buttons()
    }

    fn should_reset(&mut self) -> bool {
        self.session.should_reset()
    }

    fn shutdown(&mut self) {
        self.runtime.block_on(self.session.shutdown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mamele_bridge::{DriverCommand, EmulatorMessage, listen};
    use mamele_core::{ScreenSize, SwitchStates};

    #[test]
    fn test_hook_round_trip() {
        let driver_runtime = tokio::runtime::Runtime::new().unwrap();
        let listener = driver_runtime.block_on(async { listen() }).unwrap();
        let options = format!("  {}\n", listener.address().display());

        let emulator = std::thread::spawn(move || {
            let mut hook = PassthroughHook::from_options(&options).unwrap();
            let mut used = [false; Switch::COUNT];
            used[Switch::Left.index()] = true;
            used[Switch::Right.index()] = true;

            hook.announce("pong", 2, 2, used).unwrap();
            let first = hook.on_frame(100, false, &[0; 16]).unwrap();
            let buttons = hook.poll_buttons();
            let reset = hook.should_reset();
            let second = hook.on_frame(150, false, &[0; 16]).unwrap();
            (first, buttons, reset, second, hook.session().update_count())
        });

        driver_runtime.block_on(async move {
            let mut conn = listener.accept().await.unwrap();
            let screen = match conn.receive_emulator_message(None).await.unwrap() {
                EmulatorMessage::Size(size) => size,
                other => panic!("Expected size, got {:?}", other),
            };
            assert_eq!(screen, ScreenSize::new(2, 2));
            assert_eq!(
                conn.receive_emulator_message(None).await.unwrap(),
                EmulatorMessage::Used(SwitchStates::parse("110000000000").unwrap())
            );

            assert!(matches!(
                conn.receive_emulator_message(Some(screen)).await.unwrap(),
                EmulatorMessage::Update(_)
            ));
            conn.send_driver_command(&DriverCommand::Input(SwitchStates::only(Switch::Right)))
                .await
                .unwrap();

            assert!(matches!(
                conn.receive_emulator_message(Some(screen)).await.unwrap(),
                EmulatorMessage::Update(_)
            ));
            conn.send_driver_command(&DriverCommand::Quit).await.unwrap();
            conn.close().await;
        });

        let (first, buttons, reset, second, updates) = emulator.join().unwrap();
        assert_eq!(first, FrameAdvance::Skip(0));
        assert!(buttons[Switch::Right.index()]);
        assert_eq!(buttons.iter().filter(|&&on| on).count(), 1);
        assert!(!reset);
        assert_eq!(second, FrameAdvance::Quit);
        assert_eq!(updates, 2);
    }

    #[test]
    fn test_empty_options() {
        assert!(matches!(
            PassthroughHook::from_options("   "),
            Err(MameleError::ConnectError(_))
        ));
    }
}

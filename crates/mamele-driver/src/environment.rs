//! Arcade environment trait

use crate::session::DriverSession;
use async_trait::async_trait;
use mamele_core::{Action, ActionSpace, Result, ScreenSize};
use tokio::io::{AsyncRead, AsyncWrite};

/// An arcade game an agent can play
///
/// Implemented by [`DriverSession`]; agents written against the trait can be
/// run against a scripted stand-in.
#[async_trait]
pub trait ArcadeEnvironment: Send {
    /// Screen dimensions in pixels
    fn screen_size(&self) -> ScreenSize;

    /// Control groups the game uses
    fn action_space(&self) -> &ActionSpace;

    /// True from the first game-over report until the next restart
    fn is_game_over(&self) -> bool;

    /// Latest frame as packed RGB
    fn screen_rgb(&self) -> Vec<u8>;

    /// Hold an action for one frame and return the reward
    async fn act(&mut self, action: &Action) -> Result<i64>;

    /// Start a fresh game
    async fn restart_game(&mut self) -> Result<()>;

    /// Shut the game down
    async fn quit(&mut self) -> Result<()>;
}

#[async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> ArcadeEnvironment for DriverSession<S> {
    fn screen_size(&self) -> ScreenSize {
        self.screen_dimensions()
    }

    fn action_space(&self) -> &ActionSpace {
        self.minimal_action_set()
    }

    fn is_game_over(&self) -> bool {
        DriverSession::is_game_over(self)
    }

    fn screen_rgb(&self) -> Vec<u8> {
        DriverSession::screen_rgb(self)
    }

    async fn act(&mut self, action: &Action) -> Result<i64> {
        DriverSession::act(self, action).await
    }

    async fn restart_game(&mut self) -> Result<()> {
        DriverSession::restart_game(self).await
    }

    async fn quit(&mut self) -> Result<()> {
        DriverSession::quit(self).await
    }
}

//! Gentle key-masher

use mamele_core::{Action, ActionSpace, Result};
use mamele_driver::ArcadeEnvironment;
use rand::Rng;
use tracing::{debug, info};

/// On average, frames between changes of action
pub const CHANGE_ACTION_PERIOD: u32 = 10;

/// What a play run got through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayStats {
    pub games: u32,
    pub frames: u64,
    pub total_reward: i64,
}

/// Pick one choice from every group
pub fn random_action(space: &ActionSpace, rng: &mut impl Rng) -> Action {
    Action(
        space
            .groups()
            .iter()
            .map(|group| group.choices[rng.random_range(0..group.choices.len())])
            .collect(),
    )
}

/// Play `games` games (0 plays forever), holding a random action and
/// changing it now and then. Quits the environment when done.
pub async fn play<E: ArcadeEnvironment>(
    env: &mut E,
    games: u32,
    rng: &mut impl Rng,
) -> Result<PlayStats> {
    let change_probability = 1.0 / f64::from(CHANGE_ACTION_PERIOD);
    let mut action = random_action(env.action_space(), rng);
    let mut stats = PlayStats::default();
    // A fresh session reports game over, so the first pass starts game one
    let mut started = 0;

    loop {
        if env.is_game_over() {
            if started > 0 {
                stats.games += 1;
                info!("Game {} over", stats.games);
            }
            if games != 0 && started == games {
                break;
            }
            env.restart_game().await?;
            started += 1;
        }

        if rng.random_bool(change_probability) {
            action = random_action(env.action_space(), rng);
            debug!("Switching to {:?}", action);
        }
        stats.total_reward += env.act(&action).await?;
        stats.frames += 1;
    }

    env.quit().await?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mamele_core::{ScreenSize, SwitchStates};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Games last a fixed number of frames and score one point per frame
    struct FakeArcade {
        space: ActionSpace,
        game_length: u64,
        frame: u64,
        game_over: bool,
        restarts: u32,
        quit: bool,
    }

    impl FakeArcade {
        fn new(game_length: u64) -> Self {
            Self {
                space: ActionSpace::from_used(&SwitchStates::parse("111110000011").unwrap()),
                game_length,
                frame: 0,
                game_over: true,
                restarts: 0,
                quit: false,
            }
        }
    }

    #[async_trait]
    impl ArcadeEnvironment for FakeArcade {
        fn screen_size(&self) -> ScreenSize {
            ScreenSize::new(1, 1)
        }

        fn action_space(&self) -> &ActionSpace {
            &self.space
        }

        fn is_game_over(&self) -> bool {
            self.game_over
        }

        fn screen_rgb(&self) -> Vec<u8> {
            vec![0; 3]
        }

        async fn act(&mut self, action: &Action) -> Result<i64> {
            self.space.index_of(action)?;
            assert!(!self.game_over, "acted on a finished game");
            self.frame += 1;
            if self.frame == self.game_length {
                self.game_over = true;
            }
            Ok(1)
        }

        async fn restart_game(&mut self) -> Result<()> {
            self.restarts += 1;
            self.frame = 0;
            self.game_over = false;
            Ok(())
        }

        async fn quit(&mut self) -> Result<()> {
            self.quit = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_plays_requested_games() {
        let mut arcade = FakeArcade::new(50);
        let mut rng = StdRng::seed_from_u64(1);

        let stats = play(&mut arcade, 3, &mut rng).await.unwrap();

        assert_eq!(arcade.restarts, 3);
        assert!(arcade.quit);
        assert_eq!(
            stats,
            PlayStats {
                games: 3,
                frames: 150,
                total_reward: 150,
            }
        );
    }

    #[tokio::test]
    async fn test_zero_games_keeps_playing() {
        // Stop the endless run by failing the fourth restart
        struct Limited(FakeArcade);

        #[async_trait]
        impl ArcadeEnvironment for Limited {
            fn screen_size(&self) -> ScreenSize {
                self.0.screen_size()
            }
            fn action_space(&self) -> &ActionSpace {
                self.0.action_space()
            }
            fn is_game_over(&self) -> bool {
                self.0.is_game_over()
            }
            fn screen_rgb(&self) -> Vec<u8> {
                self.0.screen_rgb()
            }
            async fn act(&mut self, action: &Action) -> Result<i64> {
                self.0.act(action).await
            }
            async fn restart_game(&mut self) -> Result<()> {
                if self.0.restarts == 3 {
                    return Err(mamele_core::MameleError::UnexpectedQuit);
                }
                self.0.restart_game().await
            }
            async fn quit(&mut self) -> Result<()> {
                self.0.quit().await
            }
        }

        let mut arcade = Limited(FakeArcade::new(5));
        let mut rng = StdRng::seed_from_u64(2);
        assert!(play(&mut arcade, 0, &mut rng).await.is_err());
        assert_eq!(arcade.0.restarts, 3);
        assert!(!arcade.0.quit);
    }

    #[test]
    fn test_random_action_fits_space() {
        let space = ActionSpace::from_used(&SwitchStates::parse("111111111111").unwrap());
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            assert!(space.index_of(&random_action(&space, &mut rng)).is_ok());
        }
    }
}

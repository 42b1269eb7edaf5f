//! Starting the emulator process

use mamele_core::{MameleError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::info;

/// Starts an emulator that will connect back to `address`
pub trait EmulatorLauncher {
    /// Returns the child process, or `None` when the emulator is not ours to
    /// own (already running, or hosted in-process).
    fn launch(&self, game: &str, address: &Path) -> Result<Option<Child>>;
}

/// Default ROM directory, `~/.le/roms`
pub fn default_rom_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".le").join("roms")
}

/// Launches MAME with the learning-environment agent interface
#[derive(Debug, Clone)]
pub struct MameLauncher {
    /// The MAME executable
    pub binary: PathBuf,
    /// Directory holding the game ROMs
    pub rom_path: PathBuf,
    /// Score and game-over description files
    pub data_path: PathBuf,
    /// Agent library MAME loads
    pub agent_library: PathBuf,
    /// Agent module name, first word of the agent options
    pub agent_module: String,
    /// Show the game window, throttled and with sound
    pub watch: bool,
}

impl MameLauncher {
    /// Use the layout of a mamele build directory
    pub fn new(install_dir: impl AsRef<Path>) -> Self {
        let install_dir = install_dir.as_ref();
        let data_path = install_dir.join("learning_environment");
        Self {
            binary: install_dir.join("mame64"),
            rom_path: default_rom_path(),
            agent_library: data_path.join("example_agents").join("pythonbinding.so"),
            data_path,
            agent_module: "passthrough".into(),
            watch: false,
        }
    }

    pub fn with_rom_path(mut self, rom_path: impl Into<PathBuf>) -> Self {
        self.rom_path = rom_path.into();
        self
    }

    pub fn watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// The full MAME command line for `game`
    pub fn command(&self, game: &str, address: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg(game)
            .args(["-nowriteconfig", "-noreadconfig", "-window"]);
        if !self.watch {
            command.args([
                "-nothrottle",
                "-noswitchres",
                "-video",
                "none",
                "-nole_show",
                "-sound",
                "none",
            ]);
        }
        command
            .args([
                "-noautosave",
                "-frameskip",
                "0",
                "-skip_gameinfo",
                "-noautoframeskip",
                "-use_le",
                "-le_library",
            ])
            .arg(&self.agent_library)
            .arg("-rompath")
            .arg(&self.rom_path)
            .arg("-le_datapath")
            .arg(&self.data_path)
            // One argument: the module name, then whatever the module is given
            .arg("-le_options")
            .arg(format!("{} {}", self.agent_module, address.display()));
        command
    }
}

impl EmulatorLauncher for MameLauncher {
    fn launch(&self, game: &str, address: &Path) -> Result<Option<Child>> {
        if !self.rom_path.is_dir() {
            return Err(MameleError::MissingRomPath(format!(
                "'{}' is not a directory. Put your ROMs there",
                self.rom_path.display()
            )));
        }

        info!("Starting {} with {}", game, self.binary.display());
        let child = self
            .command(game, address)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                MameleError::SetupError(format!(
                    "Failed to start {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;
        Ok(Some(child))
    }
}

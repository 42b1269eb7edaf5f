//! Wire protocol between the driver and the emulator
//!
//! Every message starts with a fixed 4-byte lowercase tag. Text payloads
//! follow the tag and end in `\n`; the `updt` message ends with a raw
//! BGRA frame whose length both sides know from the negotiated screen size.
//!
//! | Tag    | Direction          | Payload                               |
//! |--------|--------------------|---------------------------------------|
//! | `size` | emulator → driver  | `<width>x<height>\n`                  |
//! | `used` | emulator → driver  | 12 × `0`/`1`, `\n`                    |
//! | `updt` | emulator → driver  | `<score>\n<0/1>\n<width*height*4 bytes>` |
//! | `inpt` | driver → emulator  | 12 × `0`/`1`, `\n`                    |
//! | `rest` | driver → emulator  | none                                  |
//! | `skip` | driver → emulator  | `<frames>\n`                          |
//! | `quit` | either             | none                                  |

use crate::connection::Connection;
use mamele_core::{MameleError, Result, ScreenSize, SwitchStates};
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Message tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Size,
    Used,
    Update,
    Input,
    Reset,
    Skip,
    Quit,
}

impl Tag {
    /// Every tag is this long
    pub const LEN: usize = 4;

    const ALL: [Tag; 7] = [
        Tag::Size,
        Tag::Used,
        Tag::Update,
        Tag::Input,
        Tag::Reset,
        Tag::Skip,
        Tag::Quit,
    ];

    pub fn as_bytes(self) -> &'static [u8; Tag::LEN] {
        match self {
            Tag::Size => b"size",
            Tag::Used => b"used",
            Tag::Update => b"updt",
            Tag::Input => b"inpt",
            Tag::Reset => b"rest",
            Tag::Skip => b"skip",
            Tag::Quit => b"quit",
        }
    }

    /// Parse a received tag, ignoring case
    pub fn parse(bytes: &[u8]) -> Result<Tag> {
        Tag::ALL
            .iter()
            .copied()
            .find(|tag| bytes.eq_ignore_ascii_case(tag.as_bytes()))
            .ok_or_else(|| {
                MameleError::ProtocolError(format!(
                    "Unknown command tag '{}'",
                    String::from_utf8_lossy(bytes)
                ))
            })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Per-frame observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub score: i64,
    pub game_over: bool,
    /// Raw BGRA frame
    pub pixels: Vec<u8>,
}

/// Messages sent by the emulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatorMessage {
    Size(ScreenSize),
    Used(SwitchStates),
    Update(Update),
    Quit,
}

impl EmulatorMessage {
    pub fn tag(&self) -> Tag {
        match self {
            EmulatorMessage::Size(_) => Tag::Size,
            EmulatorMessage::Used(_) => Tag::Used,
            EmulatorMessage::Update(_) => Tag::Update,
            EmulatorMessage::Quit => Tag::Quit,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.tag().as_bytes().to_vec();
        match self {
            EmulatorMessage::Size(size) => buf.extend_from_slice(format!(" {}\n", size).as_bytes()),
            EmulatorMessage::Used(used) => buf.extend_from_slice(format!(" {}\n", used).as_bytes()),
            EmulatorMessage::Update(update) => {
                let header = format!(" {}\n{}\n", update.score, u8::from(update.game_over));
                buf.reserve(header.len() + update.pixels.len());
                buf.extend_from_slice(header.as_bytes());
                buf.extend_from_slice(&update.pixels);
            }
            EmulatorMessage::Quit => {}
        }
        buf
    }
}

/// Commands sent by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    /// Set every switch
    Input(SwitchStates),
    /// Reset the machine
    Reset,
    /// Skip this many frames before the next update
    Skip(u32),
    Quit,
}

impl DriverCommand {
    pub fn tag(&self) -> Tag {
        match self {
            DriverCommand::Input(_) => Tag::Input,
            DriverCommand::Reset => Tag::Reset,
            DriverCommand::Skip(_) => Tag::Skip,
            DriverCommand::Quit => Tag::Quit,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.tag().as_bytes().to_vec();
        match self {
            DriverCommand::Input(states) => {
                buf.extend_from_slice(format!(" {}\n", states).as_bytes())
            }
            DriverCommand::Skip(frames) => {
                buf.extend_from_slice(format!(" {}\n", frames).as_bytes())
            }
            DriverCommand::Reset | DriverCommand::Quit => {}
        }
        buf
    }
}

/// Parse a numeric text field
fn parse_number<T: std::str::FromStr>(field: &str, what: &str) -> Result<T> {
    field.parse().map_err(|_| {
        MameleError::ProtocolError(format!("Expected an integer {}, got '{}'", what, field))
    })
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    async fn receive_tag(&mut self) -> Result<Tag> {
        let bytes = self.receive_exact(Tag::LEN).await?;
        Tag::parse(&bytes)
    }

    /// Receive one `\n`-terminated text field, surrounding whitespace removed
    async fn receive_line(&mut self) -> Result<String> {
        let bytes = self.receive_until(b'\n').await?;
        let line = String::from_utf8(bytes)
            .map_err(|_| MameleError::ProtocolError("Text field is not UTF-8".into()))?;
        Ok(line.trim().to_string())
    }

    /// Receive the next message from the emulator.
    ///
    /// `screen` must be known before an `updt` can be framed.
    pub async fn receive_emulator_message(
        &mut self,
        screen: Option<ScreenSize>,
    ) -> Result<EmulatorMessage> {
        let tag = self.receive_tag().await?;
        debug!("[Emulator→Driver] {}", tag);

        match tag {
            Tag::Size => Ok(EmulatorMessage::Size(self.receive_line().await?.parse()?)),
            Tag::Used => Ok(EmulatorMessage::Used(SwitchStates::parse(
                &self.receive_line().await?,
            )?)),
            Tag::Update => {
                let screen = screen.ok_or_else(|| {
                    MameleError::ProtocolError("Update received before screen size".into())
                })?;
                let score = parse_number(&self.receive_line().await?, "score")?;
                let game_over = match self.receive_line().await?.as_str() {
                    "1" => true,
                    "0" => false,
                    other => {
                        return Err(MameleError::ProtocolError(format!(
                            "Game over flag must be 0 or 1, got '{}'",
                            other
                        )));
                    }
                };
                let pixels = self.receive_exact(screen.frame_len()).await?;
                Ok(EmulatorMessage::Update(Update {
                    score,
                    game_over,
                    pixels,
                }))
            }
            Tag::Quit => Ok(EmulatorMessage::Quit),
            other => Err(MameleError::ProtocolError(format!(
                "Driver-bound stream carried '{}'",
                other
            ))),
        }
    }

    /// Receive the next command from the driver
    pub async fn receive_driver_command(&mut self) -> Result<DriverCommand> {
        let tag = self.receive_tag().await?;
        debug!("[Driver→Emulator] {}", tag);

        match tag {
            Tag::Input => Ok(DriverCommand::Input(SwitchStates::parse(
                &self.receive_line().await?,
            )?)),
            Tag::Reset => Ok(DriverCommand::Reset),
            Tag::Skip => Ok(DriverCommand::Skip(parse_number(
                &self.receive_line().await?,
                "frame count",
            )?)),
            Tag::Quit => Ok(DriverCommand::Quit),
            other => Err(MameleError::ProtocolError(format!(
                "Emulator-bound stream carried '{}'",
                other
            ))),
        }
    }

    pub async fn send_emulator_message(&mut self, message: &EmulatorMessage) -> Result<()> {
        debug!("[Emulator→Driver] sending {}", message.tag());
        self.send(&message.encode()).await
    }

    pub async fn send_driver_command(&mut self, command: &DriverCommand) -> Result<()> {
        debug!("[Driver→Emulator] sending {}", command.tag());
        self.send(&command.encode()).await
    }
}

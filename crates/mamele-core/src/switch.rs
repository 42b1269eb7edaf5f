//! The twelve physical switches and their wire bitstring

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::{MameleError, Result};

/// Switch positions for left/right
pub const HORIZONTAL_RANGE: Range<usize> = 0..2;
/// Switch positions for up/down
pub const VERTICAL_RANGE: Range<usize> = 2..4;
/// Switch positions for the six fire buttons
pub const BUTTONS_RANGE: Range<usize> = 4..10;
/// Coin and player 1 start
pub const MISC_RANGE: Range<usize> = 10..12;

/// One of the twelve binary controls, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Switch {
    Left,
    Right,
    Up,
    Down,
    Button1,
    Button2,
    Button3,
    Button4,
    Button5,
    Button6,
    Coin,
    Player1,
}

impl Switch {
    /// Number of switches on the panel
    pub const COUNT: usize = 12;

    /// All switches in wire order
    pub const ALL: [Switch; Switch::COUNT] = [
        Switch::Left,
        Switch::Right,
        Switch::Up,
        Switch::Down,
        Switch::Button1,
        Switch::Button2,
        Switch::Button3,
        Switch::Button4,
        Switch::Button5,
        Switch::Button6,
        Switch::Coin,
        Switch::Player1,
    ];

    /// Position in the wire bitstring
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Switch> {
        Switch::ALL.get(index).copied()
    }

    /// Lowercase name used on the agent API
    pub fn name(self) -> &'static str {
        match self {
            Switch::Left => "left",
            Switch::Right => "right",
            Switch::Up => "up",
            Switch::Down => "down",
            Switch::Button1 => "button1",
            Switch::Button2 => "button2",
            Switch::Button3 => "button3",
            Switch::Button4 => "button4",
            Switch::Button5 => "button5",
            Switch::Button6 => "button6",
            Switch::Coin => "coin",
            Switch::Player1 => "player1",
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Switch {
    type Err = MameleError;

    fn from_str(s: &str) -> Result<Self> {
        Switch::ALL
            .iter()
            .copied()
            .find(|switch| switch.name() == s)
            .ok_or_else(|| MameleError::InvalidSwitch(s.to_string()))
    }
}

/// Anything that names a switch
pub trait IntoSwitch {
    fn into_switch(self) -> Result<Switch>;
}

impl IntoSwitch for Switch {
    fn into_switch(self) -> Result<Switch> {
        Ok(self)
    }
}

impl IntoSwitch for &str {
    fn into_switch(self) -> Result<Switch> {
        self.parse()
    }
}

/// On/off state for every switch, transmitted as a 12-character `0`/`1` string
///
/// Used both for the `used` capability and for `inpt` commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SwitchStates([bool; Switch::COUNT]);

impl SwitchStates {
    /// Everything released
    pub fn none() -> Self {
        Self::default()
    }

    /// Only `switch` pressed
    pub fn only(switch: Switch) -> Self {
        let mut states = Self::none();
        states.set(switch, true);
        states
    }

    pub fn from_array(states: [bool; Switch::COUNT]) -> Self {
        Self(states)
    }

    /// Parse the wire form. Exactly twelve characters, each `0` or `1`.
    pub fn parse(description: &str) -> Result<Self> {
        let chars: Vec<char> = description.chars().collect();
        if chars.len() != Switch::COUNT {
            return Err(MameleError::ProtocolError(format!(
                "Expected {} switch states, got {} ('{}')",
                Switch::COUNT,
                chars.len(),
                description
            )));
        }

        let mut states = [false; Switch::COUNT];
        for (state, c) in states.iter_mut().zip(chars) {
            *state = match c {
                '1' => true,
                '0' => false,
                other => {
                    return Err(MameleError::ProtocolError(format!(
                        "Switch state must be 0 or 1, got '{}' in '{}'",
                        other, description
                    )));
                }
            };
        }
        Ok(Self(states))
    }

    /// Wire form
    pub fn encode(&self) -> String {
        self.0.iter().map(|&on| if on { '1' } else { '0' }).collect()
    }

    pub fn get(&self, switch: Switch) -> bool {
        self.0[switch.index()]
    }

    pub fn set(&mut self, switch: Switch, on: bool) {
        self.0[switch.index()] = on;
    }

    /// Switches that are on, in wire order
    pub fn pressed(&self) -> impl Iterator<Item = Switch> + '_ {
        Switch::ALL.iter().copied().filter(|&switch| self.get(switch))
    }

    pub fn as_array(&self) -> [bool; Switch::COUNT] {
        self.0
    }
}

impl fmt::Display for SwitchStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

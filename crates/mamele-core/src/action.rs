//! Action spaces and the action to switch-state table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MameleError, Result};
use crate::switch::{BUTTONS_RANGE, HORIZONTAL_RANGE, Switch, SwitchStates, VERTICAL_RANGE};

/// One choice within an action group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Choice {
    /// Leave the group's switches released
    Noop,
    /// Hold a switch down
    Press(Switch),
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Noop => f.write_str("noop"),
            Choice::Press(switch) => write!(f, "{}", switch),
        }
    }
}

impl FromStr for Choice {
    type Err = MameleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "noop" => Ok(Choice::Noop),
            name => name.parse().map(Choice::Press),
        }
    }
}

impl From<Choice> for String {
    fn from(choice: Choice) -> Self {
        choice.to_string()
    }
}

impl TryFrom<String> for Choice {
    type Error = MameleError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// A group of mutually exclusive choices, e.g. `horizontal = [noop, left, right]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGroup {
    pub name: String,
    pub choices: Vec<Choice>,
}

impl ActionGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            choices: vec![Choice::Noop],
        }
    }

    fn position(&self, choice: Choice) -> Option<usize> {
        self.choices.iter().position(|&c| c == choice)
    }
}

/// One choice per action group, in group order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(pub Vec<Choice>);

impl Action {
    /// Build an action from choice names such as `["left", "noop", "button1"]`
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<_>>>()
            .map(Action)
    }

    pub fn choices(&self) -> &[Choice] {
        &self.0
    }
}

/// The independent control groups an agent picks from on every step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSpace {
    groups: Vec<ActionGroup>,
}

impl ActionSpace {
    /// Derive the action space from the `used` capability
    ///
    /// Left/right form `horizontal`, up/down form `vertical`, and every used
    /// fire button gets a group of its own. Coin and player 1 never appear;
    /// they are reserved for the restart sequence.
    pub fn from_used(used: &SwitchStates) -> Self {
        let mut horizontal = ActionGroup::new("horizontal");
        let mut vertical = ActionGroup::new("vertical");
        let mut buttons = Vec::new();

        for switch in used.pressed() {
            let index = switch.index();
            if HORIZONTAL_RANGE.contains(&index) {
                horizontal.choices.push(Choice::Press(switch));
            } else if VERTICAL_RANGE.contains(&index) {
                vertical.choices.push(Choice::Press(switch));
            } else if BUTTONS_RANGE.contains(&index) {
                let mut group = ActionGroup::new(switch.name());
                group.choices.push(Choice::Press(switch));
                buttons.push(group);
            }
        }

        let mut groups = Vec::new();
        for group in [horizontal, vertical] {
            if group.choices.len() > 1 {
                groups.push(group);
            }
        }
        groups.extend(buttons);

        Self { groups }
    }

    pub fn groups(&self) -> &[ActionGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every group set to `noop`
    pub fn noop(&self) -> Action {
        Action(vec![Choice::Noop; self.groups.len()])
    }

    /// Number of distinct actions (product of the group sizes)
    pub fn action_count(&self) -> usize {
        self.groups
            .iter()
            .map(|group| group.choices.len())
            .product()
    }

    /// Every action, last group varying fastest
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.action_count());
        let mut positions = vec![0usize; self.groups.len()];

        loop {
            actions.push(Action(
                positions
                    .iter()
                    .zip(&self.groups)
                    .map(|(&position, group)| group.choices[position])
                    .collect(),
            ));

            // Advance the odometer
            let mut digit = positions.len();
            loop {
                if digit == 0 {
                    return actions;
                }
                digit -= 1;
                positions[digit] += 1;
                if positions[digit] < self.groups[digit].choices.len() {
                    break;
                }
                positions[digit] = 0;
            }
        }
    }

    /// Mixed-radix index of an action, rejecting wrong arity and foreign choices
    pub fn index_of(&self, action: &Action) -> Result<usize> {
        if action.0.len() != self.groups.len() {
            return Err(MameleError::ProtocolError(format!(
                "Action has {} choices, action space has {} groups",
                action.0.len(),
                self.groups.len()
            )));
        }

        let mut index = 0;
        for (group, &choice) in self.groups.iter().zip(&action.0) {
            let position = group.position(choice).ok_or_else(|| {
                MameleError::ProtocolError(format!(
                    "'{}' is not a choice in group '{}'",
                    choice, group.name
                ))
            })?;
            index = index * group.choices.len() + position;
        }
        Ok(index)
    }
}

/// Precomputed switch states for every action, plus coin and player 1 presses
#[derive(Debug, Clone)]
pub struct ActionTable {
    space: ActionSpace,
    entries: Vec<SwitchStates>,
    coin: SwitchStates,
    player1: SwitchStates,
}

impl ActionTable {
    pub fn new(space: ActionSpace) -> Self {
        let entries = space
            .actions()
            .iter()
            .map(|action| {
                let mut states = SwitchStates::none();
                for choice in action.choices() {
                    if let Choice::Press(switch) = choice {
                        states.set(*switch, true);
                    }
                }
                states
            })
            .collect();

        Self {
            space,
            entries,
            coin: SwitchStates::only(Switch::Coin),
            player1: SwitchStates::only(Switch::Player1),
        }
    }

    pub fn space(&self) -> &ActionSpace {
        &self.space
    }

    /// Switch states to send for `action`
    pub fn lookup(&self, action: &Action) -> Result<SwitchStates> {
        let index = self.space.index_of(action)?;
        Ok(self.entries[index])
    }

    pub fn coin(&self) -> SwitchStates {
        self.coin
    }

    pub fn player1(&self) -> SwitchStates {
        self.player1
    }

    /// Number of entries, including the coin and player 1 presses
    pub fn len(&self) -> usize {
        self.entries.len() + 2
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

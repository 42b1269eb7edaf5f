//! Emulator-side bank of the twelve switches

use crate::error::Result;
use crate::switch::{IntoSwitch, Switch, SwitchStates};

/// A single switch with its state on the previous tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Button {
    pressed: bool,
    last_pressed: bool,
}

impl Button {
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn changed(&self) -> bool {
        self.pressed != self.last_pressed
    }
}

/// The twelve switches in wire order
#[derive(Debug, Clone, Default)]
pub struct ButtonBank {
    buttons: [Button; Switch::COUNT],
}

impl ButtonBank {
    pub fn new() -> Self {
        Self::default()
    }

    fn button_mut(&mut self, switch: impl IntoSwitch) -> Result<&mut Button> {
        let switch = switch.into_switch()?;
        Ok(&mut self.buttons[switch.index()])
    }

    fn button(&self, switch: impl IntoSwitch) -> Result<&Button> {
        let switch = switch.into_switch()?;
        Ok(&self.buttons[switch.index()])
    }

    pub fn press(&mut self, switch: impl IntoSwitch) -> Result<()> {
        self.button_mut(switch)?.pressed = true;
        Ok(())
    }

    pub fn release(&mut self, switch: impl IntoSwitch) -> Result<()> {
        self.button_mut(switch)?.pressed = false;
        Ok(())
    }

    pub fn toggle(&mut self, switch: impl IntoSwitch) -> Result<()> {
        let button = self.button_mut(switch)?;
        button.pressed = !button.pressed;
        Ok(())
    }

    pub fn current_state(&self, switch: impl IntoSwitch) -> Result<bool> {
        Ok(self.button(switch)?.is_pressed())
    }

    pub fn changed_since_last_tick(&self, switch: impl IntoSwitch) -> Result<bool> {
        Ok(self.button(switch)?.changed())
    }

    /// Snapshot current state as previous for every switch
    pub fn tick(&mut self) {
        for button in &mut self.buttons {
            button.last_pressed = button.pressed;
        }
    }

    /// Press or release every switch to match an `inpt` command
    pub fn apply(&mut self, states: &SwitchStates) {
        for (button, on) in self.buttons.iter_mut().zip(states.as_array()) {
            button.pressed = on;
        }
    }

    pub fn states(&self) -> SwitchStates {
        let mut states = [false; Switch::COUNT];
        for (state, button) in states.iter_mut().zip(&self.buttons) {
            *state = button.pressed;
        }
        SwitchStates::from_array(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MameleError;

    #[test]
    fn test_press_release_toggle() {
        let mut bank = ButtonBank::new();
        bank.press("up").unwrap();
        assert!(bank.current_state(Switch::Up).unwrap());

        bank.toggle(Switch::Up).unwrap();
        assert!(!bank.current_state("up").unwrap());

        bank.toggle("coin").unwrap();
        bank.release("button1").unwrap();
        assert_eq!(bank.states().encode(), "000000000010");
    }

    #[test]
    fn test_changed_since_last_tick() {
        let mut bank = ButtonBank::new();
        bank.press(Switch::Button2).unwrap();
        assert!(bank.changed_since_last_tick(Switch::Button2).unwrap());
        assert!(!bank.changed_since_last_tick(Switch::Button1).unwrap());

        bank.tick();
        assert!(!bank.changed_since_last_tick(Switch::Button2).unwrap());

        bank.release(Switch::Button2).unwrap();
        assert!(bank.changed_since_last_tick(Switch::Button2).unwrap());
    }

    #[test]
    fn test_invalid_switch() {
        let mut bank = ButtonBank::new();
        assert!(matches!(
            bank.press("turbo"),
            Err(MameleError::InvalidSwitch(_))
        ));
        assert!(matches!(
            bank.current_state("LEFT"),
            Err(MameleError::InvalidSwitch(_))
        ));
    }

    #[test]
    fn test_apply() {
        let mut bank = ButtonBank::new();
        bank.press(Switch::Down).unwrap();
        bank.apply(&SwitchStates::parse("100000000000").unwrap());
        assert!(bank.current_state(Switch::Left).unwrap());
        assert!(!bank.current_state(Switch::Down).unwrap());
    }
}

// Operata
// Copyright (C) 2021  Wesley Merkel
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! MIDI continuous controllers.

use crate::{
    operand::{assign_common, combine_field, int_op, Op, Operand, Operate},
    unit::{integer_source, project_integer, Value},
};
use serde::{Deserialize, Serialize};

/// Well-known controllers: number, resting value and names.
const CONTROLLERS: &[(i64, i64, &[&str])] = &[
    (0, 0, &["Bank Select"]),
    (1, 0, &["Modulation", "Modulation Wheel"]),
    (2, 0, &["Breath", "Breath Controller"]),
    (4, 0, &["Foot", "Foot Controller"]),
    (5, 0, &["Portamento Time"]),
    (7, 100, &["Volume", "Channel Volume"]),
    (8, 64, &["Balance"]),
    (10, 64, &["Pan"]),
    (11, 127, &["Expression"]),
    (64, 0, &["Sustain", "Damper Pedal"]),
    (65, 0, &["Portamento"]),
    (66, 0, &["Sostenuto"]),
    (67, 0, &["Soft Pedal"]),
    (71, 64, &["Resonance"]),
    (72, 64, &["Release Time"]),
    (73, 64, &["Attack Time"]),
    (74, 64, &["Brightness", "Cutoff"]),
    (91, 0, &["Reverb"]),
    (93, 0, &["Chorus"]),
    (120, 0, &["All Sounds Off"]),
    (121, 0, &["Reset All Controllers"]),
    (123, 0, &["All Notes Off"]),
];

/// A controller number, which can also be given by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Number(pub i64);

impl Number {
    pub fn from_name(name: &str) -> Option<Number> {
        let name = name.trim();
        CONTROLLERS
            .iter()
            .find(|(_, _, names)| names.iter().any(|known| known.eq_ignore_ascii_case(name)))
            .map(|(number, _, _)| Number(*number))
    }

    pub fn name(self) -> Option<&'static str> {
        CONTROLLERS
            .iter()
            .find(|(number, _, _)| *number == self.0)
            .map(|(_, _, names)| names[0])
    }

    /// The value this controller rests at.
    pub fn default_value(self) -> Value {
        CONTROLLERS
            .iter()
            .find(|(number, _, _)| *number == self.0)
            .map_or(Value(0), |(_, value, _)| Value(*value))
    }
}

impl Default for Number {
    fn default() -> Self {
        Number(10)
    }
}

impl Operate for Number {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Number(_) => Operand::Number(*self),
            Operand::Str(_) => match self.name() {
                Some(name) => Operand::Str(name.to_owned()),
                None => Operand::Str(self.0.to_string()),
            },
            _ => project_integer(self.0, selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::Number(number) => *self = *number,
            Operand::Null => *self = Number::default(),
            Operand::Str(name) => match Number::from_name(name) {
                Some(number) => *self = number,
                None => log::debug!("ignoring unknown controller {:?}", name),
            },
            _ => {
                if let Some(number) = integer_source(source) {
                    self.0 = number;
                }
            }
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        let rhs = match operand {
            Operand::Number(number) => Some(number.0),
            _ => integer_source(operand),
        };
        let number = rhs
            .and_then(|rhs| int_op(self.0, op, rhs))
            .unwrap_or(self.0);
        Operand::Number(Number(number))
    }

    fn scalar(&self) -> Option<f64> {
        Some(self.0 as f64)
    }
}

/// A controller number paired with the value to send to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Controller {
    pub number: Number,
    pub value: Value,
}

impl Controller {
    pub fn new(number: Number, value: Value) -> Controller {
        Controller { number, value }
    }

    /// A named controller at its resting value.
    pub fn named(name: &str) -> Option<Controller> {
        let number = Number::from_name(name)?;
        Some(Controller::new(number, number.default_value()))
    }
}

impl Default for Controller {
    fn default() -> Self {
        let number = Number::default();
        Controller::new(number, number.default_value())
    }
}

impl Operate for Controller {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Controller(_) => Operand::Controller(*self),
            Operand::Number(_) => Operand::Number(self.number),
            Operand::Value(_) => Operand::Value(self.value),
            Operand::Str(_) => self.number.extract(selector),
            _ => self.value.extract(selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::Controller(controller) => *self = *controller,
            Operand::Null => *self = Controller::default(),
            Operand::Number(_) | Operand::Str(_) => self.number.assign(source),
            _ => self.value.assign(source),
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        match operand {
            Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => {
                combine_field(self, op, &Operand::Value(Value(operand.as_i64().unwrap_or(0))))
            }
            _ => combine_field(self, op, operand),
        }
    }
}

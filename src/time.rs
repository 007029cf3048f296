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

//! Musical time.
//!
//! Time is measured exactly, as a [`Rational64`] number of whole notes. The [`Meter`] carried by
//! [`Position`] and [`Duration`] relates whole notes to measures, beats and quantization steps, so
//! the same instant can be read or written in any of those units:
//!
//! ```
//! use num_rational::Rational64;
//! use operata::operand::Operand;
//! use operata::time::{Beat, Position};
//!
//! // Two measures and one beat into a piece in 4/4.
//! let position = Position::default() << Beat(Rational64::from_integer(9));
//! assert_eq!(Rational64::new(9, 4), position.whole_notes());
//! assert_eq!(Operand::Int(2), &position % 0);
//! ```

use crate::operand::{assign_common, ratio_of, ratio_op, ratio_to_f64, Op, Operand, Operate};
use num_rational::Rational64;
use serde::{Deserialize, Serialize};

/// How many beats of which note value make up a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub top: u32,
    pub bottom: u32,
}

impl TimeSignature {
    /// Creates a time signature, replacing zero parts with one.
    pub fn new(top: u32, bottom: u32) -> TimeSignature {
        if top == 0 || bottom == 0 {
            log::warn!("time signature {}/{} has a zero part, using 1", top, bottom);
        }
        TimeSignature {
            top: top.max(1),
            bottom: bottom.max(1),
        }
    }

    /// The length of one beat in whole notes.
    pub fn beat_note_value(&self) -> Rational64 {
        Rational64::new(1, i64::from(self.bottom))
    }

    /// The length of one measure in whole notes.
    pub fn measure_length(&self) -> Rational64 {
        Rational64::new(i64::from(self.top), i64::from(self.bottom))
    }

    fn parse(text: &str) -> Option<TimeSignature> {
        let mut parts = text.split('/');
        let top = parts.next()?.trim().parse().ok()?;
        let bottom = parts.next()?.trim().parse().ok()?;
        Some(TimeSignature::new(top, bottom))
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature { top: 4, bottom: 4 }
    }
}

impl Operate for TimeSignature {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::TimeSignature(_) => Operand::TimeSignature(*self),
            Operand::Str(_) => Operand::Str(format!("{}/{}", self.top, self.bottom)),
            Operand::Fraction(_) => Operand::Fraction(self.measure_length()),
            Operand::Beat(_) => Operand::Beat(Beat(i64::from(self.top).into())),
            Operand::NoteValue(_) => Operand::NoteValue(NoteValue(self.beat_note_value())),
            _ => selector.clone(),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::TimeSignature(signature) => *self = *signature,
            Operand::Null => *self = TimeSignature::default(),
            Operand::Str(text) => match TimeSignature::parse(text) {
                Some(signature) => *self = signature,
                None => log::debug!("ignoring malformed time signature {:?}", text),
            },
            _ => {}
        }
    }

    fn combine(&self, _: Op, _: &Operand) -> Operand {
        Operand::TimeSignature(*self)
    }
}

/// The grid that relates whole notes to measures, beats and steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meter {
    pub time_signature: TimeSignature,
    /// The length of one step in whole notes.
    pub quantization: Rational64,
}

impl Meter {
    pub fn new(time_signature: TimeSignature, quantization: Rational64) -> Meter {
        let quantization = if quantization > Rational64::from_integer(0) {
            quantization
        } else {
            log::warn!("quantization {} is not positive, using 1/16", quantization);
            Rational64::new(1, 16)
        };
        Meter {
            time_signature,
            quantization,
        }
    }

    pub fn measure_length(&self) -> Rational64 {
        self.time_signature.measure_length()
    }

    pub fn beat_length(&self) -> Rational64 {
        self.time_signature.beat_note_value()
    }

    /// Converts a time-like operand to whole notes.
    ///
    /// Plain numbers count measures when `numbers_are_measures` is set and whole notes otherwise.
    fn whole_notes(&self, operand: &Operand, numbers_are_measures: bool) -> Option<Rational64> {
        match operand {
            Operand::Position(position) => Some(position.value),
            Operand::Duration(duration) => Some(duration.value),
            Operand::Measure(Measure(measures)) => Some(measures * self.measure_length()),
            Operand::Beat(Beat(beats)) => Some(beats * self.beat_length()),
            Operand::Step(Step(steps)) => Some(steps * self.quantization),
            Operand::NoteValue(NoteValue(value)) => Some(*value),
            _ if numbers_are_measures => {
                ratio_of(operand).map(|value| value * self.measure_length())
            }
            _ => ratio_of(operand),
        }
    }

    fn project(
        &self,
        value: Rational64,
        selector: &Operand,
        numbers_are_measures: bool,
    ) -> Operand {
        let number = if numbers_are_measures {
            value / self.measure_length()
        } else {
            value
        };
        match selector {
            Operand::Measure(_) => Operand::Measure(Measure(value / self.measure_length())),
            Operand::Beat(_) => Operand::Beat(Beat(value / self.beat_length())),
            Operand::Step(_) => Operand::Step(Step(value / self.quantization)),
            Operand::NoteValue(_) => Operand::NoteValue(NoteValue(value)),
            Operand::TimeSignature(_) => Operand::TimeSignature(self.time_signature),
            Operand::Int(_) => Operand::Int(number.floor().to_integer()),
            Operand::Float(_) => Operand::Float(ratio_to_f64(&number)),
            Operand::Fraction(_) => Operand::Fraction(number),
            Operand::Str(_) => Operand::Str(number.to_string()),
            _ => selector.clone(),
        }
    }

    fn combine(
        &self,
        value: Rational64,
        op: Op,
        operand: &Operand,
        numbers_are_measures: bool,
    ) -> Rational64 {
        let rhs = match op {
            Op::Add | Op::Sub => self.whole_notes(operand, numbers_are_measures),
            Op::Mul | Op::Div => ratio_of(operand),
        };
        rhs.and_then(|rhs| ratio_op(value, op, rhs)).unwrap_or(value)
    }
}

impl Default for Meter {
    fn default() -> Self {
        Meter {
            time_signature: TimeSignature::default(),
            quantization: Rational64::new(1, 16),
        }
    }
}

/// An instant, measured in whole notes from the start of the piece.
///
/// Plain numbers assigned to a position count measures, except for fractions which count whole
/// notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub value: Rational64,
    pub meter: Meter,
}

impl Position {
    pub fn new(value: Rational64, meter: Meter) -> Position {
        Position { value, meter }
    }

    /// The start of a piece with the given meter.
    pub fn start(meter: Meter) -> Position {
        Position::new(Rational64::from_integer(0), meter)
    }

    pub fn whole_notes(&self) -> Rational64 {
        self.value
    }

    pub fn measures(&self) -> Rational64 {
        self.value / self.meter.measure_length()
    }

    pub fn beats(&self) -> Rational64 {
        self.value / self.meter.beat_length()
    }

    pub fn steps(&self) -> Rational64 {
        self.value / self.meter.quantization
    }

    /// This position moved by `whole_notes`.
    pub fn offset(&self, whole_notes: Rational64) -> Position {
        Position::new(self.value + whole_notes, self.meter)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start(Meter::default())
    }
}

impl Operate for Position {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Position(_) => Operand::Position(*self),
            Operand::Duration(_) => Operand::Duration(Duration::new(self.value, self.meter)),
            _ => {
                let numbers_are_measures = !matches!(selector, Operand::Fraction(_));
                self.meter.project(self.value, selector, numbers_are_measures)
            }
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::Position(position) => *self = *position,
            Operand::Null => self.value = Rational64::from_integer(0),
            Operand::TimeSignature(signature) => self.meter.time_signature = *signature,
            _ => {
                let numbers_are_measures = !matches!(source, Operand::Fraction(_));
                if let Some(value) = self.meter.whole_notes(source, numbers_are_measures) {
                    self.value = value;
                }
            }
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        let numbers_are_measures = !matches!(operand, Operand::Fraction(_));
        let value = self.meter.combine(self.value, op, operand, numbers_are_measures);
        Operand::Position(Position::new(value, self.meter))
    }

    fn scalar(&self) -> Option<f64> {
        Some(ratio_to_f64(&self.measures()))
    }
}

/// A length of time in whole notes, such as the note value of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duration {
    pub value: Rational64,
    pub meter: Meter,
}

impl Duration {
    pub fn new(value: Rational64, meter: Meter) -> Duration {
        Duration { value, meter }
    }

    pub fn whole_notes(&self) -> Rational64 {
        self.value
    }

    pub fn beats(&self) -> Rational64 {
        self.value / self.meter.beat_length()
    }
}

impl Default for Duration {
    fn default() -> Self {
        Duration::new(Rational64::new(1, 4), Meter::default())
    }
}

impl Operate for Duration {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Duration(_) => Operand::Duration(*self),
            Operand::Position(_) => Operand::Position(Position::new(self.value, self.meter)),
            _ => self.meter.project(self.value, selector, false),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::Duration(duration) => *self = *duration,
            Operand::Null => self.value = Rational64::new(1, 4),
            Operand::TimeSignature(signature) => self.meter.time_signature = *signature,
            _ => match self.meter.whole_notes(source, false) {
                Some(value) if value >= Rational64::from_integer(0) => self.value = value,
                Some(value) => log::warn!("ignoring negative duration {}", value),
                None => {}
            },
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        let value = self.meter.combine(self.value, op, operand, false);
        let value = value.max(Rational64::from_integer(0));
        Operand::Duration(Duration::new(value, self.meter))
    }

    fn scalar(&self) -> Option<f64> {
        Some(ratio_to_f64(&self.value))
    }
}

macro_rules! time_unit {
    ($(#[$meta:meta])* $name:ident = $default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Rational64);

        impl Default for $name {
            fn default() -> Self {
                $name($default)
            }
        }

        impl Operate for $name {
            fn extract(&self, selector: &Operand) -> Operand {
                match selector {
                    Operand::$name(_) => Operand::$name(*self),
                    Operand::Int(_) => Operand::Int(self.0.floor().to_integer()),
                    Operand::Float(_) => Operand::Float(ratio_to_f64(&self.0)),
                    Operand::Fraction(_) => Operand::Fraction(self.0),
                    Operand::Str(_) => Operand::Str(self.0.to_string()),
                    _ => selector.clone(),
                }
            }

            fn assign(&mut self, source: &Operand) {
                if assign_common(self, source) {
                    return;
                }
                match source {
                    Operand::$name(unit) => *self = *unit,
                    Operand::Null => *self = Self::default(),
                    _ => {
                        if let Some(value) = ratio_of(source) {
                            self.0 = value;
                        }
                    }
                }
            }

            fn combine(&self, op: Op, operand: &Operand) -> Operand {
                let rhs = match operand {
                    Operand::$name(unit) => Some(unit.0),
                    _ => ratio_of(operand),
                };
                let value = rhs.and_then(|rhs| ratio_op(self.0, op, rhs)).unwrap_or(self.0);
                Operand::$name($name(value))
            }

            fn scalar(&self) -> Option<f64> {
                Some(ratio_to_f64(&self.0))
            }
        }
    };
}

time_unit! {
    /// A count of measures.
    Measure = Rational64::from_integer(0)
}

time_unit! {
    /// A count of beats.
    Beat = Rational64::from_integer(0)
}

time_unit! {
    /// A count of quantization steps.
    Step = Rational64::from_integer(0)
}

time_unit! {
    /// A note value in whole notes, such as `1/4` for a quarter note.
    NoteValue = Rational64::new(1, 4)
}

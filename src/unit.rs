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

//! Scalar units.
//!
//! Units are the smallest operands: a single number tagged with what it means. Most of them are
//! plain integers and behave alike. They accept numbers and their own type when assigned,
//! project to numbers and strings when extracted, and do arithmetic with numbers and their own
//! type when combined. The more musical ones, [`Key`], [`Tonic`] and [`Degree`], also understand
//! names such as `"F#"` or `"V"`.

use crate::operand::{assign_common, float_op, int_op, Op, Operand, Operate};
use serde::{Deserialize, Serialize};

macro_rules! integer_unit {
    ($(#[$meta:meta])* $name:ident = $default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl Default for $name {
            fn default() -> Self {
                $name($default)
            }
        }

        impl Operate for $name {
            fn extract(&self, selector: &Operand) -> Operand {
                match selector {
                    Operand::$name(_) => Operand::$name(*self),
                    _ => project_integer(self.0, selector),
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
                        if let Some(value) = integer_source(source) {
                            self.0 = value;
                        }
                    }
                }
            }

            fn combine(&self, op: Op, operand: &Operand) -> Operand {
                let rhs = match operand {
                    Operand::$name(unit) => Some(unit.0),
                    _ => integer_source(operand),
                };
                let value = rhs.and_then(|rhs| int_op(self.0, op, rhs)).unwrap_or(self.0);
                Operand::$name($name(value))
            }

            fn scalar(&self) -> Option<f64> {
                Some(self.0 as f64)
            }
        }
    };
}

integer_unit! {
    /// The display octave of a pitch, where middle C sits in octave 4.
    Octave = 4
}

integer_unit! {
    /// Steps along the scale of a pitch, applied after its degree.
    Transposition = 0
}

integer_unit! {
    /// A distance in chromatic semitones.
    Semitone = 0
}

integer_unit! {
    /// Number of sharps to apply to a pitch.
    Sharp = 1
}

integer_unit! {
    /// Number of flats to apply to a pitch.
    Flat = 1
}

integer_unit! {
    /// Removes any accidental from a pitch.
    Natural = 0
}

integer_unit! {
    /// A 1-based mode of a scale, where 1 leaves the scale as is.
    Mode = 1
}

integer_unit! {
    /// MIDI note velocity.
    Velocity = 100
}

integer_unit! {
    /// A 1-based MIDI channel.
    Channel = 1
}

integer_unit! {
    /// A 1-based MIDI program number.
    Program = 1
}

integer_unit! {
    /// Aftertouch pressure.
    Pressure = 0
}

integer_unit! {
    /// The value sent by a controller.
    Value = 0
}

integer_unit! {
    /// Pitch bend amount, centered on zero.
    Bend = 0
}

integer_unit! {
    /// The number of notes in a chord.
    Size = 3
}

integer_unit! {
    /// How many of a chord's lowest notes are moved up an octave.
    Inversion = 0
}

integer_unit! {
    /// The number of notes a retrigger splits its duration into.
    Division = 16
}

pub(crate) fn project_integer(value: i64, selector: &Operand) -> Operand {
    match selector {
        Operand::Int(_) => Operand::Int(value),
        Operand::Float(_) => Operand::Float(value as f64),
        Operand::Fraction(_) => Operand::Fraction(value.into()),
        Operand::Str(_) => Operand::Str(value.to_string()),
        _ => selector.clone(),
    }
}

/// Plain numbers only, so that units of different kinds never leak into each other.
pub(crate) fn integer_source(source: &Operand) -> Option<i64> {
    match source {
        Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => source.as_i64(),
        _ => None,
    }
}

const KEY_NAMES: [&str; 24] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B", //
    "B#", "Db", "D", "Eb", "Fb", "E#", "Gb", "G", "Ab", "A", "Bb", "Cb",
];

/// A spelled chromatic key.
///
/// Keys 0 to 11 are the natural and sharp spellings of the twelve pitch classes. Keys 12 to 23
/// spell the same pitch classes again, using flats, `B#`, `E#`, `Fb` and `Cb` where they exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(pub u8);

impl Key {
    /// Looks up a key by its name, ignoring case.
    pub fn from_name(name: &str) -> Option<Key> {
        let name = name.trim();
        KEY_NAMES
            .iter()
            .position(|key| key.eq_ignore_ascii_case(name))
            .map(|index| Key(index as u8))
    }

    /// The key with the sharp spelling of `pitch_class`.
    pub fn from_pitch_class(pitch_class: i64) -> Key {
        Key(pitch_class.rem_euclid(12) as u8)
    }

    /// The pitch class, from 0 for C to 11 for B.
    pub fn pitch_class(self) -> u8 {
        self.0 % 12
    }

    /// The key spelled on the alternate line.
    pub fn alternate(self) -> Key {
        Key((self.0 % 24 + 12) % 24)
    }

    pub fn name(self) -> &'static str {
        KEY_NAMES[usize::from(self.0 % 24)]
    }

    fn assign_number(&mut self, source: &Operand) -> bool {
        match integer_source(source) {
            Some(value) => {
                *self = Key::from_pitch_class(value);
                true
            }
            None => false,
        }
    }
}

impl Default for Key {
    fn default() -> Self {
        Key(0)
    }
}

impl Operate for Key {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Key(_) => Operand::Key(*self),
            Operand::Str(_) => Operand::Str(self.name().to_owned()),
            _ => project_integer(self.pitch_class().into(), selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::Key(key) => *self = *key,
            Operand::Null => *self = Key::default(),
            Operand::Str(name) => match Key::from_name(name) {
                Some(key) => *self = key,
                None => log::debug!("ignoring unknown key name {:?}", name),
            },
            _ => {
                self.assign_number(source);
            }
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        let semitones = match operand {
            Operand::Semitone(Semitone(value)) => Some(*value),
            _ => integer_source(operand),
        };
        match (op, semitones) {
            (Op::Add, Some(value)) => {
                Key::from_pitch_class(i64::from(self.pitch_class()) + value).into()
            }
            (Op::Sub, Some(value)) => {
                Key::from_pitch_class(i64::from(self.pitch_class()) - value).into()
            }
            _ => Operand::Key(*self),
        }
    }

    fn scalar(&self) -> Option<f64> {
        Some(f64::from(self.pitch_class()))
    }
}

/// The key a pitch counts its degrees from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tonic(pub Key);

impl Operate for Tonic {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Tonic(_) => Operand::Tonic(*self),
            _ => self.0.extract(selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        match source {
            Operand::Tonic(tonic) => *self = *tonic,
            _ => self.0.assign(source),
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        match self.0.combine(op, operand) {
            Operand::Key(key) => Operand::Tonic(Tonic(key)),
            _ => Operand::Tonic(*self),
        }
    }

    fn scalar(&self) -> Option<f64> {
        self.0.scalar()
    }
}

const DEGREE_NAMES: [(&str, &str); 7] = [
    ("I", "tonic"),
    ("II", "supertonic"),
    ("III", "mediant"),
    ("IV", "subdominant"),
    ("V", "dominant"),
    ("VI", "submediant"),
    ("VII", "leading tone"),
];

/// A 1-based scale degree, where 1 is the tonic.
///
/// The fractional part carries accidentals: `.1` is sharp, `.2` flat, `.3` double sharp and `.4`
/// double flat, so `Degree(4.1)` is a raised fourth. Zero is read as the tonic and negative
/// degrees count down from it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Degree(pub f64);

impl Degree {
    /// The number of scale steps above the tonic, keeping the accidental fraction.
    pub fn steps(self) -> f64 {
        if self.0 >= 1.0 {
            self.0 - 1.0
        } else {
            self.0
        }
    }

    /// The degree that sits `steps` scale steps above the tonic.
    pub fn from_steps(steps: f64) -> Degree {
        if steps >= 0.0 {
            Degree(steps + 1.0)
        } else {
            Degree(steps)
        }
    }

    /// Parses a roman numeral or a functional name such as `"dominant"`.
    pub fn from_name(name: &str) -> Option<Degree> {
        let name = name.trim();
        DEGREE_NAMES
            .iter()
            .position(|(roman, function)| {
                roman.eq_ignore_ascii_case(name) || function.eq_ignore_ascii_case(name)
            })
            .map(|index| Degree(index as f64 + 1.0))
    }

    pub fn name(self) -> &'static str {
        let step = self.steps().trunc() as i64;
        DEGREE_NAMES[step.rem_euclid(7) as usize].0
    }
}

impl Default for Degree {
    fn default() -> Self {
        Degree(1.0)
    }
}

impl Operate for Degree {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Degree(_) => Operand::Degree(*self),
            Operand::Int(_) => Operand::Int(self.0.trunc() as i64),
            Operand::Float(_) => Operand::Float(self.0),
            Operand::Str(_) => Operand::Str(self.name().to_owned()),
            _ => selector.clone(),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::Degree(degree) => *self = *degree,
            Operand::Null => *self = Degree::default(),
            Operand::Str(name) => match Degree::from_name(name) {
                Some(degree) => *self = degree,
                None => log::debug!("ignoring unknown degree name {:?}", name),
            },
            Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => {
                if let Some(value) = source.as_f64() {
                    self.0 = value;
                }
            }
            _ => {}
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        let rhs = match operand {
            Operand::Degree(degree) => Some(degree.0),
            Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => operand.as_f64(),
            _ => None,
        };
        let value = rhs.and_then(|rhs| float_op(self.0, op, rhs)).unwrap_or(self.0);
        Operand::Degree(Degree(value))
    }

    fn scalar(&self) -> Option<f64> {
        Some(self.0)
    }
}

macro_rules! float_unit {
    ($(#[$meta:meta])* $name:ident = $default:expr, $min:expr, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub f64);

        impl Default for $name {
            fn default() -> Self {
                $name($default)
            }
        }

        impl Operate for $name {
            fn extract(&self, selector: &Operand) -> Operand {
                match selector {
                    Operand::$name(_) => Operand::$name(*self),
                    Operand::Float(_) => Operand::Float(self.0),
                    Operand::Str(_) => Operand::Str(self.0.to_string()),
                    _ => selector.clone(),
                }
            }

            fn assign(&mut self, source: &Operand) {
                if assign_common(self, source) {
                    return;
                }
                match source {
                    Operand::$name(unit) => self.0 = unit.0.max($min).min($max),
                    Operand::Null => *self = Self::default(),
                    Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => {
                        if let Some(value) = source.as_f64() {
                            self.0 = value.max($min).min($max);
                        }
                    }
                    _ => {}
                }
            }

            fn combine(&self, op: Op, operand: &Operand) -> Operand {
                let rhs = match operand {
                    Operand::$name(unit) => Some(unit.0),
                    Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => operand.as_f64(),
                    _ => None,
                };
                let value = rhs.and_then(|rhs| float_op(self.0, op, rhs)).unwrap_or(self.0);
                Operand::$name($name(value.max($min).min($max)))
            }

            fn scalar(&self) -> Option<f64> {
                Some(self.0)
            }
        }
    };
}

float_unit! {
    /// The fraction of a note's duration that actually sounds.
    Gate = 1.0, 0.0, f64::INFINITY
}

float_unit! {
    /// How the time of each pair of repeated notes is split between them.
    ///
    /// At 0.5 both get the same time, above it the first of the pair is longer.
    Swing = 0.5, 0.0, 1.0
}

/// The names of the MIDI output devices an element prefers, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device(pub Vec<String>);

impl Default for Device {
    fn default() -> Self {
        Device(vec!["Microsoft".to_owned(), "FluidSynth".to_owned()])
    }
}

impl Operate for Device {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Device(_) => Operand::Device(self.clone()),
            Operand::Str(_) => Operand::Str(self.0.first().cloned().unwrap_or_default()),
            Operand::Tuple(_) => {
                Operand::Tuple(self.0.iter().cloned().map(Operand::Str).collect())
            }
            _ => selector.clone(),
        }
    }

    fn assign(&mut self, source: &Operand) {
        match source {
            Operand::Device(device) => *self = device.clone(),
            Operand::Null => *self = Device::default(),
            Operand::Str(name) => self.0 = vec![name.clone()],
            Operand::Tuple(items) => {
                self.0 = items
                    .iter()
                    .filter_map(|item| match item {
                        Operand::Str(name) => Some(name.clone()),
                        _ => None,
                    })
                    .collect()
            }
            _ => {}
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        let mut device = self.clone();
        match (op, operand) {
            (Op::Add, Operand::Str(name)) => device.0.push(name.clone()),
            (Op::Sub, Operand::Str(name)) => device.0.retain(|other| other != name),
            _ => {}
        }
        Operand::Device(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integer_units_do_arithmetic() {
        assert_eq!(Operand::Velocity(Velocity(110)), &Velocity(100) + 10);
        assert_eq!(Operand::Velocity(Velocity(50)), &Velocity(100) / Velocity(2));
        assert_eq!(Operand::Velocity(Velocity(100)), &Velocity(100) / 0);
        assert_eq!(Operand::Velocity(Velocity(100)), &Velocity(100) + Channel(3));
    }

    #[test]
    fn units_do_not_leak_into_each_other() {
        let velocity = Velocity(64) << Channel(2);
        assert_eq!(Velocity(64), velocity);
        assert_eq!(Velocity(100), velocity << Operand::Null);
    }

    #[test]
    fn swing_stays_between_zero_and_one() {
        assert_eq!(Swing(1.0), Swing::default() << 3);
        assert_eq!(Operand::Swing(Swing(0.0)), &Swing(0.25) - 0.5);
        assert_eq!(Gate(2.5), Gate::default() << 2.5);
    }

    #[test]
    fn key_names() {
        assert_eq!(Some(Key(13)), Key::from_name("db"));
        assert_eq!(Some(Key(2)), Key::from_name("D"));
        assert_eq!(None, Key::from_name("H"));
        assert_eq!("Bb", Key(10).alternate().name());
        assert_eq!(Operand::Int(1), &Key(13) % 0);
        assert_eq!(Operand::Key(Key(2)), &Key(11) + 3);
    }

    #[test]
    fn key_assign_from_name() {
        assert_eq!(Key(16), Key::default() << "Fb");
        assert_eq!(Key(16), Key(16) << "nonsense");
    }

    #[test]
    fn degree_names_and_steps() {
        assert_eq!(Some(Degree(5.0)), Degree::from_name("dominant"));
        assert_eq!(Some(Degree(3.0)), Degree::from_name("iii"));
        assert_eq!("IV", Degree(4.1).name());
        assert_eq!(2.0, Degree(3.0).steps());
        assert_eq!(0.0, Degree(0.0).steps());
        assert_eq!(-2.0, Degree(-2.0).steps());
        assert_eq!(Degree(1.0), Degree::from_steps(0.0));
    }

    #[test]
    fn device_list() {
        let device = Device::default() << "Loop";
        assert_eq!(Device(vec!["Loop".to_owned()]), device);
        assert_eq!(
            Operand::Device(Device(vec!["Loop".to_owned(), "Synth".to_owned()])),
            &device + "Synth"
        );
    }
}

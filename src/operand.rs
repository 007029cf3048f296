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

//! The operand protocol.
//!
//! Every value in this crate, from a single [`Velocity`] to a whole [`Clip`], is an operand and
//! can be carried around as the closed [`Operand`] enum. Operands talk to each other through the
//! three methods of the [`Operate`] trait, and which field an operation touches is decided by the
//! *type* of the argument rather than by a method name:
//!
//! * `extract` (`%`) projects a field: `note % Degree::default()` yields the note's degree.
//! * `assign` (`<<`) writes a field: `note << Velocity(90)` sets the velocity.
//! * `combine` (`+ - * /`) derives a new operand: `note + Octave(1)` is the same note an octave up.
//!
//! Two more operators are built on top: `>>` pipes one operand into another (placing an element
//! at a position or laying clips end to end) and `^` chains [`Frame`]s together.
//!
//! The protocol is total. Extracting with a selector the receiver does not understand returns the
//! selector untouched, and assigning from an unsupported source is a no-op, so arbitrary operands
//! can be thrown at each other without failing.
//!
//! # Examples
//!
//! ```
//! use operata::operand::Operand;
//! use operata::pitch::Pitch;
//! use operata::unit::Degree;
//!
//! let pitch = Pitch::default() << Degree(3.0);
//! assert_eq!(Operand::Int(64), &pitch % 0);
//!
//! let higher = &pitch + 2;
//! assert_eq!(Operand::Int(66), &higher % 0);
//! ```

use crate::{
    chaos::{Bouncer, Chaos, Flipper, Modulus, SinX},
    clip::Clip,
    controller::{Controller, Number},
    element::{
        Aftertouch, Chord, Clock, ControlChange, Element, KeyScale, Note, Panic, PitchBend,
        PolyAftertouch, ProgramChange, Rest, Retrigger, Track, Tuplet,
    },
    frame::{Frame, Resolution},
    pitch::Pitch,
    scale::{KeySignature, Scale},
    settings::{Settings, Tempo},
    time::{Beat, Duration, Measure, NoteValue, Position, Step, TimeSignature},
    unit::{
        Bend, Channel, Degree, Device, Division, Flat, Gate, Inversion, Key, Mode, Natural,
        Octave, Pressure, Program, Semitone, Sharp, Size, Swing, Tonic, Transposition, Value,
        Velocity,
    },
};
use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, mem};

/// The arithmetic operations understood by [`Operate::combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

/// The type-dispatched operations shared by all operands.
pub trait Operate {
    /// Returns the field identified by the type of `selector`.
    ///
    /// A selector of the receiver's own type returns a full copy. A selector the receiver does not
    /// understand is returned as is.
    fn extract(&self, selector: &Operand) -> Operand;

    /// Writes the field identified by the type of `source`.
    ///
    /// Unsupported sources leave the receiver untouched.
    fn assign(&mut self, source: &Operand);

    /// Returns a new operand derived from this one and `operand`.
    fn combine(&self, op: Op, operand: &Operand) -> Operand;

    /// The plain number this operand stands for, if it has one.
    ///
    /// Used when comparing operands and when mixing typed values into primitive arithmetic.
    fn scalar(&self) -> Option<f64> {
        None
    }
}

macro_rules! operands {
    ($($variant:ident($ty:ty),)*) => {
        /// A closed sum of every operand type.
        ///
        /// Serializes as a record of the form `{"class": ..., "parameters": ...}` where `class`
        /// is the variant name.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "class", content = "parameters")]
        pub enum Operand {
            Null,
            Int(i64),
            Float(f64),
            Str(String),
            Fraction(Rational64),
            Tuple(Vec<Operand>),
            Frame(Box<Frame>),
            $($variant($ty),)*
        }

        impl Operand {
            /// Every class name an operand record can carry.
            pub const CLASSES: &'static [&'static str] = &[
                "Null",
                "Int",
                "Float",
                "Str",
                "Fraction",
                "Tuple",
                "Frame",
                $(stringify!($variant),)*
            ];

            /// The name of this operand's class, as written in its serialized record.
            pub fn class(&self) -> &'static str {
                match self {
                    Operand::Null => "Null",
                    Operand::Int(_) => "Int",
                    Operand::Float(_) => "Float",
                    Operand::Str(_) => "Str",
                    Operand::Fraction(_) => "Fraction",
                    Operand::Tuple(_) => "Tuple",
                    Operand::Frame(_) => "Frame",
                    $(Operand::$variant(_) => stringify!($variant),)*
                }
            }

            fn as_operate(&self) -> Option<&dyn Operate> {
                match self {
                    Operand::Frame(frame) => Some(frame.as_ref() as &dyn Operate),
                    $(Operand::$variant(inner) => Some(inner as &dyn Operate),)*
                    _ => None,
                }
            }

            fn as_operate_mut(&mut self) -> Option<&mut dyn Operate> {
                match self {
                    Operand::Frame(frame) => Some(frame.as_mut() as &mut dyn Operate),
                    $(Operand::$variant(inner) => Some(inner as &mut dyn Operate),)*
                    _ => None,
                }
            }
        }

        $(
            impl From<$ty> for Operand {
                fn from(inner: $ty) -> Operand {
                    Operand::$variant(inner)
                }
            }

            impl TryFrom<Operand> for $ty {
                type Error = Operand;

                fn try_from(operand: Operand) -> Result<$ty, Operand> {
                    match operand {
                        Operand::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

operands! {
    Key(Key),
    Tonic(Tonic),
    Octave(Octave),
    Degree(Degree),
    Transposition(Transposition),
    Semitone(Semitone),
    Sharp(Sharp),
    Flat(Flat),
    Natural(Natural),
    Mode(Mode),
    Velocity(Velocity),
    Gate(Gate),
    Swing(Swing),
    Division(Division),
    Channel(Channel),
    Program(Program),
    Pressure(Pressure),
    Number(Number),
    Value(Value),
    Bend(Bend),
    Size(Size),
    Inversion(Inversion),
    Device(Device),
    Track(Track),
    Tempo(Tempo),
    Position(Position),
    Duration(Duration),
    Measure(Measure),
    Beat(Beat),
    Step(Step),
    NoteValue(NoteValue),
    TimeSignature(TimeSignature),
    KeySignature(KeySignature),
    Scale(Scale),
    Pitch(Pitch),
    Controller(Controller),
    Note(Note),
    Chord(Chord),
    KeyScale(KeyScale),
    Rest(Rest),
    Retrigger(Retrigger),
    Tuplet(Tuplet),
    ControlChange(ControlChange),
    PitchBend(PitchBend),
    Aftertouch(Aftertouch),
    PolyAftertouch(PolyAftertouch),
    ProgramChange(ProgramChange),
    Clock(Clock),
    Panic(Panic),
    Clip(Clip),
    Modulus(Modulus),
    Flipper(Flipper),
    Bouncer(Bouncer),
    SinX(SinX),
    Settings(Settings),
}

impl Default for Operand {
    fn default() -> Self {
        Operand::Null
    }
}

impl Operand {
    /// Returns `true` if both operands are of the same class.
    pub fn same_class(&self, other: &Operand) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Returns the operand as a chaotic generator, if it is one.
    pub fn as_chaos_mut(&mut self) -> Option<&mut dyn Chaos> {
        match self {
            Operand::Modulus(chaos) => Some(chaos as &mut dyn Chaos),
            Operand::Flipper(chaos) => Some(chaos as &mut dyn Chaos),
            Operand::Bouncer(chaos) => Some(chaos as &mut dyn Chaos),
            Operand::SinX(chaos) => Some(chaos as &mut dyn Chaos),
            _ => None,
        }
    }

    /// Returns the operand as an integer, truncating fractional values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Operand::Int(value) => Some(*value),
            other => other.as_f64().map(|value| value.trunc() as i64),
        }
    }

    /// Returns the operand as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Int(value) => Some(*value as f64),
            Operand::Float(value) => Some(*value),
            Operand::Fraction(value) => Some(ratio_to_f64(value)),
            other => other.as_operate().and_then(|inner| inner.scalar()),
        }
    }

    /// Orders two operands by their scalar value.
    ///
    /// Returns `None` when either side has no scalar value.
    pub fn compare(&self, other: &Operand) -> Option<std::cmp::Ordering> {
        self.as_f64()?.partial_cmp(&other.as_f64()?)
    }

    /// Feeds this operand into `target`, returning the result.
    ///
    /// * A [`Position`] moves an element, or every element of a clip, so that it starts there.
    /// * An element or clip piped into another element or clip produces a clip with the
    ///   right-hand side laid out after the end of the left-hand side.
    ///
    /// Anything else leaves `target` unchanged.
    pub fn pipe(self, target: Operand) -> Operand {
        match (self, target) {
            (Operand::Position(position), Operand::Clip(mut clip)) => {
                clip.move_to(&position);
                clip.into()
            }
            (Operand::Position(position), target) => match Element::try_from(target) {
                Ok(mut element) => {
                    element.placement_mut().position = position;
                    element.into()
                }
                Err(target) => target,
            },
            (source, target) => {
                let lhs = match Clip::from_operand(source) {
                    Ok(clip) => clip,
                    Err(_) => return target,
                };
                match Clip::from_operand(target) {
                    Ok(rhs) => lhs.then(rhs).into(),
                    Err(target) => target,
                }
            }
        }
    }
}

impl Operate for Operand {
    fn extract(&self, selector: &Operand) -> Operand {
        match self {
            Operand::Null => selector.clone(),
            Operand::Int(value) => match selector {
                Operand::Int(_) => Operand::Int(*value),
                Operand::Float(_) => Operand::Float(*value as f64),
                Operand::Fraction(_) => Operand::Fraction(Rational64::from_integer(*value)),
                Operand::Str(_) => Operand::Str(value.to_string()),
                _ => selector.clone(),
            },
            Operand::Float(value) => match selector {
                Operand::Int(_) => Operand::Int(value.trunc() as i64),
                Operand::Float(_) => Operand::Float(*value),
                Operand::Fraction(_) => Operand::Fraction(ratio_from_f64(*value)),
                Operand::Str(_) => Operand::Str(value.to_string()),
                _ => selector.clone(),
            },
            Operand::Fraction(value) => match selector {
                Operand::Int(_) => Operand::Int(value.to_integer()),
                Operand::Float(_) => Operand::Float(ratio_to_f64(value)),
                Operand::Fraction(_) => Operand::Fraction(*value),
                Operand::Str(_) => Operand::Str(value.to_string()),
                _ => selector.clone(),
            },
            Operand::Str(value) => match selector {
                Operand::Str(_) => Operand::Str(value.clone()),
                _ => selector.clone(),
            },
            Operand::Tuple(items) => match selector {
                Operand::Tuple(_) => self.clone(),
                Operand::Int(_) => Operand::Int(items.len() as i64),
                _ => Operand::Tuple(items.iter().map(|item| item.extract(selector)).collect()),
            },
            _ => match self.as_operate() {
                Some(inner) => inner.extract(selector),
                None => selector.clone(),
            },
        }
    }

    fn assign(&mut self, source: &Operand) {
        if let Some(inner) = self.as_operate_mut() {
            inner.assign(source);
            return;
        }
        match source {
            Operand::Tuple(sources) if !matches!(self, Operand::Tuple(_)) => {
                for item in sources {
                    self.assign(item);
                }
                return;
            }
            Operand::Frame(frame) => {
                let subject = self.clone();
                if let Resolution::Value(value) = frame.resolve_detached(&subject) {
                    self.assign(&value);
                }
                return;
            }
            _ => {}
        }
        match (self, source) {
            (Operand::Null, _) => {}
            (Operand::Tuple(items), Operand::Tuple(sources)) => *items = sources.clone(),
            (Operand::Int(value), source) => match source {
                Operand::Null => *value = 0,
                source => {
                    if let Some(number) = source.as_i64() {
                        *value = number;
                    }
                }
            },
            (Operand::Float(value), source) => match source {
                Operand::Null => *value = 0.0,
                source => {
                    if let Some(number) = source.as_f64() {
                        *value = number;
                    }
                }
            },
            (Operand::Fraction(value), source) => match source {
                Operand::Null => *value = Rational64::from_integer(0),
                Operand::Fraction(fraction) => *value = *fraction,
                Operand::Int(number) => *value = Rational64::from_integer(*number),
                source => {
                    if let Some(number) = source.as_f64() {
                        *value = ratio_from_f64(number);
                    }
                }
            },
            (Operand::Str(value), Operand::Str(text)) => *value = text.clone(),
            (Operand::Str(value), Operand::Null) => value.clear(),
            (Operand::Tuple(items), Operand::Null) => items.clear(),
            _ => {}
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        match self {
            Operand::Null => Operand::Null,
            Operand::Int(lhs) => match operand {
                Operand::Float(rhs) => float_op(*lhs as f64, op, *rhs)
                    .map_or_else(|| self.clone(), Operand::Float),
                Operand::Fraction(rhs) => ratio_op(Rational64::from_integer(*lhs), op, *rhs)
                    .map_or_else(|| self.clone(), Operand::Fraction),
                rhs => match rhs.as_i64() {
                    Some(rhs) if op == Op::Div && rhs != 0 && lhs % rhs != 0 => {
                        Operand::Fraction(Rational64::new(*lhs, rhs))
                    }
                    Some(rhs) => int_op(*lhs, op, rhs).map_or_else(|| self.clone(), Operand::Int),
                    None => self.clone(),
                },
            },
            Operand::Float(lhs) => match operand.as_f64() {
                Some(rhs) => float_op(*lhs, op, rhs).map_or_else(|| self.clone(), Operand::Float),
                None => self.clone(),
            },
            Operand::Fraction(lhs) => match operand {
                Operand::Float(rhs) => float_op(ratio_to_f64(lhs), op, *rhs)
                    .map_or_else(|| self.clone(), Operand::Float),
                Operand::Fraction(rhs) => {
                    ratio_op(*lhs, op, *rhs).map_or_else(|| self.clone(), Operand::Fraction)
                }
                rhs => match rhs.as_i64() {
                    Some(rhs) => ratio_op(*lhs, op, Rational64::from_integer(rhs))
                        .map_or_else(|| self.clone(), Operand::Fraction),
                    None => self.clone(),
                },
            },
            Operand::Str(lhs) => match (op, operand) {
                (Op::Add, Operand::Str(rhs)) => Operand::Str(format!("{}{}", lhs, rhs)),
                _ => self.clone(),
            },
            Operand::Tuple(items) => match (op, operand) {
                (Op::Add, Operand::Tuple(rhs)) => {
                    Operand::Tuple(items.iter().chain(rhs.iter()).cloned().collect())
                }
                _ => Operand::Tuple(items.iter().map(|item| item.combine(op, operand)).collect()),
            },
            _ => match self.as_operate() {
                Some(inner) => inner.combine(op, operand),
                None => self.clone(),
            },
        }
    }

    fn scalar(&self) -> Option<f64> {
        self.as_f64()
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Operand {
        Operand::Int(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Operand {
        Operand::Int(value.into())
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Operand {
        Operand::Float(value)
    }
}

impl From<Rational64> for Operand {
    fn from(value: Rational64) -> Operand {
        Operand::Fraction(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Operand {
        Operand::Str(value.to_owned())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Operand {
        Operand::Str(value)
    }
}

impl From<Vec<Operand>> for Operand {
    fn from(items: Vec<Operand>) -> Operand {
        Operand::Tuple(items)
    }
}

impl From<Frame> for Operand {
    fn from(frame: Frame) -> Operand {
        Operand::Frame(Box::new(frame))
    }
}

/// Handles the sources that every operand treats the same way.
///
/// A tuple is assigned item by item and a frame is resolved against the target before its result
/// is assigned. Returns `true` if `source` was consumed.
pub(crate) fn assign_common<T>(target: &mut T, source: &Operand) -> bool
where
    T: Operate + Clone + Into<Operand>,
{
    match source {
        Operand::Tuple(items) => {
            for item in items {
                target.assign(item);
            }
            true
        }
        Operand::Frame(frame) => {
            let subject: Operand = target.clone().into();
            if let Resolution::Value(value) = frame.resolve_detached(&subject) {
                target.assign(&value);
            }
            true
        }
        _ => false,
    }
}

/// Combines the field of `target` selected by `operand` and writes it back into a copy.
///
/// `note + Velocity(10)` extracts the velocity, adds ten, and assigns the sum to a copy of the
/// note. Fields of the target's own type are left alone.
pub(crate) fn combine_field<T>(target: &T, op: Op, operand: &Operand) -> Operand
where
    T: Operate + Clone + Into<Operand>,
{
    let whole: Operand = target.clone().into();
    let field = target.extract(operand);
    if field.same_class(&whole) {
        return whole;
    }
    let mut result = target.clone();
    result.assign(&field.combine(op, operand));
    result.into()
}

pub(crate) fn int_op(lhs: i64, op: Op, rhs: i64) -> Option<i64> {
    match op {
        Op::Add => Some(lhs.saturating_add(rhs)),
        Op::Sub => Some(lhs.saturating_sub(rhs)),
        Op::Mul => Some(lhs.saturating_mul(rhs)),
        Op::Div if rhs == 0 => {
            log::warn!("ignoring division of {} by zero", lhs);
            None
        }
        Op::Div => Some(lhs / rhs),
    }
}

pub(crate) fn float_op(lhs: f64, op: Op, rhs: f64) -> Option<f64> {
    match op {
        Op::Add => Some(lhs + rhs),
        Op::Sub => Some(lhs - rhs),
        Op::Mul => Some(lhs * rhs),
        Op::Div if rhs == 0.0 => {
            log::warn!("ignoring division of {} by zero", lhs);
            None
        }
        Op::Div => Some(lhs / rhs),
    }
}

pub(crate) fn ratio_op(lhs: Rational64, op: Op, rhs: Rational64) -> Option<Rational64> {
    match op {
        Op::Add => Some(lhs + rhs),
        Op::Sub => Some(lhs - rhs),
        Op::Mul => Some(lhs * rhs),
        Op::Div if rhs == Rational64::from_integer(0) => {
            log::warn!("ignoring division of {} by zero", lhs);
            None
        }
        Op::Div => Some(lhs / rhs),
    }
}

pub(crate) fn ratio_to_f64(value: &Rational64) -> f64 {
    *value.numer() as f64 / *value.denom() as f64
}

/// Steps per unit on the grid that floats are snapped to when they become exact ratios.
const FLOAT_GRID: i64 = 1 << 20;

/// Converts a float to a ratio with a denominator dividing [`FLOAT_GRID`].
///
/// Sums and products of the results stay far from overflowing an `i64`. Values outside the range
/// the grid can represent are clamped and non-finite values become zero.
pub(crate) fn ratio_from_f64(value: f64) -> Rational64 {
    if !value.is_finite() {
        log::warn!("treating {} as zero", value);
        return Rational64::from_integer(0);
    }
    let limit = (i64::MAX / FLOAT_GRID) as f64;
    let scaled = value.max(-limit).min(limit) * FLOAT_GRID as f64;
    Rational64::new(scaled.round() as i64, FLOAT_GRID)
}

/// Exact rational view of a numeric operand.
pub(crate) fn ratio_of(operand: &Operand) -> Option<Rational64> {
    match operand {
        Operand::Int(value) => Some(Rational64::from_integer(*value)),
        Operand::Fraction(value) => Some(*value),
        Operand::Float(value) => Some(ratio_from_f64(*value)),
        _ => None,
    }
}

macro_rules! operators {
    ($($ty:ty),*) => {$(
        impl<T: Into<Operand>> std::ops::Rem<T> for &$ty {
            type Output = Operand;

            fn rem(self, selector: T) -> Operand {
                self.extract(&selector.into())
            }
        }

        impl<T: Into<Operand>> std::ops::Shl<T> for $ty {
            type Output = $ty;

            fn shl(mut self, source: T) -> $ty {
                self.assign(&source.into());
                self
            }
        }

        impl<T: Into<Operand>> std::ops::ShlAssign<T> for $ty {
            fn shl_assign(&mut self, source: T) {
                self.assign(&source.into());
            }
        }

        impl<T: Into<Operand>> std::ops::Add<T> for &$ty {
            type Output = Operand;

            fn add(self, operand: T) -> Operand {
                self.combine(Op::Add, &operand.into())
            }
        }

        impl<T: Into<Operand>> std::ops::Sub<T> for &$ty {
            type Output = Operand;

            fn sub(self, operand: T) -> Operand {
                self.combine(Op::Sub, &operand.into())
            }
        }

        impl<T: Into<Operand>> std::ops::Mul<T> for &$ty {
            type Output = Operand;

            fn mul(self, operand: T) -> Operand {
                self.combine(Op::Mul, &operand.into())
            }
        }

        impl<T: Into<Operand>> std::ops::Div<T> for &$ty {
            type Output = Operand;

            fn div(self, operand: T) -> Operand {
                self.combine(Op::Div, &operand.into())
            }
        }

        impl<T: Into<Operand>> std::ops::Shr<T> for $ty {
            type Output = Operand;

            fn shr(self, target: T) -> Operand {
                Operand::from(self).pipe(target.into())
            }
        }
    )*};
}

operators!(
    Operand, Key, Tonic, Octave, Degree, Transposition, Semitone, Sharp, Flat, Natural, Mode,
    Velocity, Gate, Swing, Division, Channel, Program, Pressure, Number, Value, Bend, Size,
    Inversion, Device, Track, Tempo, Position, Duration, Measure, Beat, Step, NoteValue,
    TimeSignature, KeySignature, Scale, Pitch, Controller, Note, Chord, KeyScale, Rest, Retrigger,
    Tuplet, ControlChange, PitchBend, Aftertouch, PolyAftertouch, ProgramChange, Clock, Panic,
    Clip, Modulus, Flipper, Bouncer, SinX, Settings
);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_selector_is_returned_unchanged() {
        let velocity = Velocity(90);
        assert_eq!(Operand::Degree(Degree(3.0)), &velocity % Degree(3.0));
        assert_eq!(Operand::Str("x".into()), &Operand::Int(4) % "x");
    }

    #[test]
    fn same_class_selector_returns_copy() {
        let operand = Operand::Velocity(Velocity(42));
        assert_eq!(operand, &operand % Velocity(0));
    }

    #[test]
    fn unsupported_source_is_a_no_op() {
        let mut operand = Operand::Velocity(Velocity(42));
        operand <<= Scale::default();
        assert_eq!(Operand::Velocity(Velocity(42)), operand);
        let mut null = Operand::Null;
        null <<= 5;
        assert_eq!(Operand::Null, null);
    }

    #[test]
    fn tuple_source_assigns_each_item() {
        let velocity = Velocity(1) << Operand::Tuple(vec![Operand::Null, Operand::Int(5)]);
        assert_eq!(Velocity(5), velocity);
    }

    #[test]
    fn floats_snap_to_small_denominators() {
        let ratio = ratio_from_f64(0.1234567891234);
        assert!(*ratio.denom() <= FLOAT_GRID);
        assert!((ratio_to_f64(&ratio) - 0.1234567891234).abs() < 1e-6);
        assert_eq!(Rational64::new(3, 8), ratio_from_f64(0.375));
        assert_eq!(Rational64::from_integer(0), ratio_from_f64(f64::NAN));
        assert!(*ratio_from_f64(1e300).numer() > 0);
    }

    #[test]
    fn integer_division_stays_exact() {
        assert_eq!(Operand::Int(3), &Operand::Int(6) / 2);
        assert_eq!(Operand::Fraction(Rational64::new(3, 2)), &Operand::Int(3) / 2);
    }

    #[test]
    fn division_by_zero_is_ignored() {
        assert_eq!(Operand::Int(6), &Operand::Int(6) / 0);
        assert_eq!(Operand::Float(1.5), &Operand::Float(1.5) / 0.0);
    }

    #[test]
    fn numbers_mix_with_typed_scalars() {
        assert_eq!(Operand::Int(15), &Operand::Int(10) + Velocity(5));
        assert_eq!(Some(std::cmp::Ordering::Less), Operand::Int(1).compare(&Operand::Float(1.5)));
        assert_eq!(None, Operand::Int(1).compare(&Operand::Str("1".into())));
    }

    #[test]
    fn tuple_combines_element_wise() {
        let tuple = Operand::Tuple(vec![Operand::Int(1), Operand::Int(2)]);
        assert_eq!(
            Operand::Tuple(vec![Operand::Int(2), Operand::Int(4)]),
            &tuple * 2
        );
        assert_eq!(Operand::Int(2), &tuple % 0);
    }

    #[test]
    fn class_names_match_records() {
        assert_eq!("Velocity", Operand::Velocity(Velocity(1)).class());
        assert_eq!("Null", Operand::Null.class());
        let record = serde_json::to_value(Operand::Velocity(Velocity(7))).unwrap();
        assert_eq!(serde_json::json!({"class": "Velocity", "parameters": 7}), record);
    }
}

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

//! Records: operands as JSON.
//!
//! Every operand serializes to a record of the form `{"class": ..., "parameters": ...}`, nested
//! for composite operands. Frames keep their nodes and payload but not their iteration state, so
//! a loaded frame starts over.
//!
//! # Examples
//!
//! ```
//! use operata::element::Note;
//! use operata::operand::Operand;
//! use operata::unit::Degree;
//!
//! let note = Operand::Note(Note::default() << Degree(3.0));
//! let record = note.to_record()?;
//! assert_eq!("Note", record["class"]);
//! assert_eq!(note, Operand::from_record(record)?);
//! # operata::error::Result::Ok(())
//! ```

use crate::{
    error::{Error, Result},
    operand::Operand,
};
use serde_json::Value;
use std::{fs, path::Path};

impl Operand {
    /// Serializes this operand to a record.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter cannot be represented as JSON.
    pub fn to_record(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parses an operand from a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownClass`] if the record names a class that does not exist, and
    /// [`Error::Json`] if its parameters do not fit the class.
    pub fn from_record(record: Value) -> Result<Operand> {
        let class = record.get("class").and_then(Value::as_str);
        if let Some(class) = class {
            if !Operand::CLASSES.iter().any(|known| *known == class) {
                return Err(Error::UnknownClass(class.to_owned()));
            }
            log::debug!("loading {} record", class);
        }
        Ok(serde_json::from_value(record)?)
    }
}

/// Writes the record of `operand` to a JSON file.
///
/// # Errors
///
/// Returns an error if the operand cannot be serialized or the file cannot be written.
pub fn save_json(path: impl AsRef<Path>, operand: &Operand) -> Result<()> {
    let json = serde_json::to_string_pretty(&operand.to_record()?)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reads an operand from a JSON file written by [`save_json`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a valid record.
pub fn load_json(path: impl AsRef<Path>) -> Result<Operand> {
    let json = fs::read_to_string(path)?;
    Operand::from_record(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clip::Clip,
        element::{Chord, Note, PitchBend},
        frame::Node,
        unit::{Inversion, Velocity},
    };
    use num_rational::Rational64;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn round_trip(operand: Operand) {
        let record = operand.to_record().unwrap();
        assert_eq!(operand, Operand::from_record(record).unwrap());
    }

    #[test]
    fn primitives() {
        assert_eq!(json!({"class": "Null"}), Operand::Null.to_record().unwrap());
        assert_eq!(
            json!({"class": "Int", "parameters": 3}),
            Operand::Int(3).to_record().unwrap()
        );
        round_trip(Operand::Fraction(Rational64::new(3, 8)));
        round_trip(Operand::Tuple(vec![Operand::Str("a".into()), Operand::Float(0.5)]));
    }

    #[test]
    fn composites() {
        let clip = Clip::sequence(|s| {
            s.play(Note::default() << Velocity(70));
            s.play(Chord::default() << Inversion(1));
            s.play(PitchBend::default() << 200);
        });
        round_trip(clip.into());
    }

    #[test]
    fn frames_keep_their_chain() {
        let frame = Node::Nth(vec![2]) ^ Node::Cycle(vec![Operand::Int(1)]) ^ Velocity(1);
        round_trip(frame.into());
    }

    #[test]
    fn unknown_classes_are_rejected() {
        match Operand::from_record(json!({"class": "Trumpet", "parameters": 1})) {
            Err(Error::UnknownClass(class)) => assert_eq!("Trumpet", class),
            other => panic!("expected an unknown class error, got {:?}", other),
        }
        assert!(matches!(
            Operand::from_record(json!({"class": "Velocity", "parameters": "loud"})),
            Err(Error::Json(_))
        ));
    }
}

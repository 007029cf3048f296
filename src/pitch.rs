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

//! Pitches in the context of a key.
//!
//! A [`Pitch`] is not stored as a MIDI note number. It is a position inside a key, described the
//! way a musician would: a tonic, a scale degree (possibly raised or lowered), an extra
//! transposition along the scale and an octave. The MIDI number is derived from those fields:
//!
//! ```text
//! pitch = tonic + degree_transposition + scale_transposition + accidentals + 12 * octave
//! ```
//!
//! * `degree_transposition` walks the degree's number of steps through the pitch classes of the
//!   key signature, starting at the tonic.
//! * `scale_transposition` walks the transposition's number of steps, either through an explicit
//!   [`Scale`] starting at the degree, or through the key signature again.
//! * `accidentals` come from the fractional part of the degree.
//!
//! After every change the degree and transposition are folded back into a single octave so that
//! the same sounding pitch always has the same representation.
//!
//! # Examples
//!
//! ```
//! use operata::operand::Operand;
//! use operata::pitch::Pitch;
//! use operata::scale::KeySignature;
//! use operata::unit::{Degree, Key};
//!
//! // The fifth degree of D major, in the fourth octave.
//! let pitch = Pitch::new(KeySignature::new(2, false), 4) << Degree(5.0);
//! assert_eq!(69, pitch.pitch_int());
//! assert_eq!(Operand::Key(Key(9)), &pitch % Key::default());
//! ```

use crate::{
    operand::{assign_common, Op, Operand, Operate},
    scale::{walk, KeySignature, Scale},
    unit::{
        project_integer, Degree, Flat, Key, Natural, Octave, Semitone, Sharp, Tonic,
        Transposition,
    },
};
use serde::{Deserialize, Serialize};

/// A musical pitch relative to a key signature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    key_signature: KeySignature,
    /// Index into the spelled key table, 0 to 23.
    tonic_key: u8,
    /// Display octave plus one, so that `12 * octave` is the MIDI number of its C.
    octave: i64,
    /// Zero-based scale steps above the tonic. The fraction encodes accidentals.
    degree: f64,
    transposition: i64,
    scale: Option<Scale>,
}

impl Pitch {
    /// The tonic of `key_signature` in the given display octave.
    pub fn new(key_signature: KeySignature, octave: i64) -> Pitch {
        Pitch {
            key_signature,
            tonic_key: key_signature.tonic_key().0,
            octave: octave + 1,
            degree: 0.0,
            transposition: 0,
            scale: None,
        }
    }

    pub fn key_signature(&self) -> KeySignature {
        self.key_signature
    }

    pub fn tonic(&self) -> Key {
        Key(self.tonic_key)
    }

    /// The scale degree, 1-based.
    pub fn degree(&self) -> Degree {
        Degree::from_steps(self.degree)
    }

    pub fn transposition(&self) -> i64 {
        self.transposition
    }

    /// The scale that transpositions walk, if it differs from the key signature.
    pub fn scale(&self) -> Option<Scale> {
        self.scale
    }

    /// The display octave of the sounding pitch.
    pub fn octave(&self) -> i64 {
        self.pitch_int().div_euclid(12) - 1
    }

    /// The sounding key, spelled for the key signature.
    pub fn key(&self) -> Key {
        self.key_signature.spell(self.pitch_int())
    }

    /// A name such as `"Eb4"`.
    pub fn name(&self) -> String {
        format!("{}{}", self.key().name(), self.octave())
    }

    /// The MIDI note number of this pitch.
    pub fn pitch_int(&self) -> i64 {
        let degree_transposition = self.degree_transposition();
        self.tonic_pitch_class()
            + degree_transposition
            + self.scale_transposition(degree_transposition)
            + self.accidentals()
            + 12 * self.octave
    }

    /// Folds degree and transposition back into the octave above the tonic.
    ///
    /// The folded amount is carried into the octave, so the sounding pitch is unchanged.
    pub fn normalize(&mut self) {
        self.fold(true);
    }

    /// Assigns `source` and folds the result into the current octave.
    ///
    /// Unlike a plain assignment, the folded amount is dropped instead of carried into the
    /// octave, so a degree past the seventh wraps around to the tonic's octave.
    pub fn assign_fixed_octave(&mut self, source: &Operand) {
        self.apply(source, false);
    }

    fn tonic_pitch_class(&self) -> i64 {
        i64::from(self.tonic_key % 12)
    }

    fn steps(&self) -> i64 {
        self.degree.trunc() as i64
    }

    fn degree_transposition(&self) -> i64 {
        walk(&self.key_signature.mask(), self.tonic_pitch_class(), self.steps())
    }

    fn scale_transposition(&self, degree_transposition: i64) -> i64 {
        if self.transposition == 0 {
            return 0;
        }
        match &self.scale {
            Some(scale) => scale.walk(degree_transposition, self.transposition),
            None => {
                walk(
                    &self.key_signature.mask(),
                    self.tonic_pitch_class(),
                    self.steps() + self.transposition,
                ) - degree_transposition
            }
        }
    }

    /// Sharps are positive and flats negative.
    ///
    /// Odd tenths move in the direction of the degree's sign and even tenths against it, so for a
    /// positive degree `.1` is a sharp, `.2` a flat, `.3` a double sharp and `.4` a double flat.
    fn accidentals(&self) -> i64 {
        let fraction = (self.degree - self.degree.trunc()).abs();
        let tenths = (fraction * 10.0).round() as i64;
        if tenths == 0 {
            return 0;
        }
        let magnitude = (tenths + 1) / 2;
        let sign = if self.degree < 0.0 { -1 } else { 1 };
        if tenths % 2 == 1 {
            sign * magnitude
        } else {
            -sign * magnitude
        }
    }

    fn set_degree(&mut self, steps: i64, accidentals: i64) {
        self.degree = compose(steps, accidentals);
    }

    fn fold(&mut self, move_octave: bool) {
        let key_degrees = self.key_signature.scale().degrees() as i64;
        let before = self.degree_transposition();
        let rotations = -before.div_euclid(12);
        if rotations != 0 {
            let folded = rotations
                .checked_mul(key_degrees)
                .and_then(|steps| steps.checked_add(self.steps()))
                .map(|steps| {
                    let mut folded = *self;
                    folded.set_degree(steps, self.accidentals());
                    folded
                })
                .filter(|folded| {
                    folded.degree_transposition().checked_sub(before) == Some(12 * rotations)
                });
            match folded {
                Some(folded) => self.rotate(folded, rotations, move_octave),
                None => log::warn!(
                    "tonic {} is outside of {}, keeping degree unfolded",
                    self.tonic().name(),
                    self.key_signature.name()
                ),
            }
        }

        let scale_degrees = self
            .scale
            .map_or(key_degrees, |scale| scale.degrees() as i64);
        let degree_transposition = self.degree_transposition();
        let before = degree_transposition + self.scale_transposition(degree_transposition);
        let rotations = -before.div_euclid(12);
        if rotations != 0 {
            let folded = rotations
                .checked_mul(scale_degrees)
                .and_then(|steps| steps.checked_add(self.transposition))
                .map(|transposition| Pitch {
                    transposition,
                    ..*self
                })
                .filter(|folded| {
                    let after =
                        degree_transposition + folded.scale_transposition(degree_transposition);
                    after.checked_sub(before) == Some(12 * rotations)
                });
            match folded {
                Some(folded) => self.rotate(folded, rotations, move_octave),
                None => log::warn!(
                    "degree {} is outside of the transposing scale, keeping transposition unfolded",
                    self.degree().name()
                ),
            }
        }
    }

    fn rotate(&mut self, folded: Pitch, rotations: i64, move_octave: bool) {
        *self = folded;
        if move_octave {
            self.octave -= rotations;
        }
    }

    /// Respells this pitch to sound at the MIDI number `target`.
    ///
    /// Pitch classes outside of the key become a neighbouring degree with an accidental, flat in
    /// flat keys and sharp otherwise. The transposition is cleared.
    fn set_pitch_int(&mut self, target: i64) {
        let tonic = self.tonic_pitch_class();
        let offset = (target - tonic).rem_euclid(12);
        let mask = self.key_signature.mask();
        let prefer_flats = self.key_signature.accidentals() < 0;
        let mut previous = 0;
        let mut steps = 0;
        let (steps, accidentals) = loop {
            let position = walk(&mask, tonic, steps);
            if position == offset {
                break (steps, 0);
            }
            if position > offset {
                break if prefer_flats {
                    (steps, offset - position)
                } else {
                    (steps - 1, offset - previous)
                };
            }
            previous = position;
            steps += 1;
        };
        self.set_degree(steps, accidentals);
        self.transposition = 0;
        self.octave += (target - self.pitch_int()).div_euclid(12);
        self.fold(true);
    }

    fn set_key(&mut self, key: Key) {
        let octave_base = 12 * self.pitch_int().div_euclid(12);
        self.set_pitch_int(octave_base + i64::from(key.pitch_class()));
    }

    fn apply(&mut self, source: &Operand, move_octave: bool) {
        match source {
            Operand::Pitch(pitch) => *self = *pitch,
            Operand::Null => {
                self.tonic_key = self.key_signature.tonic_key().0;
                self.degree = 0.0;
                self.transposition = 0;
                self.scale = None;
            }
            Operand::KeySignature(signature) => {
                self.key_signature = *signature;
                self.tonic_key = signature.tonic_key().0;
                self.fold(move_octave);
            }
            Operand::Tonic(Tonic(key)) => {
                self.tonic_key = key.0 % 24;
                self.fold(move_octave);
            }
            Operand::Key(key) => self.set_key(*key),
            Operand::Octave(Octave(octave)) => self.octave += octave - self.octave(),
            Operand::Degree(degree) => {
                self.degree = degree.steps();
                self.fold(move_octave);
            }
            Operand::Transposition(Transposition(transposition)) => {
                self.transposition = *transposition;
                self.fold(move_octave);
            }
            Operand::Sharp(Sharp(sharps)) => self.set_degree(self.steps(), *sharps),
            Operand::Flat(Flat(flats)) => self.set_degree(self.steps(), -*flats),
            Operand::Natural(_) => self.set_degree(self.steps(), 0),
            Operand::Scale(scale) => {
                self.scale = Some(*scale);
                self.fold(move_octave);
            }
            Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => {
                if let Some(value) = source.as_f64() {
                    self.set_pitch_int(value.round() as i64);
                }
            }
            Operand::Str(text) => {
                if let Some(key) = Key::from_name(text) {
                    self.set_key(key);
                } else if let Some(degree) = Degree::from_name(text) {
                    self.apply(&Operand::Degree(degree), move_octave);
                } else {
                    log::debug!("ignoring unknown pitch name {:?}", text);
                }
            }
            _ => {}
        }
    }
}

/// Encodes `steps` and `accidentals` as a degree with an accidental fraction.
fn compose(steps: i64, accidentals: i64) -> f64 {
    if accidentals == 0 {
        return steps as f64;
    }
    let magnitude = accidentals.abs().min(4);
    let upward = steps >= 0;
    let tenths = if (accidentals > 0) == upward {
        2 * magnitude - 1
    } else {
        2 * magnitude
    };
    let fraction = tenths as f64 / 10.0;
    if upward {
        steps as f64 + fraction
    } else {
        steps as f64 - fraction
    }
}

impl Default for Pitch {
    fn default() -> Self {
        Pitch::new(KeySignature::default(), 4)
    }
}

impl Operate for Pitch {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Pitch(_) => Operand::Pitch(*self),
            Operand::KeySignature(_) => Operand::KeySignature(self.key_signature),
            Operand::Key(_) => Operand::Key(self.key()),
            Operand::Tonic(_) => Operand::Tonic(Tonic(self.tonic())),
            Operand::Octave(_) => Operand::Octave(Octave(self.octave())),
            Operand::Degree(_) => Operand::Degree(self.degree()),
            Operand::Transposition(_) => Operand::Transposition(Transposition(self.transposition)),
            Operand::Scale(_) => {
                Operand::Scale(self.scale.unwrap_or_else(|| self.key_signature.scale()))
            }
            Operand::Sharp(_) => Operand::Sharp(Sharp(self.accidentals().max(0))),
            Operand::Flat(_) => Operand::Flat(Flat((-self.accidentals()).max(0))),
            Operand::Natural(_) => Operand::Natural(Natural(i64::from(self.accidentals() == 0))),
            Operand::Str(_) => Operand::Str(self.key().name().to_owned()),
            _ => project_integer(self.pitch_int(), selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        self.apply(source, true);
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        let sign = match op {
            Op::Add => 1,
            Op::Sub => -1,
            Op::Mul | Op::Div => return Operand::Pitch(*self),
        };
        let mut pitch = *self;
        match operand {
            Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => {
                if let Some(semitones) = operand.as_f64() {
                    pitch.set_pitch_int(self.pitch_int() + sign * semitones.round() as i64);
                }
            }
            Operand::Semitone(Semitone(semitones)) => {
                pitch.set_pitch_int(self.pitch_int() + sign * semitones)
            }
            Operand::Degree(Degree(steps)) => {
                pitch.set_degree(self.steps() + sign * steps.trunc() as i64, self.accidentals());
                pitch.normalize();
            }
            Operand::Transposition(Transposition(steps)) => {
                pitch.transposition += sign * steps;
                pitch.normalize();
            }
            Operand::Octave(Octave(octaves)) => pitch.octave += sign * octaves,
            _ => {}
        }
        Operand::Pitch(pitch)
    }

    fn scalar(&self) -> Option<f64> {
        Some(self.pitch_int() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn middle_c_and_its_third() {
        let pitch = Pitch::default();
        assert_eq!(60, pitch.pitch_int());
        let pitch = pitch << Degree(3.0);
        assert_eq!(64, pitch.pitch_int());
        assert_eq!("E4", pitch.name());
    }

    #[test]
    fn degrees_walk_the_key_signature() {
        let pitch = Pitch::new(KeySignature::new(1, false), 4) << Degree(7.0);
        assert_eq!(78, pitch.pitch_int());
        assert_eq!("F#", pitch.key().name());
    }

    #[test]
    fn degree_fractions_are_accidentals() {
        assert_eq!(65, (Pitch::default() << Degree(3.1)).pitch_int());
        assert_eq!(63, (Pitch::default() << Degree(3.2)).pitch_int());
        assert_eq!(66, (Pitch::default() << Degree(3.3)).pitch_int());
        assert_eq!(62, (Pitch::default() << Degree(3.4)).pitch_int());
        assert_eq!(Operand::Sharp(Sharp(1)), &(Pitch::default() << Degree(3.1)) % Sharp(0));
    }

    #[test]
    fn degrees_past_the_octave_carry() {
        let pitch = Pitch::default() << Degree(8.0);
        assert_eq!(72, pitch.pitch_int());
        assert_eq!(Operand::Degree(Degree(1.0)), &pitch % Degree::default());
        assert_eq!(Operand::Octave(Octave(5)), &pitch % Octave::default());
    }

    #[test]
    fn distant_degrees_fold_in_one_go() {
        let pitch = Pitch::default() << Degree(1e15 + 1.0);
        assert_eq!(1_714_285_714_285_775, pitch.pitch_int());
        assert_eq!(Operand::Degree(Degree(7.0)), &pitch % Degree::default());

        let pitch = Pitch::default() << Transposition(-7_000_000);
        assert_eq!(60 - 12_000_000, pitch.pitch_int());
        assert_eq!(0, pitch.transposition());
    }

    #[test]
    fn fixed_octave_assignment_wraps() {
        let mut pitch = Pitch::default();
        pitch.assign_fixed_octave(&Operand::Degree(Degree(9.0)));
        assert_eq!(62, pitch.pitch_int());
    }

    #[test]
    fn transposition_along_explicit_scale() {
        let pentatonic = Scale::from_name("pentatonic").unwrap();
        let pitch = Pitch::default() << pentatonic << Transposition(2);
        assert_eq!(64, pitch.pitch_int());
        let pitch = pitch << Transposition(5);
        assert_eq!(72, pitch.pitch_int());
        assert_eq!(Operand::Transposition(Transposition(0)), &pitch % Transposition(0));
    }

    #[test]
    fn transposition_along_key_signature() {
        let pitch = Pitch::default() << Degree(2.0) << Transposition(2);
        assert_eq!(65, pitch.pitch_int());
    }

    #[test]
    fn assign_absolute_pitch() {
        let pitch = Pitch::default() << 61;
        assert_eq!(61, pitch.pitch_int());
        assert_eq!(Operand::Sharp(Sharp(1)), &pitch % Sharp(0));

        let f_major = Pitch::new(KeySignature::new(-1, false), 4);
        let pitch = f_major << 70;
        assert_eq!(70, pitch.pitch_int());
        assert_eq!("Bb", pitch.key().name());
        let pitch = f_major << 66;
        assert_eq!(66, pitch.pitch_int());
        assert_eq!("Gb", pitch.key().name());
    }

    #[test]
    fn assign_key_keeps_octave() {
        let pitch = Pitch::default() << Octave(2) << Key(9);
        assert_eq!(45, pitch.pitch_int());
        let pitch = pitch << "Eb";
        assert_eq!(39, pitch.pitch_int());
    }

    #[test]
    fn assign_key_signature_moves_tonic() {
        let pitch = Pitch::default() << KeySignature::new(2, false);
        assert_eq!(62, pitch.pitch_int());
        assert_eq!(Operand::Tonic(Tonic(Key(2))), &pitch % Tonic::default());
        let minor = Pitch::new(KeySignature::new(0, true), 4);
        assert_eq!(69, minor.pitch_int());
    }

    #[test]
    fn combine_degrees_and_semitones() {
        let pitch = Pitch::default();
        assert_eq!(Operand::Int(64), &(&pitch + Degree(2.0)) % 0);
        assert_eq!(Operand::Int(62), &(&pitch + 2) % 0);
        assert_eq!(Operand::Int(72), &(&pitch + Octave(1)) % 0);
        assert_eq!(Operand::Int(59), &(&pitch - Degree(1.0)) % 0);
        assert_eq!(Operand::Pitch(pitch), &pitch * 3);
    }

    #[test]
    fn unknown_sources_leave_pitch_alone() {
        let pitch = Pitch::default() << Degree(5.0);
        assert_eq!(pitch, pitch << "xyz" << crate::unit::Velocity(3));
    }

    #[test]
    fn null_resets_to_tonic() {
        let pitch = Pitch::default() << Degree(5.0) << Operand::Null;
        assert_eq!(60, pitch.pitch_int());
    }
}

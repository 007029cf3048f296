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

//! Scales and key signatures.
//!
//! A [`Scale`] is a set of active slots among the twelve chromatic pitch classes, counted from
//! the tonic. A [`KeySignature`] is a count of sharps or flats plus a major or minor mode; it
//! implies both a tonic and a set of absolute pitch classes that belong to the key.

use crate::{
    error::{Error, Result},
    operand::{assign_common, Op, Operand, Operate},
    unit::{Flat, Key, Mode, Sharp, Tonic},
};
use serde::{Deserialize, Serialize};

type Mask = [bool; 12];

const fn mask(slots: [u8; 12]) -> Mask {
    let mut mask = [false; 12];
    let mut index = 0;
    while index < 12 {
        mask[index] = slots[index] != 0;
        index += 1;
    }
    mask
}

const MAJOR: Mask = mask([1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1]);

const SCALES: &[(&str, &[&str], Mask)] = &[
    ("major", &["ionian", "maj"], MAJOR),
    ("minor", &["aeolian", "min", "natural minor"], mask([1, 0, 1, 1, 0, 1, 0, 1, 1, 0, 1, 0])),
    ("harmonic minor", &["harmonic"], mask([1, 0, 1, 1, 0, 1, 0, 1, 1, 0, 0, 1])),
    ("melodic minor", &["melodic"], mask([1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 1])),
    ("dorian", &[], mask([1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 1, 0])),
    ("phrygian", &[], mask([1, 1, 0, 1, 0, 1, 0, 1, 1, 0, 1, 0])),
    ("lydian", &[], mask([1, 0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1])),
    ("mixolydian", &[], mask([1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 1, 0])),
    ("locrian", &[], mask([1, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0])),
    ("whole tone", &["whole"], mask([1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0])),
    ("major pentatonic", &["pentatonic"], mask([1, 0, 1, 0, 1, 0, 0, 1, 0, 1, 0, 0])),
    ("minor pentatonic", &[], mask([1, 0, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0])),
    ("blues", &[], mask([1, 0, 0, 1, 0, 1, 1, 1, 0, 0, 1, 0])),
    ("chromatic", &[], [true; 12]),
    ("diminished", &["octatonic"], mask([1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1])),
    ("augmented", &[], mask([1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1])),
];

/// Moves `steps` active slots through `mask` from pitch class `start`.
///
/// Returns the distance travelled in semitones, negative when `steps` is.
pub(crate) fn walk(mask: &Mask, start: i64, steps: i64) -> i64 {
    let degrees = mask.iter().filter(|slot| **slot).count() as i64;
    if degrees == 0 || steps == 0 {
        return 0;
    }
    let direction = steps.signum();
    // Past the first lap every `degrees` steps land exactly an octave further.
    let laps = (steps.saturating_abs() - 1) / degrees;
    let mut remaining = steps - direction * laps * degrees;
    let mut semitones = 0;
    while remaining != 0 {
        semitones += direction;
        if mask[(start + semitones).rem_euclid(12) as usize] {
            remaining -= direction;
        }
    }
    semitones.saturating_add(direction * laps.saturating_mul(12))
}

/// A set of pitch classes relative to a tonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scale {
    mask: Mask,
}

impl Scale {
    /// Builds a scale from twelve slots, where `true` marks a pitch class that belongs to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScale`] unless `slots` has exactly twelve entries and
    /// [`Error::EmptyScale`] if none of them are active.
    pub fn from_mask(slots: &[bool]) -> Result<Scale> {
        if slots.len() != 12 {
            return Err(Error::InvalidScale { len: slots.len() });
        }
        if !slots.iter().any(|slot| *slot) {
            return Err(Error::EmptyScale);
        }
        let mut mask = [false; 12];
        mask.copy_from_slice(slots);
        Ok(Scale { mask })
    }

    /// Looks up a scale by name, such as `"dorian"` or `"harmonic minor"`.
    pub fn from_name(name: &str) -> Option<Scale> {
        let name = name.trim();
        SCALES
            .iter()
            .find(|(primary, aliases, _)| {
                primary.eq_ignore_ascii_case(name)
                    || aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
            })
            .map(|(_, _, mask)| Scale { mask: *mask })
    }

    pub fn major() -> Scale {
        Scale { mask: MAJOR }
    }

    pub fn minor() -> Scale {
        Scale::major().modulate(6)
    }

    /// The name of this scale, if it is a well-known one.
    pub fn name(&self) -> Option<&'static str> {
        SCALES
            .iter()
            .find(|(_, _, mask)| *mask == self.mask)
            .map(|(name, _, _)| *name)
    }

    pub fn mask(&self) -> [bool; 12] {
        self.mask
    }

    /// The number of active slots.
    pub fn degrees(&self) -> usize {
        self.mask.iter().filter(|slot| **slot).count()
    }

    /// Returns `true` if the pitch class `offset` semitones above the tonic belongs to the scale.
    pub fn contains(&self, offset: i64) -> bool {
        self.mask[offset.rem_euclid(12) as usize]
    }

    /// The semitones between the tonic and the note `steps` scale steps above it.
    pub fn transposition(&self, steps: i64) -> i64 {
        walk(&self.mask, 0, steps)
    }

    /// Moves `steps` scale steps from the slot `start` semitones above the tonic.
    pub fn walk(&self, start: i64, steps: i64) -> i64 {
        walk(&self.mask, start, steps)
    }

    /// The scale rotated to start on its 1-based `mode` degree.
    ///
    /// Mode 2 of the major scale is dorian, mode 6 is the natural minor.
    pub fn modulate(&self, mode: i64) -> Scale {
        let degrees = self.degrees() as i64;
        let steps = (mode - 1).rem_euclid(degrees.max(1));
        let offset = walk(&self.mask, 0, steps);
        let mut mask = [false; 12];
        for (index, slot) in mask.iter_mut().enumerate() {
            *slot = self.mask[(index as i64 + offset).rem_euclid(12) as usize];
        }
        Scale { mask }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::major()
    }
}

impl Operate for Scale {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Scale(_) => Operand::Scale(*self),
            Operand::Int(_) => Operand::Int(self.degrees() as i64),
            Operand::Str(_) => Operand::Str(self.name().unwrap_or("custom").to_owned()),
            Operand::Tuple(_) => Operand::Tuple(
                self.mask
                    .iter()
                    .map(|slot| Operand::Int(i64::from(*slot)))
                    .collect(),
            ),
            _ => selector.clone(),
        }
    }

    fn assign(&mut self, source: &Operand) {
        match source {
            Operand::Scale(scale) => *self = *scale,
            Operand::Null => *self = Scale::default(),
            Operand::Mode(Mode(mode)) => *self = self.modulate(*mode),
            Operand::Str(name) => match Scale::from_name(name) {
                Some(scale) => *self = scale,
                None => log::warn!("ignoring unknown scale {:?}", name),
            },
            Operand::Tuple(items) => {
                let slots: Vec<bool> = items
                    .iter()
                    .map(|item| item.as_i64().map_or(false, |slot| slot != 0))
                    .collect();
                match Scale::from_mask(&slots) {
                    Ok(scale) => *self = scale,
                    Err(err) => log::warn!("ignoring scale mask: {}", err),
                }
            }
            _ => {
                assign_common(self, source);
            }
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        match (op, operand.as_i64()) {
            (Op::Add, Some(steps)) => Operand::Scale(self.modulate(steps + 1)),
            (Op::Sub, Some(steps)) => Operand::Scale(self.modulate(1 - steps)),
            _ => Operand::Scale(*self),
        }
    }
}

/// A number of sharps (positive) or flats (negative) and a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeySignature {
    accidentals: i8,
    minor: bool,
}

impl KeySignature {
    /// Creates a key signature, clamping `accidentals` to seven sharps or flats.
    pub fn new(accidentals: i64, minor: bool) -> KeySignature {
        if !(-7..=7).contains(&accidentals) {
            log::warn!("clamping {} accidentals to the range -7..=7", accidentals);
        }
        KeySignature {
            accidentals: accidentals.max(-7).min(7) as i8,
            minor,
        }
    }

    /// The signature whose tonic is spelled `key`.
    ///
    /// Falls back to the signature with the fewest accidentals whose tonic has the same pitch
    /// class.
    pub fn with_tonic(key: Key, minor: bool) -> KeySignature {
        let candidates = || (-7..=7).map(move |accidentals| KeySignature::new(accidentals, minor));
        candidates()
            .find(|signature| signature.tonic_key() == key)
            .or_else(|| {
                candidates()
                    .filter(|signature| signature.tonic_pitch_class() == key.pitch_class())
                    .min_by_key(|signature| signature.accidentals.abs())
            })
            .unwrap_or_default()
    }

    pub fn accidentals(&self) -> i64 {
        self.accidentals.into()
    }

    pub fn is_minor(&self) -> bool {
        self.minor
    }

    fn major_tonic(&self) -> i64 {
        (7 * self.accidentals()).rem_euclid(12)
    }

    /// The pitch class of the tonic.
    pub fn tonic_pitch_class(&self) -> u8 {
        let tonic = if self.minor {
            self.major_tonic() + 9
        } else {
            self.major_tonic()
        };
        (tonic % 12) as u8
    }

    /// The tonic, spelled for this signature.
    pub fn tonic_key(&self) -> Key {
        self.spell(i64::from(self.tonic_pitch_class()))
    }

    /// Returns `true` if `pitch_class` is spelled on the alternate line in this key.
    pub fn is_enharmonic(&self, pitch_class: i64) -> bool {
        let pitch_class = pitch_class.rem_euclid(12);
        let accidentals = self.accidentals();
        match pitch_class {
            1 | 3 | 6 | 8 | 10 => accidentals < 0,
            11 => accidentals <= -6,
            4 => accidentals <= -7,
            5 => accidentals >= 6,
            0 => accidentals >= 7,
            _ => false,
        }
    }

    /// The key for `pitch_class`, spelled for this signature.
    pub fn spell(&self, pitch_class: i64) -> Key {
        let key = Key::from_pitch_class(pitch_class);
        if self.is_enharmonic(pitch_class) {
            key.alternate()
        } else {
            key
        }
    }

    /// The absolute pitch classes that belong to this key.
    pub fn mask(&self) -> [bool; 12] {
        let tonic = self.major_tonic();
        let mut mask = [false; 12];
        for (index, slot) in MAJOR.iter().enumerate() {
            mask[(index as i64 + tonic).rem_euclid(12) as usize] = *slot;
        }
        mask
    }

    /// The scale of this key, relative to its tonic.
    pub fn scale(&self) -> Scale {
        if self.minor {
            Scale::minor()
        } else {
            Scale::major()
        }
    }

    /// A name such as `"Eb major"`.
    pub fn name(&self) -> String {
        let mode = if self.minor { "minor" } else { "major" };
        format!("{} {}", self.tonic_key().name(), mode)
    }

    fn parse(&self, text: &str) -> Option<KeySignature> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("major") || text.eq_ignore_ascii_case("minor") {
            return Some(KeySignature::new(
                self.accidentals(),
                text.eq_ignore_ascii_case("minor"),
            ));
        }
        if !text.is_empty() && text.chars().all(|c| c == '#') {
            return Some(KeySignature::new(text.len() as i64, self.minor));
        }
        if !text.is_empty() && text.chars().all(|c| c == 'b') {
            return Some(KeySignature::new(-(text.len() as i64), self.minor));
        }
        let mut words = text.split_whitespace();
        let key = Key::from_name(words.next()?)?;
        let minor = match words.next() {
            None => false,
            Some(mode) if mode.eq_ignore_ascii_case("major") => false,
            Some(mode) if mode.eq_ignore_ascii_case("minor") => true,
            Some(_) => return None,
        };
        Some(KeySignature::with_tonic(key, minor))
    }
}

impl Operate for KeySignature {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::KeySignature(_) => Operand::KeySignature(*self),
            Operand::Int(_) => Operand::Int(self.accidentals()),
            Operand::Str(_) => Operand::Str(self.name()),
            Operand::Key(_) => Operand::Key(self.tonic_key()),
            Operand::Tonic(_) => Operand::Tonic(Tonic(self.tonic_key())),
            Operand::Scale(_) => Operand::Scale(self.scale()),
            Operand::Sharp(_) => Operand::Sharp(Sharp(self.accidentals().max(0))),
            Operand::Flat(_) => Operand::Flat(Flat((-self.accidentals()).max(0))),
            _ => selector.clone(),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::KeySignature(signature) => *self = *signature,
            Operand::Null => *self = KeySignature::default(),
            Operand::Int(accidentals) => *self = KeySignature::new(*accidentals, self.minor),
            Operand::Sharp(Sharp(sharps)) => *self = KeySignature::new(*sharps, self.minor),
            Operand::Flat(Flat(flats)) => *self = KeySignature::new(-*flats, self.minor),
            Operand::Str(text) => match self.parse(text) {
                Some(signature) => *self = signature,
                None => log::debug!("ignoring malformed key signature {:?}", text),
            },
            _ => {}
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        let fifths = match operand {
            Operand::Int(fifths) => Some(*fifths),
            _ => None,
        };
        match (op, fifths) {
            (Op::Add, Some(fifths)) => {
                KeySignature::new(self.accidentals() + fifths, self.minor).into()
            }
            (Op::Sub, Some(fifths)) => {
                KeySignature::new(self.accidentals() - fifths, self.minor).into()
            }
            _ => Operand::KeySignature(*self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scale_from_mask_rejects_bad_masks() {
        assert!(matches!(Scale::from_mask(&[true; 7]), Err(Error::InvalidScale { len: 7 })));
        assert!(matches!(Scale::from_mask(&[false; 12]), Err(Error::EmptyScale)));
        assert_eq!(Scale::major(), Scale::from_mask(&MAJOR).unwrap());
    }

    #[test]
    fn scale_names() {
        assert_eq!(Some("minor"), Scale::minor().name());
        assert_eq!(Some("dorian"), Scale::major().modulate(2).name());
        assert_eq!(Some(Scale::minor()), Scale::from_name("Aeolian"));
        assert_eq!(5, Scale::from_name("pentatonic").unwrap().degrees());
    }

    #[test]
    fn scale_transposition() {
        let major = Scale::major();
        assert_eq!(4, major.transposition(2));
        assert_eq!(12, major.transposition(7));
        assert_eq!(-1, major.transposition(-1));
        assert_eq!(3, major.walk(4, 2));
    }

    #[test]
    fn long_walks_count_whole_octaves() {
        let major = Scale::major();
        assert_eq!(12_000_004, major.transposition(7_000_002));
        assert_eq!(-13, major.transposition(-8));
        assert_eq!(-12_000_000_000_000, major.transposition(-7_000_000_000_000));
        // From C sharp, eight steps up the C major scale reach the D an octave above.
        assert_eq!(13, major.walk(1, 8));
        assert_eq!(14, Scale::from_name("major pentatonic").unwrap().transposition(6));
    }

    #[test]
    fn scale_assign_ignores_invalid_masks() {
        let scale = Scale::major() << Operand::Tuple(vec![Operand::Int(0); 12]);
        assert_eq!(Scale::major(), scale);
        let scale = scale << "mixolydian" << "no such scale";
        assert_eq!(Some("mixolydian"), scale.name());
    }

    #[test]
    fn key_signature_tonics() {
        let names: Vec<String> = (-7..=7)
            .map(|accidentals| KeySignature::new(accidentals, false).tonic_key().name().to_owned())
            .collect();
        assert_eq!(
            vec![
                "Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#"
            ],
            names
        );
        assert_eq!("D minor", KeySignature::new(-1, true).name());
        assert_eq!("D# minor", KeySignature::new(6, true).name());
    }

    #[test]
    fn key_signature_mask_is_absolute() {
        let g_major = KeySignature::new(1, false).mask();
        assert!(g_major[6]);
        assert!(!g_major[5]);
        assert_eq!(KeySignature::new(1, false).mask(), KeySignature::new(1, true).mask());
    }

    #[test]
    fn key_signature_from_text() {
        let signature = KeySignature::default() << "bbb";
        assert_eq!(-3, signature.accidentals());
        let signature = signature << "minor";
        assert_eq!("C minor", signature.name());
        let signature = signature << "F# major";
        assert_eq!(6, signature.accidentals());
        assert_eq!(KeySignature::new(7, false), KeySignature::default() << 9);
    }
}

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

//! Defaults shared by everything that builds elements.
//!
//! [`Settings`] hold the defaults that new elements are created with (key signature, octave,
//! velocity, note value and MIDI routing), together with the tempo and meter used to turn
//! musical time into milliseconds. They are plain values passed to constructors and renderers;
//! there is no global state.
//!
//! Settings can be loaded from JSON. Missing fields fall back to their defaults:
//!
//! ```
//! use operata::settings::{Settings, Tempo};
//!
//! let settings = Settings::from_json(r#"{"tempo": 90.0, "octave": 3}"#)?;
//! assert_eq!(Tempo::from_bpm(90.0), settings.tempo);
//! assert_eq!(Settings::default().velocity, settings.velocity);
//! # operata::error::Result::Ok(())
//! ```

use crate::{
    controller::Controller,
    element::Track,
    error::Result,
    operand::{assign_common, float_op, ratio_of, ratio_to_f64, Op, Operand, Operate},
    pitch::Pitch,
    scale::KeySignature,
    time::{Duration, Meter, NoteValue, Position, Step, TimeSignature},
    unit::{Channel, Device, Octave, Velocity},
};
use num_rational::Rational64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fs, path::Path, time};

/// A musical tempo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Tempo {
    beat_duration: time::Duration,
}

impl Default for Tempo {
    /// Returns a tempo of 120 BPM (beats per minute).
    fn default() -> Tempo {
        Tempo::from_bpm(120.0)
    }
}

impl Tempo {
    /// Create a tempo from a BPM (beats per minute).
    ///
    /// A `bpm` that is not a finite positive number is replaced by the default of 120.
    ///
    /// # Examples
    ///
    /// ```
    /// use operata::settings::Tempo;
    /// use std::time::Duration;
    ///
    /// assert_eq!(Tempo::from_bpm(60.0), Tempo::from(Duration::from_secs(1)));
    /// assert_eq!(Tempo::from_bpm(120.0), Tempo::from(Duration::from_millis(500)));
    /// ```
    pub fn from_bpm(bpm: f64) -> Tempo {
        let bpm = if bpm.is_finite() && bpm > 0.0 {
            bpm
        } else {
            log::warn!("invalid tempo {} BPM, using 120", bpm);
            120.0
        };
        let beat_duration = time::Duration::from_secs_f64(1.0 / bpm * 60.0);
        Tempo { beat_duration }
    }

    pub fn bpm(&self) -> f64 {
        60.0 / self.beat_duration.as_secs_f64()
    }

    pub fn beat_duration(&self) -> time::Duration {
        self.beat_duration
    }
}

impl From<time::Duration> for Tempo {
    /// Create a tempo from a beat duration.
    fn from(beat_duration: time::Duration) -> Tempo {
        Tempo { beat_duration }
    }
}

// Tempos are written as BPM so that configuration files stay readable.
impl Serialize for Tempo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.bpm())
    }
}

impl<'de> Deserialize<'de> for Tempo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Tempo, D::Error> {
        f64::deserialize(deserializer).map(Tempo::from_bpm)
    }
}

impl Operate for Tempo {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Tempo(_) => Operand::Tempo(*self),
            Operand::Int(_) => Operand::Int(self.bpm().round() as i64),
            Operand::Float(_) => Operand::Float(self.bpm()),
            Operand::Str(_) => Operand::Str(format!("{} BPM", self.bpm())),
            _ => selector.clone(),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::Tempo(tempo) => *self = *tempo,
            Operand::Null => *self = Tempo::default(),
            Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => {
                if let Some(bpm) = source.as_f64() {
                    *self = Tempo::from_bpm(bpm);
                }
            }
            _ => {}
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        let bpm = match operand {
            Operand::Tempo(tempo) => Some(tempo.bpm()),
            Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => operand.as_f64(),
            _ => None,
        };
        match bpm.and_then(|rhs| float_op(self.bpm(), op, rhs)) {
            Some(bpm) if bpm > 0.0 => Operand::Tempo(Tempo::from_bpm(bpm)),
            _ => Operand::Tempo(*self),
        }
    }

    fn scalar(&self) -> Option<f64> {
        Some(self.bpm())
    }
}

/// Defaults and timing context for building and rendering elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tempo: Tempo,
    pub time_signature: TimeSignature,
    /// The length of one step in whole notes.
    pub quantization: Rational64,
    pub key_signature: KeySignature,
    /// The default note value of new elements, in whole notes.
    pub duration: Rational64,
    pub octave: Octave,
    pub velocity: Velocity,
    pub controller: Controller,
    pub channel: Channel,
    pub device: Device,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tempo: Tempo::default(),
            time_signature: TimeSignature::default(),
            quantization: Rational64::new(1, 16),
            key_signature: KeySignature::default(),
            duration: Rational64::new(1, 4),
            octave: Octave::default(),
            velocity: Velocity::default(),
            controller: Controller::default(),
            channel: Channel::default(),
            device: Device::default(),
        }
    }
}

impl Settings {
    /// Parses settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid settings document.
    pub fn from_json(json: &str) -> Result<Settings> {
        let settings = serde_json::from_str(json)?;
        log::debug!("loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Reads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid settings document.
    pub fn load(path: impl AsRef<Path>) -> Result<Settings> {
        Settings::from_json(&fs::read_to_string(path)?)
    }

    pub fn meter(&self) -> Meter {
        Meter::new(self.time_signature, self.quantization)
    }

    /// The start of the piece.
    pub fn position(&self) -> Position {
        Position::start(self.meter())
    }

    /// The default note value of new elements.
    pub fn note_duration(&self) -> Duration {
        Duration::new(self.duration, self.meter())
    }

    /// The tonic of the key signature in the default octave.
    pub fn pitch(&self) -> Pitch {
        Pitch::new(self.key_signature, self.octave.0)
    }

    pub fn track(&self) -> Track {
        Track {
            channel: self.channel,
            device: self.device.clone(),
            ..Track::default()
        }
    }

    /// Converts a length in whole notes to milliseconds at this tempo.
    pub fn milliseconds(&self, whole_notes: Rational64) -> f64 {
        let beats = whole_notes / self.time_signature.beat_note_value();
        ratio_to_f64(&beats) * self.tempo.beat_duration().as_secs_f64() * 1000.0
    }

    /// Converts a length in whole notes to beats.
    pub fn beats(&self, whole_notes: Rational64) -> f64 {
        ratio_to_f64(&(whole_notes / self.time_signature.beat_note_value()))
    }
}

impl Operate for Settings {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Settings(_) => Operand::Settings(self.clone()),
            Operand::Tempo(_) => Operand::Tempo(self.tempo),
            Operand::TimeSignature(_) => Operand::TimeSignature(self.time_signature),
            Operand::Step(_) => Operand::Step(Step(self.quantization)),
            Operand::KeySignature(_) => Operand::KeySignature(self.key_signature),
            Operand::Duration(_) => Operand::Duration(self.note_duration()),
            Operand::NoteValue(_) => Operand::NoteValue(NoteValue(self.duration)),
            Operand::Octave(_) => Operand::Octave(self.octave),
            Operand::Velocity(_) => Operand::Velocity(self.velocity),
            Operand::Controller(_) => Operand::Controller(self.controller),
            Operand::Channel(_) => Operand::Channel(self.channel),
            Operand::Device(_) => Operand::Device(self.device.clone()),
            Operand::Pitch(_) => Operand::Pitch(self.pitch()),
            _ => selector.clone(),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::Settings(settings) => *self = settings.clone(),
            Operand::Null => *self = Settings::default(),
            Operand::Tempo(tempo) => self.tempo = *tempo,
            Operand::TimeSignature(signature) => self.time_signature = *signature,
            Operand::Step(Step(quantization)) => {
                self.quantization = Meter::new(self.time_signature, *quantization).quantization
            }
            Operand::KeySignature(signature) => self.key_signature = *signature,
            Operand::Duration(duration) => self.duration = duration.whole_notes(),
            Operand::NoteValue(NoteValue(value)) => self.duration = *value,
            Operand::Octave(octave) => self.octave = *octave,
            Operand::Velocity(velocity) => self.velocity = *velocity,
            Operand::Controller(controller) => self.controller = *controller,
            Operand::Channel(channel) => self.channel = *channel,
            Operand::Device(device) => self.device = device.clone(),
            Operand::Fraction(_) => {
                if let Some(value) = ratio_of(source) {
                    self.duration = value;
                }
            }
            _ => {}
        }
    }

    fn combine(&self, _: Op, _: &Operand) -> Operand {
        Operand::Settings(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn milliseconds_follow_tempo_and_meter() {
        let settings = Settings::default();
        assert_eq!(500.0, settings.milliseconds(Rational64::new(1, 4)));
        assert_eq!(2000.0, settings.milliseconds(Rational64::from_integer(1)));

        let settings = settings << Tempo::from_bpm(60.0) << TimeSignature::new(6, 8);
        assert_eq!(1000.0, settings.milliseconds(Rational64::new(1, 8)));
        assert_eq!(3.0, settings.beats(Rational64::new(3, 8)));
    }

    #[test]
    fn invalid_tempo_falls_back() {
        assert_eq!(Tempo::default(), Tempo::from_bpm(0.0));
        assert_eq!(Tempo::default(), Tempo::from_bpm(f64::NAN));
        assert_eq!(Operand::Tempo(Tempo::from_bpm(90.0)), &Tempo::from_bpm(90.0) / 0);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = Settings::default() << KeySignature::new(-2, true) << Octave(3);
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(settings, Settings::from_json(&json).unwrap());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Settings::from_json("{\"tempo\": \"fast\"}").is_err());
    }

    #[test]
    fn settings_build_defaults() {
        let settings = Settings::default() << KeySignature::new(2, false);
        assert_eq!(62, settings.pitch().pitch_int());
        assert_eq!(Rational64::new(1, 4), settings.note_duration().whole_notes());
    }
}

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

//! Sounding elements: notes, chords and scales, plus the rest.

use super::{
    combine_element,
    midi::{midi_128, Emitter, EventKind, MidiEvent, PlaylistEvent, NOTE_OFF, NOTE_ON},
    Placement, Playable,
};
use crate::{
    operand::{assign_common, combine_field, ratio_from_f64, Op, Operand, Operate},
    pitch::Pitch,
    scale::Scale,
    settings::Settings,
    time::{Duration, Position},
    unit::{Gate, Inversion, Octave, Semitone, Size, Transposition, Velocity},
};
use num_rational::Rational64;
use serde::{Deserialize, Serialize};

/// A single pitched note.
///
/// Plain numbers assigned to a note set its MIDI pitch, and plain numbers added to it transpose
/// it by semitones. Fractions set its duration in whole notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub placement: Placement,
    pub pitch: Pitch,
    pub velocity: Velocity,
    pub gate: Gate,
    /// A tied note sounds for its whole duration, ignoring the gate.
    pub tied: bool,
}

impl Note {
    pub fn with_settings(settings: &Settings) -> Note {
        Note {
            placement: Placement::new(settings),
            pitch: settings.pitch(),
            velocity: settings.velocity,
            gate: Gate::default(),
            tied: false,
        }
    }

    /// How long the note actually sounds, in whole notes.
    pub fn sounding_length(&self) -> Rational64 {
        let length = self.placement.duration.whole_notes();
        if self.tied {
            length
        } else {
            length * ratio_from_f64(self.gate.0)
        }
    }

    fn with_pitch(&self, pitch: &Operand) -> Note {
        let mut note = self.clone();
        note.pitch.assign(pitch);
        note
    }
}

impl Default for Note {
    fn default() -> Self {
        Note::with_settings(&Settings::default())
    }
}

impl Operate for Note {
    fn extract(&self, selector: &Operand) -> Operand {
        if let Some(field) = self.placement.extract(selector) {
            return field;
        }
        match selector {
            Operand::Note(_) => Operand::Note(self.clone()),
            Operand::Velocity(_) => Operand::Velocity(self.velocity),
            Operand::Gate(_) => Operand::Gate(self.gate),
            Operand::Fraction(_) => Operand::Fraction(self.placement.duration.whole_notes()),
            _ => self.pitch.extract(selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) || self.placement.assign(source) {
            return;
        }
        match source {
            Operand::Note(note) => *self = note.clone(),
            Operand::Velocity(velocity) => self.velocity = *velocity,
            Operand::Gate(gate) => self.gate = *gate,
            Operand::Fraction(_) => self.placement.duration.assign(source),
            _ => self.pitch.assign(source),
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        if let Some(result) = combine_element(self, op, operand) {
            return result;
        }
        match operand {
            Operand::Int(_)
            | Operand::Float(_)
            | Operand::Semitone(_)
            | Operand::Degree(_)
            | Operand::Transposition(_)
            | Operand::Octave(_) => self.with_pitch(&self.pitch.combine(op, operand)).into(),
            _ => combine_field(self, op, operand),
        }
    }

    fn scalar(&self) -> Option<f64> {
        self.pitch.scalar()
    }
}

impl Playable for Note {
    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let key = midi_128(self.pitch.pitch_int());
        let velocity = midi_128(self.velocity.0);
        vec![
            emitter.message(Rational64::from_integer(0), NOTE_ON, &[key, velocity]),
            emitter.message(self.sounding_length(), NOTE_OFF, &[key, 0]),
        ]
    }

    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let mut event = emitter.event(EventKind::Note, self.sounding_length());
        event.pitch = Some(midi_128(self.pitch.pitch_int()));
        event.velocity = Some(midi_128(self.velocity.0));
        vec![event]
    }
}

/// A note and a one-measure duration, for chords and scales.
fn measure_note(settings: &Settings) -> Note {
    let mut note = Note::with_settings(settings);
    note.placement.duration = Duration::new(settings.meter().measure_length(), settings.meter());
    note
}

pub(super) fn render(
    notes: &[Note],
    settings: &Settings,
    offset: &Position,
) -> Vec<PlaylistEvent> {
    notes
        .iter()
        .flat_map(|note| note.playlist(settings, offset))
        .collect()
}

pub(super) fn render_midi(
    notes: &[Note],
    settings: &Settings,
    offset: &Position,
) -> Vec<MidiEvent> {
    notes
        .iter()
        .flat_map(|note| note.midilist(settings, offset))
        .collect()
}

/// A chord of stacked thirds built on a root note.
///
/// Without a scale of its own the thirds are taken from the key signature, so the chord on the
/// second degree of C major is D minor.
///
/// ```
/// use operata::element::Chord;
/// use operata::unit::Inversion;
///
/// let pitches = |chord: &Chord| -> Vec<i64> {
///     chord.notes().iter().map(|note| note.pitch.pitch_int()).collect()
/// };
///
/// let chord = Chord::default();
/// assert_eq!(vec![60, 64, 67], pitches(&chord));
/// assert_eq!(vec![72, 64, 67], pitches(&(chord << Inversion(1))));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub note: Note,
    pub size: Size,
    pub inversion: Inversion,
    pub scale: Option<Scale>,
}

impl Chord {
    pub fn with_settings(settings: &Settings) -> Chord {
        Chord {
            note: measure_note(settings),
            size: Size::default(),
            inversion: Inversion::default(),
            scale: None,
        }
    }

    /// The notes of the chord, lowest first before inversion.
    pub fn notes(&self) -> Vec<Note> {
        let degrees = match self.scale {
            Some(scale) => scale.degrees(),
            None => self.note.pitch.key_signature().scale().degrees(),
        } as i64;
        let limit = if degrees % 2 == 0 { degrees / 2 } else { degrees };
        let size = self.size.0.max(0).min(limit);

        let mut notes: Vec<Note> = (0..size)
            .map(|index| {
                let interval = match self.scale {
                    Some(scale) => Operand::Semitone(Semitone(scale.transposition(2 * index))),
                    None => Operand::Transposition(Transposition(2 * index)),
                };
                self.note.with_pitch(&self.note.pitch.combine(Op::Add, &interval))
            })
            .collect();

        let inversion = self.inversion.0.max(0).min(size - 1).max(0) as usize;
        if inversion > 0 {
            let bass = notes[inversion].pitch.pitch_int();
            let octave = Operand::Octave(Octave(1));
            for note in notes.iter_mut().take(inversion) {
                while note.pitch.pitch_int() < bass && note.pitch.pitch_int() < 128 {
                    *note = note.with_pitch(&note.pitch.combine(Op::Add, &octave));
                }
            }
        }
        notes
    }
}

impl Default for Chord {
    fn default() -> Self {
        Chord::with_settings(&Settings::default())
    }
}

impl Operate for Chord {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Chord(_) => Operand::Chord(self.clone()),
            Operand::Note(_) => Operand::Note(self.note.clone()),
            Operand::Size(_) => Operand::Size(self.size),
            Operand::Inversion(_) => Operand::Inversion(self.inversion),
            Operand::Scale(_) => match self.scale {
                Some(scale) => Operand::Scale(scale),
                None => self.note.extract(selector),
            },
            _ => self.note.extract(selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::Chord(chord) => *self = chord.clone(),
            Operand::Note(note) => self.note = note.clone(),
            Operand::Size(size) => self.size = *size,
            Operand::Inversion(inversion) => self.inversion = *inversion,
            Operand::Scale(scale) => self.scale = Some(*scale),
            Operand::Mode(_) => {
                let fallback = self.note.pitch.key_signature().scale();
                self.scale.get_or_insert(fallback).assign(source);
            }
            Operand::Null => {
                self.note.assign(source);
                self.size = Size::default();
                self.inversion = Inversion::default();
                self.scale = None;
            }
            _ => self.note.assign(source),
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        if let Some(result) = combine_element(self, op, operand) {
            return result;
        }
        match operand {
            Operand::Size(_) | Operand::Inversion(_) => combine_field(self, op, operand),
            _ => match self.note.combine(op, operand) {
                Operand::Note(note) => Chord {
                    note,
                    ..self.clone()
                }
                .into(),
                other => other,
            },
        }
    }

    fn scalar(&self) -> Option<f64> {
        self.note.scalar()
    }
}

impl Playable for Chord {
    fn placement(&self) -> &Placement {
        &self.note.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.note.placement
    }

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        render(&self.notes(), settings, offset)
    }

    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        render_midi(&self.notes(), settings, offset)
    }
}

/// Every note of a scale, sounding together from a root note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyScale {
    pub note: Note,
    /// The scale to play. Defaults to the scale of the key signature.
    pub scale: Option<Scale>,
}

impl KeyScale {
    pub fn with_settings(settings: &Settings) -> KeyScale {
        KeyScale {
            note: measure_note(settings),
            scale: None,
        }
    }

    pub fn scale(&self) -> Scale {
        self.scale
            .unwrap_or_else(|| self.note.pitch.key_signature().scale())
    }

    pub fn notes(&self) -> Vec<Note> {
        let steps = self.scale().degrees() as i64;
        (0..steps)
            .map(|step| {
                let interval = match self.scale {
                    Some(scale) => Operand::Semitone(Semitone(scale.transposition(step))),
                    None => Operand::Transposition(Transposition(step)),
                };
                self.note.with_pitch(&self.note.pitch.combine(Op::Add, &interval))
            })
            .collect()
    }
}

impl Default for KeyScale {
    fn default() -> Self {
        KeyScale::with_settings(&Settings::default())
    }
}

impl Operate for KeyScale {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::KeyScale(_) => Operand::KeyScale(self.clone()),
            Operand::Note(_) => Operand::Note(self.note.clone()),
            Operand::Scale(_) | Operand::Str(_) | Operand::Tuple(_) => {
                self.scale().extract(selector)
            }
            _ => self.note.extract(selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::KeyScale(scale) => *self = scale.clone(),
            Operand::Note(note) => self.note = note.clone(),
            Operand::Scale(scale) => self.scale = Some(*scale),
            Operand::Mode(_) => {
                let mut scale = self.scale();
                scale.assign(source);
                self.scale = Some(scale);
            }
            Operand::Str(name) if Scale::from_name(name).is_some() => {
                self.scale = Scale::from_name(name)
            }
            Operand::Null => {
                self.note.assign(source);
                self.scale = None;
            }
            _ => self.note.assign(source),
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        if let Some(result) = combine_element(self, op, operand) {
            return result;
        }
        match self.note.combine(op, operand) {
            Operand::Note(note) => KeyScale {
                note,
                scale: self.scale,
            }
            .into(),
            other => other,
        }
    }

    fn scalar(&self) -> Option<f64> {
        self.note.scalar()
    }
}

impl Playable for KeyScale {
    fn placement(&self) -> &Placement {
        &self.note.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.note.placement
    }

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        render(&self.notes(), settings, offset)
    }

    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        render_midi(&self.notes(), settings, offset)
    }
}

/// Silence that still takes up time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rest {
    pub placement: Placement,
}

impl Rest {
    pub fn with_settings(settings: &Settings) -> Rest {
        Rest {
            placement: Placement::new(settings),
        }
    }
}

impl Default for Rest {
    fn default() -> Self {
        Rest::with_settings(&Settings::default())
    }
}

impl Operate for Rest {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Rest(_) => Operand::Rest(self.clone()),
            Operand::Fraction(_) => Operand::Fraction(self.placement.duration.whole_notes()),
            _ => self
                .placement
                .extract(selector)
                .unwrap_or_else(|| selector.clone()),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) || self.placement.assign(source) {
            return;
        }
        match source {
            Operand::Rest(rest) => *self = rest.clone(),
            Operand::Fraction(_) => self.placement.duration.assign(source),
            _ => {}
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        combine_element(self, op, operand).unwrap_or_else(|| combine_field(self, op, operand))
    }
}

impl Playable for Rest {
    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn playlist(&self, _: &Settings, _: &Position) -> Vec<PlaylistEvent> {
        Vec::new()
    }

    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        vec![emitter.event(EventKind::Rest, self.placement.duration.whole_notes())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clip::Clip,
        scale::KeySignature,
        time::Measure,
        unit::{Channel, Degree, Key, Pressure},
    };
    use pretty_assertions::assert_eq;
    use std::convert::TryFrom;

    fn pitches(notes: &[Note]) -> Vec<i64> {
        notes.iter().map(|note| note.pitch.pitch_int()).collect()
    }

    #[test]
    fn numbers_set_and_shift_pitch() {
        let note = Note::default() << 67;
        assert_eq!(67, note.pitch.pitch_int());
        assert_eq!(Operand::Key(Key(7)), &note % Key::default());
        let higher = Note::try_from(&note + 2).unwrap();
        assert_eq!(69, higher.pitch.pitch_int());
        let lower = Note::try_from(&note - Octave(1)).unwrap();
        assert_eq!(55, lower.pitch.pitch_int());
    }

    #[test]
    fn fields_by_type() {
        let note = Note::default() << Velocity(80) << Gate(0.5) << Degree(5.0);
        assert_eq!(Operand::Velocity(Velocity(80)), &note % Velocity::default());
        assert_eq!(Operand::Gate(Gate(0.5)), &note % Gate::default());
        assert_eq!(Operand::Int(67), &note % 0);
        let louder = Note::try_from(&note + Velocity(10)).unwrap();
        assert_eq!(Velocity(90), louder.velocity);
    }

    #[test]
    fn unsupported_source_leaves_note_alone() {
        let note = Note::default();
        assert_eq!(note, note.clone() << Size(4));
        assert_eq!(note, note.clone() << Pressure(3));
    }

    #[test]
    fn note_playlist() {
        let settings = Settings::default();
        let note = Note::default() << Gate(0.5) << Channel(2);
        let playlist = note.playlist(&settings, &Position::default());
        assert_eq!(2, playlist.len());
        assert_eq!(0.0, playlist[0].time_ms);
        assert_eq!(0x91, playlist[0].midi_message.status_byte);
        assert_eq!(Some(60), playlist[0].midi_message.data_byte_1);
        assert_eq!(Some(100), playlist[0].midi_message.data_byte_2);
        assert_eq!(250.0, playlist[1].time_ms);
        assert_eq!(0x81, playlist[1].midi_message.status_byte);
        assert_eq!(Some(0), playlist[1].midi_message.data_byte_2);
    }

    #[test]
    fn out_of_range_pitch_is_clamped() {
        let note = Note::default() << 200;
        let playlist = note.playlist(&Settings::default(), &Position::default());
        assert_eq!(Some(127), playlist[0].midi_message.data_byte_1);
    }

    #[test]
    fn tied_notes_ignore_gate() {
        let mut note = Note::default() << Gate(0.5);
        note.tied = true;
        assert_eq!(Rational64::new(1, 4), note.sounding_length());
    }

    #[test]
    fn note_midilist() {
        let settings = Settings::default();
        let note = Note::default() << Measure(Rational64::from_integer(1)) << Gate(0.5);
        let midilist = note.midilist(&settings, &Position::default());
        assert_eq!(1, midilist.len());
        assert_eq!(EventKind::Note, midilist[0].event);
        assert_eq!(4.0, midilist[0].time);
        assert_eq!(0.5, midilist[0].duration);
        assert_eq!(Some(60), midilist[0].pitch);
        assert_eq!(0, midilist[0].track);
        assert_eq!(120.0, midilist[0].tempo);
    }

    #[test]
    fn chords_follow_the_key() {
        let chord = Chord::default() << Degree(2.0);
        assert_eq!(vec![62, 65, 69], pitches(&chord.notes()));
        let seventh = Chord::default() << Size(4);
        assert_eq!(vec![60, 64, 67, 71], pitches(&seventh.notes()));
        let minor = Chord::default() << Scale::minor();
        assert_eq!(vec![60, 63, 67], pitches(&minor.notes()));
    }

    #[test]
    fn chord_size_is_limited_by_scale() {
        let chord = Chord::default() << Size(12);
        assert_eq!(7, chord.notes().len());
        assert!(Chord::default().notes().len() <= 7);
        assert_eq!(0, (Chord::default() << Size(0)).notes().len());
    }

    #[test]
    fn chord_lasts_a_measure() {
        let chord = Chord::default();
        assert_eq!(Rational64::from_integer(1), chord.note.placement.duration.whole_notes());
        assert_eq!(6, chord.playlist(&Settings::default(), &Position::default()).len());
    }

    #[test]
    fn key_scale_plays_every_degree() {
        let scale = KeyScale::with_settings(&(Settings::default() << KeySignature::new(1, false)));
        assert_eq!(
            vec![67, 69, 71, 72, 74, 76, 78],
            pitches(&scale.notes())
        );
        let pentatonic = KeyScale::default() << "pentatonic";
        assert_eq!(5, pentatonic.notes().len());
        assert_eq!(Operand::Str("major pentatonic".to_owned()), &pentatonic % "");
    }

    #[test]
    fn adding_elements_builds_a_clip() {
        let clip = Clip::try_from(&Note::default() + Rest::default()).unwrap();
        assert_eq!(2, clip.len());
        let rest = Rest::default() << Measure(Rational64::from_integer(1));
        assert_eq!(
            Operand::Measure(Measure(Rational64::from_integer(1))),
            &rest % Measure::default()
        );
    }
}

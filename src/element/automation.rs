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

//! Elements that change how a channel sounds rather than playing notes.
//!
//! Automation elements are instantaneous: their duration only matters when laying them out in a
//! clip. [`Clock`] and [`Panic`] talk to the receiving device itself and only exist for
//! playback, so their midilists are empty.

use super::{
    combine_element,
    midi::{
        midi_128, Emitter, EventKind, MidiEvent, PlaylistEvent, CHANNEL_AFTERTOUCH,
        CONTROL_CHANGE, NOTE_OFF, NOTE_ON, PITCH_BEND, POLY_AFTERTOUCH, PROGRAM_CHANGE, START,
        STOP, TIMING_CLOCK,
    },
    Placement, Playable,
};
use crate::{
    controller::Controller,
    operand::{assign_common, combine_field, ratio_of, Op, Operand, Operate},
    pitch::Pitch,
    settings::Settings,
    time::{Duration, Measure, Position},
    unit::{Bend, Pressure, Program},
};
use num_rational::Rational64;
use serde::{Deserialize, Serialize};

fn is_number(operand: &Operand) -> bool {
    matches!(
        operand,
        Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_)
    )
}

fn is_pitch_field(operand: &Operand) -> bool {
    matches!(
        operand,
        Operand::Pitch(_)
            | Operand::Key(_)
            | Operand::Tonic(_)
            | Operand::Octave(_)
            | Operand::Degree(_)
            | Operand::Transposition(_)
            | Operand::KeySignature(_)
            | Operand::Scale(_)
            | Operand::Sharp(_)
            | Operand::Flat(_)
            | Operand::Natural(_)
            | Operand::Semitone(_)
            | Operand::Str(_)
    )
}

fn start() -> Rational64 {
    Rational64::from_integer(0)
}

/// Implements [`Playable`]'s placement accessors for a type with a `placement` field.
macro_rules! placed {
    () => {
        fn placement(&self) -> &Placement {
            &self.placement
        }

        fn placement_mut(&mut self) -> &mut Placement {
            &mut self.placement
        }
    };
}

/// Sends a value to a continuous controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlChange {
    pub placement: Placement,
    pub controller: Controller,
}

impl ControlChange {
    pub fn with_settings(settings: &Settings) -> ControlChange {
        ControlChange {
            placement: Placement::new(settings),
            controller: settings.controller,
        }
    }
}

impl Default for ControlChange {
    fn default() -> Self {
        ControlChange::with_settings(&Settings::default())
    }
}

impl Operate for ControlChange {
    fn extract(&self, selector: &Operand) -> Operand {
        if let Some(field) = self.placement.extract(selector) {
            return field;
        }
        match selector {
            Operand::ControlChange(_) => Operand::ControlChange(self.clone()),
            _ => self.controller.extract(selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) || self.placement.assign(source) {
            return;
        }
        match source {
            Operand::ControlChange(change) => *self = change.clone(),
            Operand::Controller(_)
            | Operand::Number(_)
            | Operand::Value(_)
            | Operand::Str(_)
            | Operand::Null => self.controller.assign(source),
            _ if is_number(source) => self.controller.assign(source),
            _ => {}
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        if let Some(result) = combine_element(self, op, operand) {
            return result;
        }
        match operand {
            Operand::Number(_) | Operand::Value(_) => combine_field(self, op, operand),
            _ if is_number(operand) => match self.controller.combine(op, operand) {
                Operand::Controller(controller) => ControlChange {
                    controller,
                    ..self.clone()
                }
                .into(),
                other => other,
            },
            _ => combine_field(self, op, operand),
        }
    }
}

impl Playable for ControlChange {
    placed!();

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let number = midi_128(self.controller.number.0);
        let value = midi_128(self.controller.value.0);
        vec![emitter.message(start(), CONTROL_CHANGE, &[number, value])]
    }

    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let mut event = emitter.event(
            EventKind::ControllerEvent,
            self.placement.duration.whole_notes(),
        );
        event.number = Some(midi_128(self.controller.number.0));
        event.value = Some(i64::from(midi_128(self.controller.value.0)));
        vec![event]
    }
}

/// Bends every note on the channel, from -8192 to 8191 with 0 at rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchBend {
    pub placement: Placement,
    pub bend: Bend,
}

impl PitchBend {
    pub fn with_settings(settings: &Settings) -> PitchBend {
        PitchBend {
            placement: Placement::new(settings),
            bend: Bend::default(),
        }
    }

    /// The bend as the least and most significant 7 bits of an unsigned 14-bit value.
    pub fn data_bytes(&self) -> [u8; 2] {
        let unsigned = (self.bend.0 + 8192).max(0).min(16383);
        [(unsigned & 0x7F) as u8, (unsigned >> 7) as u8]
    }
}

impl Default for PitchBend {
    fn default() -> Self {
        PitchBend::with_settings(&Settings::default())
    }
}

/// An automation element whose only field is a single integer unit.
macro_rules! single_value {
    ($name:ident, $field:ident, $unit:ident) => {
        impl Operate for $name {
            fn extract(&self, selector: &Operand) -> Operand {
                if let Some(field) = self.placement.extract(selector) {
                    return field;
                }
                match selector {
                    Operand::$name(_) => Operand::$name(self.clone()),
                    _ => self.$field.extract(selector),
                }
            }

            fn assign(&mut self, source: &Operand) {
                if assign_common(self, source) || self.placement.assign(source) {
                    return;
                }
                match source {
                    Operand::$name(element) => *self = element.clone(),
                    Operand::$unit(_) | Operand::Null => self.$field.assign(source),
                    _ if is_number(source) => self.$field.assign(source),
                    _ => {}
                }
            }

            fn combine(&self, op: Op, operand: &Operand) -> Operand {
                if let Some(result) = combine_element(self, op, operand) {
                    return result;
                }
                match operand {
                    Operand::$unit(_) => combine_field(self, op, operand),
                    _ if is_number(operand) => {
                        let mut element = self.clone();
                        element.$field.assign(&self.$field.combine(op, operand));
                        element.into()
                    }
                    _ => combine_field(self, op, operand),
                }
            }

            fn scalar(&self) -> Option<f64> {
                self.$field.scalar()
            }
        }
    };
}

single_value!(PitchBend, bend, Bend);

impl Playable for PitchBend {
    placed!();

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        vec![emitter.message(start(), PITCH_BEND, &self.data_bytes())]
    }

    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let mut event = emitter.event(
            EventKind::PitchWheelEvent,
            self.placement.duration.whole_notes(),
        );
        event.value = Some(self.bend.0.max(-8192).min(8191));
        vec![event]
    }
}

/// Channel pressure, applied to every sounding note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aftertouch {
    pub placement: Placement,
    pub pressure: Pressure,
}

impl Aftertouch {
    pub fn with_settings(settings: &Settings) -> Aftertouch {
        Aftertouch {
            placement: Placement::new(settings),
            pressure: Pressure::default(),
        }
    }
}

impl Default for Aftertouch {
    fn default() -> Self {
        Aftertouch::with_settings(&Settings::default())
    }
}

single_value!(Aftertouch, pressure, Pressure);

impl Playable for Aftertouch {
    placed!();

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let pressure = midi_128(self.pressure.0);
        vec![emitter.message(start(), CHANNEL_AFTERTOUCH, &[pressure])]
    }

    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let mut event = emitter.event(
            EventKind::ChannelPressure,
            self.placement.duration.whole_notes(),
        );
        event.pressure = Some(midi_128(self.pressure.0));
        vec![event]
    }
}

/// Pressure on a single key.
///
/// Plain numbers set the pressure. The key is set with pitch fields such as [`Key`] or
/// [`Degree`].
///
/// [`Key`]: crate::unit::Key
/// [`Degree`]: crate::unit::Degree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyAftertouch {
    pub placement: Placement,
    pub pitch: Pitch,
    pub pressure: Pressure,
}

impl PolyAftertouch {
    pub fn with_settings(settings: &Settings) -> PolyAftertouch {
        PolyAftertouch {
            placement: Placement::new(settings),
            pitch: settings.pitch(),
            pressure: Pressure::default(),
        }
    }
}

impl Default for PolyAftertouch {
    fn default() -> Self {
        PolyAftertouch::with_settings(&Settings::default())
    }
}

impl Operate for PolyAftertouch {
    fn extract(&self, selector: &Operand) -> Operand {
        if let Some(field) = self.placement.extract(selector) {
            return field;
        }
        match selector {
            Operand::PolyAftertouch(_) => Operand::PolyAftertouch(self.clone()),
            _ if is_pitch_field(selector) => self.pitch.extract(selector),
            _ => self.pressure.extract(selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) || self.placement.assign(source) {
            return;
        }
        match source {
            Operand::PolyAftertouch(element) => *self = element.clone(),
            Operand::Pressure(_) => self.pressure.assign(source),
            Operand::Null => {
                self.pitch.assign(source);
                self.pressure.assign(source);
            }
            _ if is_number(source) => self.pressure.assign(source),
            _ if is_pitch_field(source) => self.pitch.assign(source),
            _ => {}
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        if let Some(result) = combine_element(self, op, operand) {
            return result;
        }
        let mut element = self.clone();
        match operand {
            Operand::Semitone(_)
            | Operand::Degree(_)
            | Operand::Transposition(_)
            | Operand::Octave(_) => element.pitch.assign(&self.pitch.combine(op, operand)),
            _ if is_number(operand) => {
                element.pressure.assign(&self.pressure.combine(op, operand))
            }
            _ => return combine_field(self, op, operand),
        }
        element.into()
    }
}

impl Playable for PolyAftertouch {
    placed!();

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let key = midi_128(self.pitch.pitch_int());
        let pressure = midi_128(self.pressure.0);
        vec![emitter.message(start(), POLY_AFTERTOUCH, &[key, pressure])]
    }

    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let mut event = emitter.event(
            EventKind::PolyphonicPressure,
            self.placement.duration.whole_notes(),
        );
        event.pitch = Some(midi_128(self.pitch.pitch_int()));
        event.pressure = Some(midi_128(self.pressure.0));
        vec![event]
    }
}

/// Selects an instrument, numbered from 1 like on most synthesizers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramChange {
    pub placement: Placement,
    pub program: Program,
}

impl ProgramChange {
    pub fn with_settings(settings: &Settings) -> ProgramChange {
        ProgramChange {
            placement: Placement::new(settings),
            program: Program::default(),
        }
    }
}

impl Default for ProgramChange {
    fn default() -> Self {
        ProgramChange::with_settings(&Settings::default())
    }
}

single_value!(ProgramChange, program, Program);

impl Playable for ProgramChange {
    placed!();

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let program = midi_128(self.program.0 - 1);
        vec![emitter.message(start(), PROGRAM_CHANGE, &[program])]
    }

    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let mut event = emitter.event(
            EventKind::ProgramChange,
            self.placement.duration.whole_notes(),
        );
        event.program = Some(midi_128(self.program.0 - 1));
        vec![event]
    }
}

/// MIDI clock for slaved devices: a start message, timing clocks and a stop message.
///
/// Plain numbers set the duration in measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    pub placement: Placement,
    pub pulses_per_quarter_note: u32,
}

impl Clock {
    pub fn with_settings(settings: &Settings) -> Clock {
        let mut placement = Placement::new(settings);
        placement.duration = Duration::new(settings.meter().measure_length(), settings.meter());
        Clock {
            placement,
            pulses_per_quarter_note: 24,
        }
    }

    /// The number of clock intervals over the whole duration.
    pub fn pulses(&self) -> i64 {
        let per_whole_note = Rational64::from_integer(4 * i64::from(self.pulses_per_quarter_note));
        (per_whole_note * self.placement.duration.whole_notes())
            .round()
            .to_integer()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::with_settings(&Settings::default())
    }
}

impl Operate for Clock {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Clock(_) => Operand::Clock(self.clone()),
            Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => {
                let duration = &self.placement.duration;
                Measure(duration.whole_notes() / duration.meter.measure_length()).extract(selector)
            }
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
            Operand::Clock(clock) => *self = clock.clone(),
            _ => {
                if let Some(measures) = ratio_of(source) {
                    let measures = Operand::Measure(Measure(measures));
                    self.placement.duration.assign(&measures);
                }
            }
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        combine_element(self, op, operand).unwrap_or_else(|| combine_field(self, op, operand))
    }
}

impl Playable for Clock {
    placed!();

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let duration = self.placement.duration.whole_notes();
        let pulses = self.pulses();
        let mut playlist = vec![emitter.system(start(), START, &[])];
        for pulse in 1..pulses {
            let at = duration * Rational64::new(pulse, pulses);
            playlist.push(emitter.system(at, TIMING_CLOCK, &[]));
        }
        playlist.push(emitter.system(duration, STOP, &[]));
        playlist
    }

    fn midilist(&self, _: &Settings, _: &Position) -> Vec<MidiEvent> {
        Vec::new()
    }
}

/// Silences a channel: resets its controllers and bend and releases every key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panic {
    pub placement: Placement,
}

impl Panic {
    pub fn with_settings(settings: &Settings) -> Panic {
        Panic {
            placement: Placement::new(settings),
        }
    }
}

impl Default for Panic {
    fn default() -> Self {
        Panic::with_settings(&Settings::default())
    }
}

impl Operate for Panic {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Panic(_) => Operand::Panic(self.clone()),
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
        if let Operand::Panic(panic) = source {
            *self = panic.clone();
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        combine_element(self, op, operand).unwrap_or_else(|| combine_field(self, op, operand))
    }
}

impl Playable for Panic {
    placed!();

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        let emitter = Emitter::new(settings, &self.placement, offset.whole_notes());
        let control = |number: u8, value: u8| {
            emitter.message(start(), CONTROL_CHANGE, &[number, value])
        };
        // All notes off, bend, sustain, modulation, then reset all controllers.
        let mut playlist = vec![
            control(123, 0),
            emitter.message(start(), PITCH_BEND, &[0, 64]),
            control(64, 0),
            control(1, 0),
            control(121, 0),
        ];
        for key in 0..128 {
            playlist.push(emitter.message(start(), NOTE_ON, &[key, 0]));
            playlist.push(emitter.message(start(), NOTE_OFF, &[key, 0]));
        }
        playlist.push(control(7, 100));
        playlist.push(control(11, 127));
        playlist
    }

    fn midilist(&self, _: &Settings, _: &Position) -> Vec<MidiEvent> {
        Vec::new()
    }
}

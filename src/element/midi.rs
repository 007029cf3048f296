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

//! The records that elements render to.
//!
//! A [`PlaylistEvent`] is a raw MIDI message stamped with a time in milliseconds, ready to be
//! sent to a device. A [`MidiEvent`] describes the same element in musical time for a MIDI file
//! writer. Both serialize to the JSON shapes the players and writers expect.

use super::Placement;
use crate::settings::Settings;
use num_rational::Rational64;
use serde::{Deserialize, Serialize};

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const POLY_AFTERTOUCH: u8 = 0xA0;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
pub const CHANNEL_AFTERTOUCH: u8 = 0xD0;
pub const PITCH_BEND: u8 = 0xE0;
pub const TIMING_CLOCK: u8 = 0xF8;
pub const START: u8 = 0xFA;
pub const STOP: u8 = 0xFC;

/// Clamps `value` to a MIDI data byte.
pub fn midi_128(value: i64) -> u8 {
    value.max(0).min(127) as u8
}

/// Clamps `value` to a zero-based MIDI channel.
pub fn midi_16(value: i64) -> u8 {
    value.max(0).min(15) as u8
}

/// A MIDI message to be sent at `time_ms` after playback starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEvent {
    pub time_ms: f64,
    pub midi_message: MidiMessage,
}

/// A MIDI message and the devices it should be routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiMessage {
    pub status_byte: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_byte_1: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_byte_2: Option<u8>,
    pub device: Vec<String>,
}

/// The kind of a [`MidiEvent`], named after the MIDI file events they become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Note,
    ControllerEvent,
    PitchWheelEvent,
    ChannelPressure,
    PolyphonicPressure,
    ProgramChange,
    Rest,
}

/// An element described in beats, for writing MIDI files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiEvent {
    pub event: EventKind,
    /// Zero-based track index.
    pub track: i64,
    pub track_name: String,
    pub numerator: u32,
    pub denominator: u32,
    /// Zero-based channel.
    pub channel: u8,
    /// Start in beats.
    pub time: f64,
    /// Length in beats.
    pub duration: f64,
    /// Tempo in beats per minute.
    pub tempo: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<u8>,
}

/// Builds the records of one element placed `offset` whole notes into the piece.
pub(crate) struct Emitter<'a> {
    settings: &'a Settings,
    placement: &'a Placement,
    start: Rational64,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(
        settings: &'a Settings,
        placement: &'a Placement,
        offset: Rational64,
    ) -> Self {
        Emitter {
            settings,
            placement,
            start: offset + placement.position.whole_notes(),
        }
    }

    /// A channel message `after` whole notes past the start of the element.
    pub(crate) fn message(&self, after: Rational64, status: u8, data: &[u8]) -> PlaylistEvent {
        let channel = midi_16(self.placement.track.channel.0 - 1);
        self.system(after, status | channel, data)
    }

    /// A message sent as is, without a channel.
    pub(crate) fn system(&self, after: Rational64, status_byte: u8, data: &[u8]) -> PlaylistEvent {
        let time_ms = self.settings.milliseconds(self.start + after);
        PlaylistEvent {
            time_ms: (time_ms * 1000.0).round() / 1000.0,
            midi_message: MidiMessage {
                status_byte,
                data_byte_1: data.get(0).copied(),
                data_byte_2: data.get(1).copied(),
                device: self.placement.track.device.0.clone(),
            },
        }
    }

    /// A file event covering `length` whole notes, with no kind-specific fields set.
    pub(crate) fn event(&self, event: EventKind, length: Rational64) -> MidiEvent {
        let track = &self.placement.track;
        let time_signature = self.settings.time_signature;
        MidiEvent {
            event,
            track: track.number - 1,
            track_name: track.name.clone(),
            numerator: time_signature.top,
            denominator: time_signature.bottom,
            channel: midi_16(track.channel.0 - 1),
            time: self.settings.beats(self.start),
            duration: self.settings.beats(length),
            tempo: self.settings.tempo.bpm(),
            pitch: None,
            velocity: None,
            number: None,
            value: None,
            pressure: None,
            program: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clamps() {
        assert_eq!(0, midi_128(-3));
        assert_eq!(127, midi_128(300));
        assert_eq!(64, midi_128(64));
        assert_eq!(15, midi_16(16));
        assert_eq!(0, midi_16(-1));
    }

    #[test]
    fn optional_data_bytes_are_omitted() {
        let message = MidiMessage {
            status_byte: PROGRAM_CHANGE,
            data_byte_1: Some(4),
            data_byte_2: None,
            device: vec!["Loop".to_owned()],
        };
        assert_eq!(
            serde_json::json!({"status_byte": 192, "data_byte_1": 4, "device": ["Loop"]}),
            serde_json::to_value(&message).unwrap()
        );
    }

    #[test]
    fn emitter_offsets_and_rounds() {
        let settings = Settings::default();
        let mut placement = Placement::new(&settings);
        placement.position.value = Rational64::new(1, 3);
        let emitter = Emitter::new(&settings, &placement, Rational64::new(1, 1));
        let event = emitter.message(Rational64::from_integer(0), NOTE_ON, &[60, 100]);
        assert_eq!(2666.667, event.time_ms);
        assert_eq!(NOTE_ON, event.midi_message.status_byte);
        assert_eq!(Some(100), event.midi_message.data_byte_2);
    }
}

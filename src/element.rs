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

//! Elements: the things that happen at a position in time.
//!
//! Every element has a [`Placement`] (where it starts, how long it lasts and which [`Track`] it
//! is routed to) and renders to two kinds of records: a playlist of timed MIDI messages for
//! playback, and a midilist of beat-based events for MIDI file writers. The [`Element`] enum
//! gathers all of them so that they can be stored together in a [`Clip`].
//!
//! Elements combine into clips:
//!
//! ```
//! use operata::clip::Clip;
//! use operata::element::Note;
//! use operata::operand::Operand;
//! use operata::unit::Degree;
//! use std::convert::TryFrom;
//!
//! let tonic = Note::default();
//! let third = Note::default() << Degree(3.0);
//!
//! let clip = Clip::try_from(&tonic + third).unwrap();
//! assert_eq!(2, clip.len());
//!
//! let repeated = Clip::try_from(&tonic * 4).unwrap();
//! assert_eq!(Operand::Int(1), &repeated.end() % 0);
//! ```

use crate::{
    clip::Clip,
    operand::{assign_common, combine_field, Op, Operand, Operate},
    settings::Settings,
    time::{Duration, Position},
    unit::{integer_source, Channel, Device},
};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

pub mod automation;
pub mod midi;
pub mod note;
pub mod tuplet;

pub use automation::{
    Aftertouch, Clock, ControlChange, Panic, PitchBend, PolyAftertouch, ProgramChange,
};
pub use midi::{EventKind, MidiEvent, MidiMessage, PlaylistEvent};
pub use note::{Chord, KeyScale, Note, Rest};
pub use tuplet::{Retrigger, Tuplet};

/// Where an element's messages are sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub channel: Channel,
    pub device: Device,
    pub name: String,
    /// One-based track number, used when writing MIDI files.
    pub number: i64,
}

impl Default for Track {
    fn default() -> Self {
        Track {
            channel: Channel::default(),
            device: Device::default(),
            name: "Track 1".to_owned(),
            number: 1,
        }
    }
}

impl Operate for Track {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Track(_) => Operand::Track(self.clone()),
            Operand::Channel(_) => Operand::Channel(self.channel),
            Operand::Device(_) => Operand::Device(self.device.clone()),
            Operand::Str(_) => Operand::Str(self.name.clone()),
            Operand::Int(_) => Operand::Int(self.number),
            _ => selector.clone(),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) {
            return;
        }
        match source {
            Operand::Track(track) => *self = track.clone(),
            Operand::Null => *self = Track::default(),
            Operand::Channel(channel) => self.channel = *channel,
            Operand::Device(_) => self.device.assign(source),
            Operand::Str(name) => self.name = name.clone(),
            _ => {
                if let Some(number) = integer_source(source) {
                    self.number = number;
                }
            }
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        combine_field(self, op, operand)
    }
}

/// The position, duration and routing shared by all elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Position,
    pub duration: Duration,
    pub track: Track,
}

impl Placement {
    /// A placement at the start of the piece with the default note value and routing.
    pub fn new(settings: &Settings) -> Placement {
        Placement {
            position: settings.position(),
            duration: settings.note_duration(),
            track: settings.track(),
        }
    }

    pub fn start(&self) -> Position {
        self.position
    }

    pub fn end(&self) -> Position {
        self.position.offset(self.duration.whole_notes())
    }

    /// Extracts the time and routing fields, or `None` if `selector` is not one of them.
    pub(crate) fn extract(&self, selector: &Operand) -> Option<Operand> {
        match selector {
            Operand::Position(_)
            | Operand::Measure(_)
            | Operand::Beat(_)
            | Operand::Step(_)
            | Operand::TimeSignature(_) => Some(self.position.extract(selector)),
            Operand::Duration(_) | Operand::NoteValue(_) => Some(self.duration.extract(selector)),
            Operand::Track(_) | Operand::Channel(_) | Operand::Device(_) => {
                Some(self.track.extract(selector))
            }
            _ => None,
        }
    }

    /// Assigns the time and routing fields. Returns `true` if `source` was one of them.
    pub(crate) fn assign(&mut self, source: &Operand) -> bool {
        match source {
            Operand::Position(_) | Operand::Measure(_) | Operand::Beat(_) | Operand::Step(_) => {
                self.position.assign(source)
            }
            Operand::Duration(_) | Operand::NoteValue(_) => self.duration.assign(source),
            Operand::TimeSignature(_) => {
                self.position.assign(source);
                self.duration.assign(source);
            }
            Operand::Track(_) | Operand::Channel(_) | Operand::Device(_) => {
                self.track.assign(source)
            }
            _ => return false,
        }
        true
    }
}

impl Default for Placement {
    fn default() -> Self {
        Placement::new(&Settings::default())
    }
}

/// Rendering shared by every element.
pub trait Playable {
    fn placement(&self) -> &Placement;

    fn placement_mut(&mut self) -> &mut Placement;

    /// Timed MIDI messages for playback, shifted by `offset`.
    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent>;

    /// Beat-based events for MIDI files, shifted by `offset`.
    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent>;
}

macro_rules! elements {
    ($($variant:ident,)*) => {
        /// Any element.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "class", content = "parameters")]
        pub enum Element {
            $($variant($variant),)*
        }

        impl Element {
            /// Returns `true` if `operand` holds an element.
            pub fn is_element(operand: &Operand) -> bool {
                matches!(operand, $(Operand::$variant(_))|*)
            }

            fn as_playable(&self) -> &dyn Playable {
                match self {
                    $(Element::$variant(inner) => inner as &dyn Playable,)*
                }
            }

            fn as_playable_mut(&mut self) -> &mut dyn Playable {
                match self {
                    $(Element::$variant(inner) => inner as &mut dyn Playable,)*
                }
            }

            fn as_operate(&self) -> &dyn Operate {
                match self {
                    $(Element::$variant(inner) => inner as &dyn Operate,)*
                }
            }

            fn as_operate_mut(&mut self) -> &mut dyn Operate {
                match self {
                    $(Element::$variant(inner) => inner as &mut dyn Operate,)*
                }
            }
        }

        impl From<Element> for Operand {
            fn from(element: Element) -> Operand {
                match element {
                    $(Element::$variant(inner) => Operand::$variant(inner),)*
                }
            }
        }

        impl TryFrom<Operand> for Element {
            type Error = Operand;

            fn try_from(operand: Operand) -> Result<Element, Operand> {
                match operand {
                    $(Operand::$variant(inner) => Ok(Element::$variant(inner)),)*
                    other => Err(other),
                }
            }
        }

        $(
            impl From<$variant> for Element {
                fn from(inner: $variant) -> Element {
                    Element::$variant(inner)
                }
            }
        )*
    };
}

elements! {
    Note,
    Chord,
    KeyScale,
    Rest,
    Retrigger,
    Tuplet,
    ControlChange,
    PitchBend,
    Aftertouch,
    PolyAftertouch,
    ProgramChange,
    Clock,
    Panic,
}

impl Element {
    pub fn placement(&self) -> &Placement {
        self.as_playable().placement()
    }

    pub fn placement_mut(&mut self) -> &mut Placement {
        self.as_playable_mut().placement_mut()
    }

    pub fn start(&self) -> Position {
        self.placement().start()
    }

    pub fn end(&self) -> Position {
        self.placement().end()
    }

    pub fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        self.as_playable().playlist(settings, offset)
    }

    pub fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        self.as_playable().midilist(settings, offset)
    }
}

impl Operate for Element {
    fn extract(&self, selector: &Operand) -> Operand {
        self.as_operate().extract(selector)
    }

    fn assign(&mut self, source: &Operand) {
        self.as_operate_mut().assign(source)
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        self.as_operate().combine(op, operand)
    }

    fn scalar(&self) -> Option<f64> {
        self.as_operate().scalar()
    }
}

/// The combinations every element shares.
///
/// Adding an element or a clip joins them into a clip, multiplying by an integer repeats the
/// element end to end and dividing by a number shortens it. Returns `None` for anything else.
pub(crate) fn combine_element<T>(element: &T, op: Op, operand: &Operand) -> Option<Operand>
where
    T: Clone + Into<Element>,
{
    let this: Element = element.clone().into();
    match (op, operand) {
        (Op::Add, Operand::Clip(clip)) => {
            let mut joined = Clip::new(vec![this]);
            joined.elements.extend(clip.elements.iter().cloned());
            Some(joined.into())
        }
        (Op::Add, _) if Element::is_element(operand) => {
            let other = Element::try_from(operand.clone()).ok()?;
            Some(Clip::new(vec![this, other]).into())
        }
        (Op::Mul, Operand::Int(times)) => Some(Clip::new(vec![this]).repeat(*times).into()),
        (Op::Mul, Operand::Float(_)) | (Op::Mul, Operand::Fraction(_)) => Some(this.into()),
        (Op::Div, Operand::Int(_))
        | (Op::Div, Operand::Float(_))
        | (Op::Div, Operand::Fraction(_)) => {
            let mut this = this;
            let placement = this.placement_mut();
            if let Operand::Duration(duration) = placement.duration.combine(Op::Div, operand) {
                placement.duration = duration;
            }
            Some(this.into())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        time::{Beat, Measure, NoteValue},
        unit::Velocity,
    };
    use num_rational::Rational64;
    use pretty_assertions::assert_eq;

    #[test]
    fn placement_fields() {
        let note = Note::default() << Measure(Rational64::from_integer(2)) << Channel(10);
        assert_eq!(Operand::Beat(Beat(Rational64::from_integer(8))), &note % Beat::default());
        assert_eq!(Operand::Channel(Channel(10)), &note % Channel::default());
        assert_eq!(Rational64::new(9, 4), note.placement.end().whole_notes());
    }

    #[test]
    fn element_round_trips_through_operand() {
        let element = Element::from(Rest::default());
        let operand = Operand::from(element.clone());
        assert_eq!(Operand::Rest(Rest::default()), operand);
        assert_eq!(Ok(element), Element::try_from(operand));
        assert_eq!(Err(Operand::Int(1)), Element::try_from(Operand::Int(1)));
        assert!(Element::is_element(&Operand::Clock(Clock::default())));
        assert!(!Element::is_element(&Operand::Velocity(Velocity(1))));
    }

    #[test]
    fn division_shortens() {
        let note = Note::default();
        let half = &note / 2;
        assert_eq!(
            Operand::NoteValue(NoteValue(Rational64::new(1, 8))),
            &half % NoteValue::default()
        );
        assert_eq!(Operand::Note(note.clone()), &note / 0);
    }

    #[test]
    fn track_fields() {
        let track = Track::default() << "Bass" << 2 << Channel(3);
        assert_eq!("Bass", track.name);
        assert_eq!(2, track.number);
        assert_eq!(Channel(3), track.channel);
        assert_eq!(Operand::Track(track.clone()), &track % Track::default());
    }
}

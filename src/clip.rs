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

//! Clips: ordered collections of elements.
//!
//! A [`Clip`] owns its elements and lays them out in time. Clips can be built by combining
//! elements with operators, or with the [`Clip::sequence`] and [`Clip::parallel`] builders, which
//! place each element as it is added.
//!
//! # Examples
//!
//! ```
//! use num_rational::Rational64;
//! use operata::clip::Clip;
//! use operata::element::{Note, Rest};
//! use operata::operand::Operand;
//! use operata::time::Beat;
//! use operata::unit::Degree;
//!
//! let clip = Clip::sequence(|s| {
//!     s.play(Note::default());
//!     s.rest(Rest::default());
//!     s.parallel(|p| {
//!         p.play(Note::default() << Degree(3.0));
//!         p.play(Note::default() << Degree(5.0));
//!     });
//! });
//!
//! assert_eq!(4, clip.len());
//! assert_eq!(Operand::Beat(Beat(Rational64::from_integer(3))), &clip.end() % Beat::default());
//! ```
//!
//! Assigning a [`Frame`] to a clip resolves it once per element:
//!
//! ```
//! use operata::clip::Clip;
//! use operata::element::Note;
//! use operata::frame::Node;
//! use operata::operand::Operand;
//! use operata::unit::Velocity;
//! use std::convert::TryFrom;
//!
//! let clip = Clip::try_from(&Note::default() * 3).unwrap();
//! let clip = clip << (Node::Odd ^ Velocity(40));
//!
//! let velocities = &clip % Velocity::default();
//! assert_eq!(
//!     Operand::Tuple(vec![Velocity(40).into(), Velocity(100).into(), Velocity(40).into()]),
//!     velocities
//! );
//! ```

use crate::{
    element::{Element, MidiEvent, PlaylistEvent, Rest},
    frame::{Frame, Resolution},
    operand::{assign_common, Op, Operand, Operate},
    settings::Settings,
    time::{Duration, Position},
};
use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, convert::TryFrom};

/// An ordered collection of elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Clip {
    pub elements: Vec<Element>,
}

impl Clip {
    pub fn new(elements: Vec<Element>) -> Clip {
        Clip { elements }
    }

    /// Builds a clip from a clip or a single element, handing back anything else.
    pub fn from_operand(operand: Operand) -> Result<Clip, Operand> {
        match operand {
            Operand::Clip(clip) => Ok(clip),
            other => Element::try_from(other).map(|element| Clip::new(vec![element])),
        }
    }

    /// Lays out elements one after another.
    ///
    /// The argument passed to the given closure is conventionally called `s`.
    pub fn sequence(f: impl FnOnce(&mut Sequence)) -> Clip {
        let mut sequence = Sequence {
            clip: Clip::default(),
            cursor: Rational64::from_integer(0),
        };
        f(&mut sequence);
        sequence.clip
    }

    /// Lays out elements so that they all start together.
    ///
    /// The argument passed to the given closure is conventionally called `p`.
    pub fn parallel(f: impl FnOnce(&mut Parallel)) -> Clip {
        let mut parallel = Parallel {
            clip: Clip::default(),
        };
        f(&mut parallel);
        parallel.clip
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn first(&self) -> Option<&Element> {
        self.elements.first()
    }

    pub fn last(&self) -> Option<&Element> {
        self.elements.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// The earliest start of any element, or the start of the piece for an empty clip.
    pub fn start(&self) -> Position {
        self.elements
            .iter()
            .map(Element::start)
            .min_by_key(Position::whole_notes)
            .unwrap_or_default()
    }

    /// The latest end of any element, or the start of the piece for an empty clip.
    pub fn end(&self) -> Position {
        self.elements
            .iter()
            .map(Element::end)
            .max_by_key(Position::whole_notes)
            .unwrap_or_default()
    }

    /// The time from the start of the clip to its end, in whole notes.
    pub fn length(&self) -> Rational64 {
        self.end().whole_notes() - self.start().whole_notes()
    }

    fn shift(&mut self, whole_notes: Rational64) {
        for element in self.elements.iter_mut() {
            let placement = element.placement_mut();
            placement.position = placement.position.offset(whole_notes);
        }
    }

    /// Moves every element so that the clip starts at `position`.
    pub fn move_to(&mut self, position: &Position) {
        let delta = position.whole_notes() - self.start().whole_notes();
        self.shift(delta);
    }

    /// Appends `other`, moved to start where this clip ends.
    pub fn then(mut self, mut other: Clip) -> Clip {
        if !self.is_empty() {
            let end = self.end();
            other.move_to(&end);
        }
        self.elements.extend(other.elements);
        self
    }

    /// `times` copies of this clip laid end to end.
    pub fn repeat(&self, times: i64) -> Clip {
        let length = self.length();
        let mut repeated = Clip::default();
        for copy in 0..times.max(0) {
            let mut clip = self.clone();
            clip.shift(length * copy);
            repeated.elements.extend(clip.elements);
        }
        repeated
    }

    /// Lays the elements end to end in their current order, from the start of the clip.
    pub fn stack(&mut self) {
        let mut cursor = self.start().whole_notes();
        for element in self.elements.iter_mut() {
            let placement = element.placement_mut();
            placement.position.value = cursor;
            cursor += placement.duration.whole_notes();
        }
    }

    /// Orders the elements by position, keeping the order of simultaneous ones.
    pub fn sort(&mut self) {
        self.elements.sort_by_key(|element| element.start().whole_notes());
    }

    /// Reverses the order of the elements and lays them out again from the start of the clip.
    pub fn reverse(&mut self) {
        self.elements.reverse();
        self.stack();
    }

    /// The elements whose field selected by `criteria` equals it.
    pub fn filter(&self, criteria: &Operand) -> Clip {
        Clip::new(
            self.elements
                .iter()
                .filter(|element| element.extract(criteria) == *criteria)
                .cloned()
                .collect(),
        )
    }

    /// The playlists of every element, shifted by `offset` and ordered by time.
    pub fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        let mut playlist: Vec<PlaylistEvent> = self
            .elements
            .iter()
            .flat_map(|element| element.playlist(settings, offset))
            .collect();
        playlist.sort_by(|a, b| a.time_ms.partial_cmp(&b.time_ms).unwrap_or(Ordering::Equal));
        playlist
    }

    /// The midilists of every element, shifted by `offset`.
    pub fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        self.elements
            .iter()
            .flat_map(|element| element.midilist(settings, offset))
            .collect()
    }

    /// Binds `frame` to this clip and assigns its resolution to each element in turn.
    ///
    /// Elements the frame blocks are left as they are.
    pub fn assign_with(&mut self, frame: &mut Frame) {
        frame.bind(self.len());
        for element in self.elements.iter_mut() {
            let subject = Operand::from(element.clone());
            if let Resolution::Value(value) = frame.resolve(&subject) {
                element.assign(&value);
            }
        }
    }

    /// Binds `frame` to this clip and extracts its resolution from each element in turn.
    ///
    /// Elements the frame blocks are skipped.
    pub fn extract_with(&self, frame: &mut Frame) -> Vec<Operand> {
        frame.bind(self.len());
        self.elements
            .iter()
            .filter_map(|element| {
                let subject = Operand::from(element.clone());
                frame
                    .resolve(&subject)
                    .value()
                    .map(|selector| element.extract(&selector))
            })
            .collect()
    }

    fn map_elements(&self, op: Op, operand: &Operand) -> Clip {
        let elements = self
            .elements
            .iter()
            .map(|element| {
                Element::try_from(element.combine(op, operand)).unwrap_or_else(|_| element.clone())
            })
            .collect();
        Clip::new(elements)
    }

    fn without(&self, unwanted: &[Element]) -> Clip {
        let elements = self
            .elements
            .iter()
            .filter(|element| !unwanted.contains(element))
            .cloned()
            .collect();
        Clip::new(elements)
    }

    fn head(&self, parts: i64) -> Clip {
        if parts <= 0 {
            log::warn!("cannot divide a clip into {} parts", parts);
            return self.clone();
        }
        let cutoff = self.start().whole_notes() + self.length() / parts;
        let elements = self
            .elements
            .iter()
            .filter(|element| element.start().whole_notes() < cutoff)
            .cloned()
            .collect();
        Clip::new(elements)
    }
}

impl Operate for Clip {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Clip(_) => Operand::Clip(self.clone()),
            Operand::Int(_) => Operand::Int(self.len() as i64),
            Operand::Position(_) => Operand::Position(self.start()),
            Operand::Duration(_) => {
                Operand::Duration(Duration::new(self.length(), self.start().meter))
            }
            Operand::Frame(frame) => {
                let mut frame = frame.as_ref().clone();
                Operand::Tuple(self.extract_with(&mut frame))
            }
            _ => Operand::Tuple(
                self.elements
                    .iter()
                    .map(|element| element.extract(selector))
                    .collect(),
            ),
        }
    }

    fn assign(&mut self, source: &Operand) {
        match source {
            Operand::Frame(frame) => {
                let mut frame = frame.as_ref().clone();
                self.assign_with(&mut frame);
            }
            Operand::Clip(clip) => {
                for (element, other) in self.elements.iter_mut().zip(clip.elements.iter()) {
                    *element = other.clone();
                }
            }
            Operand::Tuple(_) => {
                assign_common(self, source);
            }
            _ => {
                for element in self.elements.iter_mut() {
                    element.assign(source);
                }
            }
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        let clip = match (op, operand) {
            (Op::Add, Operand::Clip(other)) => {
                let mut joined = self.clone();
                joined.elements.extend(other.elements.iter().cloned());
                joined
            }
            (Op::Add, _) if Element::is_element(operand) => {
                let mut joined = self.clone();
                joined.elements.extend(Element::try_from(operand.clone()).ok());
                joined
            }
            (Op::Sub, Operand::Clip(other)) => self.without(&other.elements),
            (Op::Sub, _) if Element::is_element(operand) => {
                let unwanted: Vec<Element> =
                    Element::try_from(operand.clone()).into_iter().collect();
                self.without(&unwanted)
            }
            (Op::Sub, Operand::Int(count)) => {
                let keep = self.len().saturating_sub((*count).max(0) as usize);
                Clip::new(self.elements[..keep].to_vec())
            }
            (Op::Mul, Operand::Int(times)) => self.repeat(*times),
            (Op::Div, Operand::Int(parts)) => self.head(*parts),
            _ => self.map_elements(op, operand),
        };
        clip.into()
    }
}

/// A builder for clips whose elements follow each other.
///
/// Passed to the closure given to [`Clip::sequence`] and [`Parallel::sequence`].
#[derive(Debug)]
pub struct Sequence {
    clip: Clip,
    cursor: Rational64,
}

impl Sequence {
    /// Adds an element where the previous one ends.
    pub fn play(&mut self, element: impl Into<Element>) {
        let mut element = element.into();
        let placement = element.placement_mut();
        placement.position.value = self.cursor;
        self.cursor += placement.duration.whole_notes();
        self.clip.elements.push(element);
    }

    /// Adds a rest, which only moves later elements along.
    pub fn rest(&mut self, rest: Rest) {
        self.play(rest);
    }

    /// Adds every element of `clip`, moved to start where the previous element ends.
    pub fn embed(&mut self, mut clip: Clip) {
        if clip.is_empty() {
            return;
        }
        clip.move_to(&Position::new(self.cursor, clip.start().meter));
        self.cursor = clip.end().whole_notes();
        self.clip.elements.extend(clip.elements);
    }

    /// Shorthand for `self.embed(Clip::parallel(f))`.
    pub fn parallel(&mut self, f: impl FnOnce(&mut Parallel)) {
        self.embed(Clip::parallel(f));
    }
}

/// A builder for clips whose elements start together.
///
/// Passed to the closure given to [`Clip::parallel`] and [`Sequence::parallel`].
#[derive(Debug)]
pub struct Parallel {
    clip: Clip,
}

impl Parallel {
    /// Adds an element at the start of the clip.
    pub fn play(&mut self, element: impl Into<Element>) {
        let mut element = element.into();
        element.placement_mut().position.value = Rational64::from_integer(0);
        self.clip.elements.push(element);
    }

    /// Adds every element of `clip`, moved to the start of the clip.
    pub fn embed(&mut self, mut clip: Clip) {
        if clip.is_empty() {
            return;
        }
        clip.move_to(&Position::new(Rational64::from_integer(0), clip.start().meter));
        self.clip.elements.extend(clip.elements);
    }

    /// Shorthand for `self.embed(Clip::sequence(f))`.
    pub fn sequence(&mut self, f: impl FnOnce(&mut Sequence)) {
        self.embed(Clip::sequence(f));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        element::{ControlChange, Note},
        frame::Node,
        time::{Beat, Measure},
        unit::{Channel, Degree, Velocity},
    };
    use pretty_assertions::assert_eq;

    fn ratio(numer: i64, denom: i64) -> Rational64 {
        Rational64::new(numer, denom)
    }

    fn starts(clip: &Clip) -> Vec<Rational64> {
        clip.iter().map(|element| element.start().whole_notes()).collect()
    }

    fn scale() -> Clip {
        Clip::sequence(|s| {
            for degree in 1..=4 {
                s.play(Note::default() << Degree(f64::from(degree)));
            }
        })
    }

    #[test]
    fn sequence_lays_out_end_to_end() {
        let clip = scale();
        assert_eq!(vec![ratio(0, 1), ratio(1, 4), ratio(1, 2), ratio(3, 4)], starts(&clip));
        assert_eq!(ratio(1, 1), clip.length());
    }

    #[test]
    fn parallel_starts_together() {
        let clip = Clip::parallel(|p| {
            p.play(Note::default());
            p.sequence(|s| {
                s.play(Rest::default());
                s.play(Note::default());
            });
        });
        assert_eq!(vec![ratio(0, 1), ratio(0, 1), ratio(1, 4)], starts(&clip));
    }

    #[test]
    fn piping_places_after_the_end() {
        let joined = Clip::try_from(scale() >> Note::default()).unwrap();
        assert_eq!(5, joined.len());
        assert_eq!(ratio(1, 1), joined.elements[4].start().whole_notes());

        let moved = Clip::try_from(Position::default() << 2 >> scale()).unwrap();
        assert_eq!(ratio(2, 1), moved.start().whole_notes());
    }

    #[test]
    fn repetition_and_division() {
        let twice = Clip::try_from(&scale() * 2).unwrap();
        assert_eq!(8, twice.len());
        assert_eq!(ratio(2, 1), twice.end().whole_notes());

        let half = Clip::try_from(&scale() / 2).unwrap();
        assert_eq!(vec![ratio(0, 1), ratio(1, 4)], starts(&half));

        assert_eq!(Operand::Clip(scale()), &scale() / 0);
    }

    #[test]
    fn subtraction_removes() {
        let clip = scale();
        let fewer = Clip::try_from(&clip - 3).unwrap();
        assert_eq!(1, fewer.len());

        let first = Operand::from(clip.elements[0].clone());
        let without = Clip::try_from(&clip - first).unwrap();
        assert_eq!(3, without.len());
        assert_eq!(clip.elements[1..].to_vec(), without.elements);
    }

    #[test]
    fn addition_appends_or_shifts() {
        let clip = scale();
        let more = Clip::try_from(&clip + ControlChange::default()).unwrap();
        assert_eq!(5, more.len());

        let later = Clip::try_from(&clip + Beat(ratio(1, 1))).unwrap();
        assert_eq!(ratio(1, 4), later.start().whole_notes());
        assert_eq!(ratio(5, 4), later.end().whole_notes());
    }

    #[test]
    fn assignment_reaches_every_element() {
        let clip = scale() << Channel(2);
        let channel = Operand::Channel(Channel(2));
        assert!(clip
            .iter()
            .all(|element| element.extract(&Channel::default().into()) == channel));

        let mut replaced = scale();
        replaced <<= Clip::new(vec![Rest::default().into()]);
        assert_eq!(Element::from(Rest::default()), replaced.elements[0]);
        assert_eq!(4, replaced.len());
    }

    #[test]
    fn frames_see_each_element() {
        let clip = scale() << (Node::Last ^ Velocity(10));
        let velocities = &clip % Velocity::default();
        assert_eq!(
            Operand::Tuple(vec![
                Velocity(100).into(),
                Velocity(100).into(),
                Velocity(100).into(),
                Velocity(10).into(),
            ]),
            velocities
        );

        let mut frame = Frame::new(Node::Even) ^ Degree::default();
        let degrees = scale().extract_with(&mut frame);
        assert_eq!(vec![Operand::Degree(Degree(2.0)), Operand::Degree(Degree(4.0))], degrees);
    }

    #[test]
    fn reverse_restacks() {
        let mut clip = scale();
        clip.reverse();
        assert_eq!(Operand::Int(65), clip.elements[0].extract(&Operand::Int(0)));
        assert_eq!(vec![ratio(0, 1), ratio(1, 4), ratio(1, 2), ratio(3, 4)], starts(&clip));

        let mut unsorted = Clip::new(vec![
            (Note::default() << Measure(ratio(1, 1))).into(),
            Note::default().into(),
        ]);
        unsorted.sort();
        assert_eq!(vec![ratio(0, 1), ratio(1, 1)], starts(&unsorted));
    }

    #[test]
    fn filtering_and_fields() {
        let clip = scale();
        let thirds = clip.filter(&Degree(3.0).into());
        assert_eq!(1, thirds.len());
        assert_eq!(Operand::Int(4), &clip % 0);
        assert_eq!(
            Operand::Duration(Duration::new(ratio(1, 1), Default::default())),
            &clip % Duration::default()
        );
    }

    #[test]
    fn playlist_is_ordered_by_time() {
        let clip = Clip::parallel(|p| {
            p.play(Note::default() << Beat(ratio(1, 1)));
            p.play(Note::default());
        });
        let times: Vec<f64> = clip
            .playlist(&Settings::default(), &Position::default())
            .iter()
            .map(|event| event.time_ms)
            .collect();
        assert_eq!(vec![0.0, 500.0, 500.0, 1000.0], times);
        assert_eq!(2, clip.midilist(&Settings::default(), &Position::default()).len());
    }
}

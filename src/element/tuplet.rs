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

//! Elements that split their time between several notes.
//!
//! A [`Retrigger`] repeats one note and a [`Tuplet`] squeezes a group of elements into a fixed
//! span. Both span twice the note value they are given, so a retrigger of quarter notes fills a
//! half note, and both can swing, giving the first of every pair of notes more or less time
//! than the second.

use super::{
    combine_element,
    midi::{MidiEvent, PlaylistEvent},
    note::{render, render_midi},
    Element, Note, Placement, Playable,
};
use crate::{
    clip::Clip,
    operand::{assign_common, combine_field, ratio_from_f64, Op, Operand, Operate},
    settings::Settings,
    time::Position,
    unit::{Division, Gate, Swing},
};
use num_rational::Rational64;
use serde::{Deserialize, Serialize};

fn doubled(settings: &Settings) -> Placement {
    let mut placement = Placement::new(settings);
    placement.duration.value *= Rational64::from_integer(2);
    placement
}

/// Extracts the note value of a span, which is half of it.
fn extract_span(placement: &Placement, selector: &Operand) -> Option<Operand> {
    match selector {
        Operand::Duration(_) | Operand::NoteValue(_) | Operand::Fraction(_) => {
            let mut single = placement.duration;
            single.value /= Rational64::from_integer(2);
            Some(single.extract(selector))
        }
        _ => None,
    }
}

/// Sets the span to twice the note value in `source`. Returns `true` if `source` was one.
fn assign_span(placement: &mut Placement, source: &Operand) -> bool {
    match source {
        Operand::Duration(_) | Operand::NoteValue(_) | Operand::Fraction(_) => {
            let mut single = placement.duration;
            single.assign(source);
            placement.duration = single;
            placement.duration.value *= Rational64::from_integer(2);
            true
        }
        _ => false,
    }
}

/// The share of a pair's time taken by the note at `index`.
fn swing_share(swing: Swing, index: usize) -> Rational64 {
    let swing = ratio_from_f64(swing.0);
    if index % 2 == 0 {
        swing
    } else {
        Rational64::from_integer(1) - swing
    }
}

/// A note repeated `division` times across its span.
///
/// ```
/// use operata::element::Retrigger;
/// use operata::unit::Division;
///
/// let retrigger = Retrigger::default() << Division(4);
/// assert_eq!(4, retrigger.notes().len());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retrigger {
    pub note: Note,
    pub division: Division,
    pub swing: Swing,
}

impl Retrigger {
    pub fn with_settings(settings: &Settings) -> Retrigger {
        let mut note = Note::with_settings(settings);
        note.placement = doubled(settings);
        note.gate = Gate(0.5);
        Retrigger {
            note,
            division: Division::default(),
            swing: Swing::default(),
        }
    }

    /// The repeated notes, laid end to end from the start of the span.
    pub fn notes(&self) -> Vec<Note> {
        let division = self.division.0.max(1);
        let span = self.note.placement.duration.whole_notes();
        let single = span / Rational64::from_integer(division);
        let mut position = self.note.placement.position;
        (0..division as usize)
            .map(|index| {
                let mut note = self.note.clone();
                note.placement.position = position;
                note.placement.duration.value =
                    single * Rational64::from_integer(2) * swing_share(self.swing, index);
                position = position.offset(note.placement.duration.value);
                note
            })
            .collect()
    }
}

impl Default for Retrigger {
    fn default() -> Self {
        Retrigger::with_settings(&Settings::default())
    }
}

impl Operate for Retrigger {
    fn extract(&self, selector: &Operand) -> Operand {
        if let Some(span) = extract_span(&self.note.placement, selector) {
            return span;
        }
        match selector {
            Operand::Retrigger(_) => Operand::Retrigger(self.clone()),
            Operand::Division(_) => Operand::Division(self.division),
            Operand::Int(_) => Operand::Int(self.division.0),
            Operand::Swing(_) => Operand::Swing(self.swing),
            _ => self.note.extract(selector),
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) || assign_span(&mut self.note.placement, source) {
            return;
        }
        match source {
            Operand::Retrigger(retrigger) => *self = retrigger.clone(),
            Operand::Division(Division(division)) | Operand::Int(division) => {
                if *division > 0 {
                    self.division = Division(*division);
                } else {
                    log::warn!("ignoring retrigger division {}", division);
                }
            }
            Operand::Swing(_) => self.swing.assign(source),
            Operand::Null => {
                self.note.assign(source);
                self.division = Division::default();
                self.swing = Swing::default();
            }
            _ => self.note.assign(source),
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        if let Some(result) = combine_element(self, op, operand) {
            return result;
        }
        match operand {
            Operand::Division(_) | Operand::Swing(_) => combine_field(self, op, operand),
            _ => match self.note.combine(op, operand) {
                Operand::Note(note) => Retrigger {
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

impl Playable for Retrigger {
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

/// A group of elements played in the time of a fixed span.
///
/// Each element gets an equal share of the span, except that two elements are played in the
/// time of three: a duplet of quarter notes lasts a dotted half. Assigning anything but a clip,
/// a swing or a note value is passed on to every element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuplet {
    pub placement: Placement,
    pub swing: Swing,
    elements: Vec<Element>,
}

impl Tuplet {
    /// A triplet of half-gated notes.
    pub fn with_settings(settings: &Settings) -> Tuplet {
        let note = Note::with_settings(settings) << Gate(0.5);
        Tuplet::new(settings, vec![note.clone().into(), note.clone().into(), note.into()])
    }

    pub fn new(settings: &Settings, elements: Vec<Element>) -> Tuplet {
        Tuplet {
            placement: doubled(settings),
            swing: Swing::default(),
            elements,
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The length given to each element, in whole notes.
    pub fn element_length(&self) -> Rational64 {
        let span = self.placement.duration.whole_notes();
        match self.elements.len() {
            0 => Rational64::from_integer(0),
            2 => span * Rational64::new(3, 4),
            count => span / Rational64::from_integer(count as i64),
        }
    }

    /// The elements as they are played, each moved to its place in the span.
    pub fn placed_elements(&self) -> Vec<Element> {
        let length = self.element_length();
        let mut position = self.placement.position;
        self.elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                let mut element = element.clone();
                let placement = element.placement_mut();
                placement.position = position;
                placement.duration.value = length;
                position = position
                    .offset(length * Rational64::from_integer(2) * swing_share(self.swing, index));
                element
            })
            .collect()
    }
}

impl Default for Tuplet {
    fn default() -> Self {
        Tuplet::with_settings(&Settings::default())
    }
}

impl Operate for Tuplet {
    fn extract(&self, selector: &Operand) -> Operand {
        if let Some(span) = extract_span(&self.placement, selector) {
            return span;
        }
        if let Some(field) = self.placement.extract(selector) {
            return field;
        }
        match selector {
            Operand::Tuplet(_) => Operand::Tuplet(self.clone()),
            Operand::Swing(_) => Operand::Swing(self.swing),
            Operand::Division(_) => Operand::Division(Division(self.elements.len() as i64)),
            Operand::Int(_) => Operand::Int(self.elements.len() as i64),
            Operand::Clip(_) => Operand::Clip(Clip::new(self.placed_elements())),
            _ => match self.elements.first() {
                Some(element) => element.extract(selector),
                None => selector.clone(),
            },
        }
    }

    fn assign(&mut self, source: &Operand) {
        if assign_common(self, source) || assign_span(&mut self.placement, source) {
            return;
        }
        match source {
            Operand::Tuplet(tuplet) => *self = tuplet.clone(),
            Operand::Swing(_) => self.swing.assign(source),
            Operand::Clip(clip) if clip.is_empty() => log::warn!("ignoring an empty tuplet"),
            Operand::Clip(clip) => self.elements = clip.elements.clone(),
            _ => {
                if let Operand::Null = source {
                    self.swing = Swing::default();
                }
                self.placement.assign(source);
                for element in self.elements.iter_mut() {
                    element.assign(source);
                }
            }
        }
    }

    fn combine(&self, op: Op, operand: &Operand) -> Operand {
        combine_element(self, op, operand).unwrap_or_else(|| combine_field(self, op, operand))
    }
}

impl Playable for Tuplet {
    fn placement(&self) -> &Placement {
        &self.placement
    }

    fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    fn playlist(&self, settings: &Settings, offset: &Position) -> Vec<PlaylistEvent> {
        self.placed_elements()
            .iter()
            .flat_map(|element| element.playlist(settings, offset))
            .collect()
    }

    fn midilist(&self, settings: &Settings, offset: &Position) -> Vec<MidiEvent> {
        self.placed_elements()
            .iter()
            .flat_map(|element| element.midilist(settings, offset))
            .collect()
    }
}

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

//! # Operata
//!
//! Operata is a library for composing music out of small, typed values called *operands*.
//!
//! Every musical quantity is an operand: a [`Velocity`](unit::Velocity), a
//! [`Degree`](unit::Degree), a [`Position`](time::Position) in time, a whole
//! [`Note`](element::Note) or a [`Clip`](clip::Clip) of elements. Operands talk to each other
//! through a small set of operators:
//!
//! * `a % b` extracts the field of `a` selected by the class of `b`.
//! * `a << b` assigns `b` into a copy of `a`, and `a <<= b` does it in place.
//! * `a + b`, `a - b`, `a * b` and `a / b` combine operands, each class deciding what that means.
//! * `a >> b` pipes `a` into `b`, placing it or chaining after it.
//! * `a ^ b` chains [frame](frame) nodes into a frame.
//!
//! Operands that do not know a class leave themselves unchanged, so any operand can be assigned
//! into any other.
//!
//! # Example
//!
//! ```
//! use num_rational::Rational64;
//! use operata::clip::Clip;
//! use operata::element::Note;
//! use operata::frame::Node;
//! use operata::operand::{Operand, Operate};
//! use operata::settings::Settings;
//! use operata::time::Position;
//! use operata::unit::{Degree, Velocity};
//!
//! // A rising line of quarter notes in C major.
//! let line = Clip::sequence(|s| {
//!     for degree in 1..=4 {
//!         s.play(Note::default() << Degree(f64::from(degree)));
//!     }
//! });
//!
//! // Accent the first note of the line.
//! let line = line << (Node::First ^ Velocity(120));
//! let accent = line.elements[0].extract(&Velocity::default().into());
//! assert_eq!(Operand::Velocity(Velocity(120)), accent);
//! assert_eq!(Rational64::from_integer(1), line.length());
//!
//! // At the default 120 beats per minute, the last note ends after two seconds.
//! let playlist = line.playlist(&Settings::default(), &Position::default());
//! assert_eq!(Some(2000.0), playlist.last().map(|event| event.time_ms));
//! ```
//!
//! # Modules
//!
//! * [`operand`] holds the [`Operand`](operand::Operand) enum and the [`Operate`](operand::Operate)
//!   protocol every class implements.
//! * [`unit`], [`time`], [`pitch`], [`scale`] and [`controller`] define the value classes.
//! * [`element`] defines the playable elements and the MIDI events they render to.
//! * [`clip`] arranges elements in time.
//! * [`frame`] builds per-element transformations out of chained nodes.
//! * [`chaos`] provides the deterministic generators frames can draw from.
//! * [`settings`] holds the defaults new operands are created with.
//! * [`record`] reads and writes operands as JSON.

pub mod chaos;
pub mod clip;
pub mod controller;
pub mod element;
pub mod error;
pub mod frame;
pub mod operand;
pub mod pitch;
pub mod record;
pub mod scale;
pub mod settings;
pub mod time;
pub mod unit;

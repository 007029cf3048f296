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

//! Frames: stateful chains that decide what gets assigned to each element.
//!
//! A [`Frame`] is a singly linked chain of [`Node`]s built with the `^` operator. When a frame is
//! assigned to a [`Clip`](crate::clip::Clip), the clip binds the chain to its length and resolves
//! it once per element, in order. Each resolution threads a value through the chain: left nodes
//! pass it on, substitute it or block it, and right nodes resolve the rest of the chain first and
//! then wrap or project its result. A chain that ends in a plain operand uses it as a template:
//! the value reaching it is assigned into a copy of the operand.
//!
//! # Examples
//!
//! ```
//! use operata::frame::{Frame, Node, Resolution};
//! use operata::operand::Operand;
//! use operata::unit::Velocity;
//!
//! let mut frame = Node::Foreach(vec![Operand::Int(60), Operand::Int(90)]) ^ Velocity::default();
//! frame.bind(3);
//!
//! let subject = Operand::Null;
//! assert_eq!(Resolution::Value(Velocity(60).into()), frame.resolve(&subject));
//! assert_eq!(Resolution::Value(Velocity(90).into()), frame.resolve(&subject));
//! assert_eq!(Resolution::Value(Velocity(60).into()), frame.resolve(&subject));
//! ```
//!
//! Filters block the elements they reject, leaving them untouched:
//!
//! ```
//! use operata::frame::{Frame, Node, Resolution};
//! use operata::operand::Operand;
//!
//! let mut frame = Frame::new(Node::Nth(vec![1, 3]));
//! frame.bind(4);
//!
//! let subject = Operand::Int(7);
//! let resolved: Vec<bool> = (0..4)
//!     .map(|_| frame.resolve(&subject) != Resolution::Blocked)
//!     .collect();
//! assert_eq!(vec![true, false, true, false], resolved);
//! ```

use crate::operand::{Op, Operand, Operate};
use serde::{Deserialize, Serialize};
use std::ops::BitXor;

mod node;

pub use node::Node;

/// The outcome of resolving a frame for one element.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The value to assign or extract with.
    Value(Operand),
    /// A node rejected the element, which must be left alone.
    Blocked,
}

impl Resolution {
    pub fn value(self) -> Option<Operand> {
        match self {
            Resolution::Value(value) => Some(value),
            Resolution::Blocked => None,
        }
    }
}

/// Per node iteration state, rebuilt whenever the chain is bound.
#[derive(Debug, Clone, Default)]
struct State {
    /// Resolutions started at this node, only advanced on the head of a chain.
    tick: u64,
    /// The last tick this node was evaluated on.
    seen: Option<u64>,
    /// How many distinct ticks reached this node.
    calls: usize,
    /// The length of the bound clip.
    len: Option<usize>,
    current: Option<Resolution>,
    /// A running counter or generator.
    value: Option<Operand>,
    step: Option<Operand>,
    pool: Vec<usize>,
    counters: Vec<i64>,
}

/// One node of a frame chain and whatever follows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub node: Node,
    /// The next frame, or a payload operand ending the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<Operand>>,
    #[serde(skip)]
    state: State,
}

impl Frame {
    pub fn new(node: Node) -> Frame {
        Frame {
            node,
            next: None,
            state: State::default(),
        }
    }

    /// Appends `next` to the end of the chain, replacing any payload already there.
    pub fn then(mut self, next: impl Into<Operand>) -> Frame {
        self.append(next.into());
        self
    }

    fn append(&mut self, operand: Operand) {
        match self.next.as_deref_mut() {
            Some(Operand::Frame(next)) => next.append(operand),
            _ => self.next = Some(Box::new(operand)),
        }
    }

    /// The operand ending the chain, if it ends in one.
    pub fn payload(&self) -> Option<&Operand> {
        match self.next.as_deref() {
            Some(Operand::Frame(next)) => next.payload(),
            Some(payload) => Some(payload),
            None => None,
        }
    }

    /// The nodes of the chain, head first.
    pub fn nodes(&self) -> Vec<&Node> {
        let mut nodes = vec![&self.node];
        let mut frame = self;
        while let Some(Operand::Frame(next)) = frame.next.as_deref() {
            nodes.push(&next.node);
            frame = &**next;
        }
        nodes
    }

    /// Prepares the chain for a pass over `len` elements, resetting every node.
    pub fn bind(&mut self, len: usize) {
        log::debug!("binding frame chain of {} nodes to {} elements", self.nodes().len(), len);
        self.rebuild(Some(len));
    }

    /// Resets every node, keeping the current binding.
    pub fn reset(&mut self) {
        let len = self.state.len;
        self.rebuild(len);
    }

    fn rebuild(&mut self, len: Option<usize>) {
        self.state = State {
            len,
            ..State::default()
        };
        if let Some(Operand::Frame(next)) = self.next.as_deref_mut() {
            next.rebuild(len);
        }
    }

    /// Resolves the chain for the next element, `subject`.
    pub fn resolve(&mut self, subject: &Operand) -> Resolution {
        self.state.tick += 1;
        let tick = self.state.tick;
        self.evaluate_at(tick, subject, subject.clone())
    }

    /// Resolves the chain again for the current element without advancing any node.
    pub fn evaluate(&mut self, subject: &Operand) -> Resolution {
        let tick = self.state.tick;
        self.evaluate_at(tick, subject, subject.clone())
    }

    /// Resolves a fresh copy of the chain bound to a single element.
    pub fn resolve_detached(&self, subject: &Operand) -> Resolution {
        let mut frame = self.clone();
        frame.bind(1);
        frame.resolve(subject)
    }

    fn evaluate_at(&mut self, tick: u64, subject: &Operand, input: Operand) -> Resolution {
        if self.state.seen == Some(tick) {
            if let Some(current) = &self.state.current {
                return current.clone();
            }
        }
        self.state.seen = Some(tick);
        self.state.calls += 1;
        let resolution = if self.node.is_right() {
            self.resolve_right(tick, subject, input)
        } else {
            match self.node.pass(&mut self.state, tick, input) {
                Some(value) => self.forward(tick, subject, value),
                None => Resolution::Blocked,
            }
        };
        self.state.current = Some(resolution.clone());
        resolution
    }

    fn resolve_right(&mut self, tick: u64, subject: &Operand, input: Operand) -> Resolution {
        let value = match self.forward(tick, subject, input) {
            Resolution::Value(value) => value,
            Resolution::Blocked => return Resolution::Blocked,
        };
        match &self.node {
            Node::Wrap(template) => {
                let mut wrapped = template.clone();
                wrapped.assign(&value);
                Resolution::Value(wrapped)
            }
            Node::Extract(selector) => Resolution::Value(value.extract(selector)),
            _ => Resolution::Value(subject.clone()),
        }
    }

    fn forward(&mut self, tick: u64, subject: &Operand, value: Operand) -> Resolution {
        match self.next.as_deref_mut() {
            None => Resolution::Value(value),
            Some(Operand::Frame(next)) => next.evaluate_at(tick, subject, value),
            Some(payload) => {
                let mut template = payload.clone();
                template.assign(&value);
                Resolution::Value(template)
            }
        }
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Frame) -> bool {
        self.node == other.node && self.next == other.next
    }
}

impl From<Node> for Frame {
    fn from(node: Node) -> Frame {
        Frame::new(node)
    }
}

impl From<Node> for Operand {
    fn from(node: Node) -> Operand {
        Frame::new(node).into()
    }
}

impl<T: Into<Operand>> BitXor<T> for Frame {
    type Output = Frame;

    fn bitxor(self, next: T) -> Frame {
        self.then(next)
    }
}

impl<T: Into<Operand>> BitXor<T> for Node {
    type Output = Frame;

    fn bitxor(self, next: T) -> Frame {
        Frame::new(self).then(next)
    }
}

/// Frames are read only through the operand protocol: only resolving them changes their state.
impl Operate for Frame {
    fn extract(&self, selector: &Operand) -> Operand {
        match selector {
            Operand::Frame(_) => self.clone().into(),
            _ => match self.payload() {
                Some(payload) => payload.extract(selector),
                None => selector.clone(),
            },
        }
    }

    fn assign(&mut self, _: &Operand) {}

    fn combine(&self, _: Op, _: &Operand) -> Operand {
        self.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chaos::Modulus,
        element::Note,
        unit::{Degree, Velocity},
    };
    use pretty_assertions::assert_eq;

    fn values(frame: &mut Frame, subject: &Operand, count: usize) -> Vec<Option<Operand>> {
        (0..count).map(|_| frame.resolve(subject).value()).collect()
    }

    fn ints(values: &[i64]) -> Vec<Option<Operand>> {
        values.iter().map(|value| Some(Operand::Int(*value))).collect()
    }

    #[test]
    fn chaining_appends_at_the_tail() {
        let frame = Node::Odd ^ Node::Every(2) ^ Node::First;
        assert_eq!(vec![&Node::Odd, &Node::Every(2), &Node::First], frame.nodes());
        assert_eq!(None, frame.payload());
        let frame = frame ^ Velocity(1);
        assert_eq!(Some(&Operand::Velocity(Velocity(1))), frame.payload());
    }

    #[test]
    fn payload_is_a_template() {
        let mut frame = Node::Input(Operand::Int(3)) ^ Degree::default();
        frame.bind(1);
        assert_eq!(
            Resolution::Value(Operand::Degree(Degree(3.0))),
            frame.resolve(&Operand::Null)
        );
    }

    #[test]
    fn right_nodes_act_on_the_rest_of_the_chain() {
        let note = Operand::Note(Note::default() << Degree(5.0));

        let mut extract = Frame::new(Node::Extract(Operand::Int(0)));
        extract.bind(1);
        assert_eq!(Resolution::Value(Operand::Int(67)), extract.resolve(&note));

        let mut wrap = Node::Wrap(Velocity::default().into()) ^ Node::Input(Operand::Int(20));
        wrap.bind(1);
        assert_eq!(Resolution::Value(Velocity(20).into()), wrap.resolve(&note));

        let mut subject = Node::Subject ^ Node::Input(Operand::Int(20));
        subject.bind(1);
        assert_eq!(Resolution::Value(note.clone()), subject.resolve(&note));

        let mut blocked = Node::Subject ^ Node::Even;
        blocked.bind(2);
        assert_eq!(Resolution::Blocked, blocked.resolve(&note));
        assert_eq!(Resolution::Value(note.clone()), blocked.resolve(&note));
    }

    #[test]
    fn reentry_does_not_advance() {
        let mut frame = Frame::new(Node::Iterate {
            start: Operand::Int(1),
            step: Operand::Int(1),
        });
        frame.bind(2);
        assert_eq!(Resolution::Value(Operand::Int(1)), frame.resolve(&Operand::Null));
        assert_eq!(Resolution::Value(Operand::Int(1)), frame.evaluate(&Operand::Null));
        assert_eq!(Resolution::Value(Operand::Int(2)), frame.resolve(&Operand::Null));
    }

    #[test]
    fn blocked_nodes_do_not_advance_the_rest() {
        let mut frame = Node::Even
            ^ Node::Iterate {
                start: Operand::Int(0),
                step: Operand::Int(1),
            };
        frame.bind(4);
        assert_eq!(
            vec![None, Some(Operand::Int(0)), None, Some(Operand::Int(1))],
            values(&mut frame, &Operand::Null, 4)
        );
    }

    #[test]
    fn binding_resets_counters() {
        let mut frame = Frame::new(Node::Foreach(vec![Operand::Int(1), Operand::Int(2)]));
        frame.bind(2);
        frame.resolve(&Operand::Null);
        frame.bind(2);
        assert_eq!(Resolution::Value(Operand::Int(1)), frame.resolve(&Operand::Null));
        frame.reset();
        assert_eq!(Resolution::Value(Operand::Int(1)), frame.resolve(&Operand::Null));
    }

    #[test]
    fn chaotic_steps() {
        let mut frame = Frame::new(Node::Iterate {
            start: Operand::Int(0),
            step: Modulus::new(3.0, 1.0).into(),
        });
        frame.bind(4);
        assert_eq!(
            vec![
                Some(Operand::Float(0.0)),
                Some(Operand::Float(1.0)),
                Some(Operand::Float(2.0)),
                Some(Operand::Float(0.0)),
            ],
            values(&mut frame, &Operand::Null, 4)
        );
    }

    #[test]
    fn input_cycles_tuples_and_steps_generators() {
        let mut frame = Frame::new(Node::Input(Operand::Tuple(vec![
            Operand::Int(5),
            Operand::Int(6),
        ])));
        frame.bind(3);
        assert_eq!(ints(&[5, 6, 5]), values(&mut frame, &Operand::Null, 3));

        let mut frame = Frame::new(Node::Input(Modulus::new(2.0, 1.0).into()));
        frame.bind(3);
        assert_eq!(
            vec![
                Some(Operand::Float(0.0)),
                Some(Operand::Float(1.0)),
                Some(Operand::Float(0.0)),
            ],
            values(&mut frame, &Operand::Null, 3)
        );
    }

    #[test]
    fn choice_follows_numeric_input() {
        let items = vec![Operand::Str("a".into()), Operand::Str("b".into())];
        let mut frame = Frame::new(Node::Choice(items.clone()));
        frame.bind(1);
        assert_eq!(Resolution::Value(items[1].clone()), frame.resolve(&Operand::Int(-1)));
        frame.bind(2);
        assert_eq!(Resolution::Value(items[0].clone()), frame.resolve(&Operand::Null));
        assert_eq!(Resolution::Value(items[1].clone()), frame.resolve(&Operand::Null));
    }

    #[test]
    fn frequency_is_smooth() {
        let mut frame = Frame::new(Node::Frequency(vec![2, 1]));
        frame.bind(6);
        assert_eq!(ints(&[0, 1, 0, 0, 1, 0]), values(&mut frame, &Operand::Null, 6));
    }

    #[test]
    fn empty_lists_block() {
        for node in vec![
            Node::Choice(vec![]),
            Node::Pick(vec![]),
            Node::Foreach(vec![]),
            Node::Cycle(vec![]),
            Node::CountDown(vec![]),
            Node::Frequency(vec![0, 0]),
            Node::Every(0),
        ] {
            let mut frame = Frame::new(node);
            frame.bind(1);
            assert_eq!(Resolution::Blocked, frame.resolve(&Operand::Null));
        }
    }

    #[test]
    fn comparisons_use_the_extracted_field() {
        let low = Operand::Note(Note::default());
        let high = Operand::Note(Note::default() << Degree(5.0));
        let mut frame = Frame::new(Node::Greater(Operand::Int(62)));
        frame.bind(2);
        assert_eq!(Resolution::Blocked, frame.resolve(&low));
        assert_eq!(Resolution::Value(high.clone()), frame.resolve(&high));

        let mut frame = Frame::new(Node::Equal(vec![Degree(5.0).into()]));
        frame.bind(2);
        assert_eq!(Resolution::Blocked, frame.resolve(&low));
        assert_eq!(Resolution::Value(high.clone()), frame.resolve(&high));

        let mut frame = Frame::new(Node::Matches(Note::default().into()));
        frame.bind(2);
        assert_eq!(Resolution::Value(low.clone()), frame.resolve(&low));
        assert_eq!(Resolution::Blocked, frame.resolve(&Operand::Int(1)));
    }

    #[test]
    fn frames_are_read_only_operands() {
        let mut frame = Node::Odd ^ Velocity(9);
        let copy = frame.clone();
        frame.assign(&Operand::Int(3));
        assert_eq!(copy, frame);
        assert_eq!(Operand::Int(9), frame.extract(&Operand::Int(0)));
        assert_eq!(Operand::Frame(Box::new(copy.clone())), frame.extract(&copy.clone().into()));
        assert_eq!(Operand::Frame(Box::new(copy)), frame.combine(Op::Add, &Operand::Int(1)));
    }

    #[test]
    fn state_is_not_serialized() {
        let mut frame = Node::Foreach(vec![Operand::Int(1), Operand::Int(2)]) ^ Velocity(1);
        frame.bind(2);
        frame.resolve(&Operand::Null);
        let json = serde_json::to_string(&frame).unwrap();
        let mut restored: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame, restored);
        restored.bind(2);
        assert_eq!(Resolution::Value(Velocity(1).into()), restored.resolve(&Operand::Null));
    }
}

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

use super::State;
use crate::operand::{Op, Operand, Operate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The kinds of frame nodes.
///
/// Filters such as [`Node::Odd`] or [`Node::Last`] look at the position of the current element
/// in the bound clip, counting from 1. Generators such as [`Node::Foreach`] count how many times
/// they have been reached instead, so a generator behind a filter only advances for the elements
/// the filter lets through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Substitutes a fixed value. Tuples are walked one item per element and chaotic generators
    /// are stepped once per element.
    Input(Operand),
    /// Substitutes a counter that starts at `start` and advances by `step` after each element.
    /// A chaotic `step` is stepped instead and its value added to `start`.
    Iterate { start: Operand, step: Operand },
    /// Picks the item indexed by a numeric input, or the items in turn otherwise.
    Choice(Vec<Operand>),
    /// Like [`Node::Choice`], but never repeats an item until all of them have been picked.
    Pick(Vec<Operand>),
    /// Substitutes the index of the most overdue slot, where each slot comes due once every
    /// period.
    CountDown(Vec<u32>),
    /// Substitutes slot indexes, spread out in proportion to their weights.
    Frequency(Vec<u32>),
    /// Substitutes the items in turn, starting over after the last one.
    Foreach(Vec<Operand>),
    /// Substitutes the items in turn, then blocks.
    Cycle(Vec<Operand>),
    Odd,
    Even,
    /// Passes the elements at the given positions.
    Nth(Vec<usize>),
    /// Passes every nth element.
    Every(usize),
    First,
    Last,
    /// Passes values of the same class as the operand.
    Matches(Operand),
    /// Passes values whose field selected by any of the operands equals it.
    Equal(Vec<Operand>),
    /// Passes values whose fields selected by the operands differ from all of them.
    NotEqual(Vec<Operand>),
    Greater(Operand),
    Less(Operand),
    GreaterEqual(Operand),
    LessEqual(Operand),
    /// Assigns the result of the rest of the chain into a copy of the operand.
    Wrap(Operand),
    /// Extracts the field selected by the operand from the result of the rest of the chain.
    Extract(Operand),
    /// Yields the element being resolved, unless the rest of the chain blocks it.
    Subject,
}

impl Node {
    /// Returns `true` for nodes that resolve the rest of the chain before themselves.
    pub(super) fn is_right(&self) -> bool {
        matches!(self, Node::Wrap(_) | Node::Extract(_) | Node::Subject)
    }

    /// Runs a left node on `input` for the element at position `tick`.
    ///
    /// Returns the value to forward, or `None` to block.
    pub(super) fn pass(&self, state: &mut State, tick: u64, input: Operand) -> Option<Operand> {
        let position = tick as usize;
        let turn = state.calls.saturating_sub(1);
        match self {
            Node::Input(source) => input_value(source, state, turn),
            Node::Iterate { start, step } => Some(iterate(start, step, state)),
            Node::Choice(items) => {
                let items = non_empty("Choice", items)?;
                let index = numeric_index(&input).unwrap_or(turn as i64);
                Some(items[index.rem_euclid(items.len() as i64) as usize].clone())
            }
            Node::Pick(items) => {
                let items = non_empty("Pick", items)?;
                if state.pool.is_empty() {
                    state.pool = (0..items.len()).collect();
                }
                let slot = numeric_index(&input)
                    .map_or(0, |index| index.rem_euclid(state.pool.len() as i64) as usize);
                Some(items[state.pool.remove(slot)].clone())
            }
            Node::CountDown(periods) => count_down(non_empty("CountDown", periods)?, state),
            Node::Frequency(weights) => frequency(non_empty("Frequency", weights)?, state),
            Node::Foreach(items) => {
                let items = non_empty("Foreach", items)?;
                Some(items[turn % items.len()].clone())
            }
            Node::Cycle(items) => non_empty("Cycle", items)?.get(turn).cloned(),
            Node::Odd => pass_if(position % 2 == 1, input),
            Node::Even => pass_if(position % 2 == 0, input),
            Node::Nth(positions) => pass_if(positions.contains(&position), input),
            Node::Every(0) => {
                log::warn!("Every(0) never passes");
                None
            }
            Node::Every(period) => pass_if(position % period == 0, input),
            Node::First => pass_if(position == 1, input),
            Node::Last => match state.len {
                Some(len) => pass_if(position == len, input),
                None => {
                    log::warn!("Last needs a frame bound to a clip");
                    None
                }
            },
            Node::Matches(class) => pass_if(input.same_class(class), input),
            Node::Equal(values) => {
                let values = non_empty("Equal", values)?;
                let equal = values.iter().any(|value| input.extract(value) == *value);
                pass_if(equal, input)
            }
            Node::NotEqual(values) => {
                let values = non_empty("NotEqual", values)?;
                let differs = values.iter().all(|value| input.extract(value) != *value);
                pass_if(differs, input)
            }
            Node::Greater(value) => compare(input, value, |order| order == Ordering::Greater),
            Node::Less(value) => compare(input, value, |order| order == Ordering::Less),
            Node::GreaterEqual(value) => compare(input, value, |order| order != Ordering::Less),
            Node::LessEqual(value) => compare(input, value, |order| order != Ordering::Greater),
            Node::Wrap(_) | Node::Extract(_) | Node::Subject => Some(input),
        }
    }
}

fn pass_if(condition: bool, input: Operand) -> Option<Operand> {
    if condition {
        Some(input)
    } else {
        None
    }
}

fn non_empty<'a, T>(node: &str, items: &'a [T]) -> Option<&'a [T]> {
    if items.is_empty() {
        log::warn!("{} has nothing to choose from", node);
        None
    } else {
        Some(items)
    }
}

fn numeric_index(input: &Operand) -> Option<i64> {
    match input {
        Operand::Int(_) | Operand::Float(_) => input.as_i64(),
        _ => None,
    }
}

fn compare(input: Operand, value: &Operand, accept: impl Fn(Ordering) -> bool) -> Option<Operand> {
    let accepted = input.extract(value).compare(value).map_or(false, accept);
    pass_if(accepted, input)
}

/// Reads the current value of a chaotic generator kept in `slot` and steps it.
fn chaos_value(slot: &mut Option<Operand>, generator: &Operand) -> Option<f64> {
    let chaos = slot.get_or_insert_with(|| generator.clone()).as_chaos_mut()?;
    let value = chaos.value();
    chaos.step();
    Some(value)
}

fn input_value(source: &Operand, state: &mut State, turn: usize) -> Option<Operand> {
    match source {
        Operand::Tuple(items) => {
            let items = non_empty("Input", items)?;
            Some(items[turn % items.len()].clone())
        }
        _ => match chaos_value(&mut state.value, source) {
            Some(value) => Some(Operand::Float(value)),
            None => Some(source.clone()),
        },
    }
}

fn iterate(start: &Operand, step: &Operand, state: &mut State) -> Operand {
    if let Some(value) = chaos_value(&mut state.step, step) {
        return start.combine(Op::Add, &Operand::Float(value));
    }
    let counter = state.value.get_or_insert_with(|| start.clone());
    let current = counter.clone();
    *counter = current.combine(Op::Add, step);
    current
}

/// Every slot counts down by one per element. The lowest slot is chosen, ties going to the
/// lowest index, and is wound back up by its period.
fn count_down(periods: &[u32], state: &mut State) -> Option<Operand> {
    if state.counters.len() != periods.len() {
        state.counters = periods.iter().map(|period| i64::from(*period)).collect();
    }
    for counter in state.counters.iter_mut() {
        *counter -= 1;
    }
    let (slot, _) = state
        .counters
        .iter()
        .enumerate()
        .min_by_key(|(_, counter)| **counter)?;
    state.counters[slot] += i64::from(periods[slot]);
    if let Some(lowest) = state.counters.iter().min().copied() {
        for counter in state.counters.iter_mut() {
            *counter -= lowest;
        }
    }
    Some(Operand::Int(slot as i64))
}

/// Smooth weighted round robin: every slot gains its weight, the richest slot is chosen, ties
/// going to the lowest index, and pays back the total.
fn frequency(weights: &[u32], state: &mut State) -> Option<Operand> {
    let total: i64 = weights.iter().map(|weight| i64::from(*weight)).sum();
    if total == 0 {
        log::warn!("Frequency weights are all zero");
        return None;
    }
    if state.counters.len() != weights.len() {
        state.counters = vec![0; weights.len()];
    }
    for (counter, weight) in state.counters.iter_mut().zip(weights) {
        *counter += i64::from(*weight);
    }
    let mut slot = 0;
    for (index, counter) in state.counters.iter().enumerate() {
        if *counter > state.counters[slot] {
            slot = index;
        }
    }
    state.counters[slot] -= total;
    Some(Operand::Int(slot as i64))
}

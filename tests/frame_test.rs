use operata::{
    clip::Clip,
    element::Note,
    frame::{Frame, Node, Resolution},
    operand::{Operand, Operate},
    unit::Velocity,
};
use pretty_assertions::assert_eq;
use std::convert::TryFrom;

fn notes(count: i64) -> Clip {
    Clip::try_from(&Note::default() * count).unwrap()
}

fn velocities(clip: &Clip) -> Vec<i64> {
    clip.iter()
        .map(|element| match element.extract(&Velocity::default().into()) {
            Operand::Velocity(Velocity(velocity)) => velocity,
            other => panic!("expected a velocity, got {:?}", other),
        })
        .collect()
}

fn resolve_all(frame: &mut Frame, count: usize) -> Vec<Resolution> {
    frame.bind(count);
    (0..count).map(|_| frame.resolve(&Operand::Null)).collect()
}

fn ints(values: &[i64]) -> Vec<Resolution> {
    values
        .iter()
        .map(|value| Resolution::Value(Operand::Int(*value)))
        .collect()
}

#[test]
fn iterate_counts_across_a_clip() {
    let frame = Node::Iterate {
        start: Operand::Int(0),
        step: Operand::Int(2),
    } ^ Velocity::default();
    let clip = notes(4) << frame;
    assert_eq!(vec![0, 2, 4, 6], velocities(&clip));
}

#[test]
fn foreach_wraps_around() {
    let items = vec![Operand::Int(10), Operand::Int(20), Operand::Int(30)];
    let clip = notes(7) << (Node::Foreach(items) ^ Velocity::default());
    assert_eq!(vec![10, 20, 30, 10, 20, 30, 10], velocities(&clip));
}

#[test]
fn generators_behind_filters_only_advance_when_reached() {
    let frame = Node::Odd ^ Node::Foreach(vec![Operand::Int(1), Operand::Int(2)]) ^ Velocity(0);
    let clip = notes(4) << frame;
    assert_eq!(vec![1, 100, 2, 100], velocities(&clip));
}

#[test]
fn pick_exhausts_its_pool_before_repeating() {
    let mut frame = Frame::new(Node::Pick(vec![
        Operand::Int(1),
        Operand::Int(2),
        Operand::Int(3),
    ]));
    assert_eq!(ints(&[1, 2, 3, 1, 2, 3]), resolve_all(&mut frame, 6));

    let mut frame = Node::Input(Operand::Int(1))
        ^ Node::Pick(vec![Operand::Int(10), Operand::Int(20), Operand::Int(30)]);
    assert_eq!(ints(&[20, 30, 10, 20]), resolve_all(&mut frame, 4));
}

#[test]
fn count_down_favours_short_periods() {
    let mut frame = Frame::new(Node::CountDown(vec![5, 1, 5]));
    assert_eq!(ints(&[1, 1, 1, 1, 0, 1]), resolve_all(&mut frame, 6));
}

#[test]
fn nth_counts_from_one() {
    let mut frame = Node::Nth(vec![2, 3]) ^ Velocity::default();
    let passed: Vec<bool> = resolve_all(&mut frame, 4)
        .into_iter()
        .map(|resolution| resolution != Resolution::Blocked)
        .collect();
    assert_eq!(vec![false, true, true, false], passed);
}

#[test]
fn last_needs_a_binding() {
    let mut frame = Frame::new(Node::Last);
    assert_eq!(Resolution::Blocked, frame.resolve(&Operand::Int(1)));
    assert_eq!(
        Resolution::Value(Operand::Int(1)),
        frame.resolve_detached(&Operand::Int(1))
    );

    let clip = notes(3) << (Node::Last ^ Velocity(5));
    assert_eq!(vec![100, 100, 5], velocities(&clip));
}

use operata::{
    clip::Clip,
    element::{ControlChange, Note, Rest, Retrigger, Tuplet},
    frame::Node,
    operand::{Operand, Operate},
    settings::{Settings, Tempo},
    time::{Beat, Position},
    unit::{Degree, Gate, Velocity},
};
use num_rational::Rational64;
use pretty_assertions::assert_eq;
use std::convert::TryFrom;

fn with_rest() -> Clip {
    Clip::sequence(|s| {
        s.play(Note::default());
        s.rest(Rest::default());
        s.play(Note::default() << Degree(5.0));
    })
}

fn times(clip: &Clip, settings: &Settings) -> Vec<f64> {
    clip.playlist(settings, &Position::default())
        .iter()
        .map(|event| event.time_ms)
        .collect()
}

#[test]
fn frames_write_a_melody() {
    let scale = Clip::try_from(&Note::default() * 4).unwrap()
        << Node::Iterate {
            start: Degree(1.0).into(),
            step: Degree(1.0).into(),
        };
    let keys: Vec<Operand> = scale
        .iter()
        .map(|element| element.extract(&Operand::Int(0)))
        .collect();
    assert_eq!(
        vec![
            Operand::Int(60),
            Operand::Int(62),
            Operand::Int(64),
            Operand::Int(65)
        ],
        keys
    );
}

#[test]
fn rests_leave_gaps() {
    let clip = with_rest();
    assert_eq!(
        vec![0.0, 500.0, 1000.0, 1500.0],
        times(&clip, &Settings::default())
    );
    let statuses: Vec<u8> = clip
        .playlist(&Settings::default(), &Position::default())
        .iter()
        .map(|event| event.midi_message.status_byte & 0xF0)
        .collect();
    assert_eq!(vec![0x90, 0x80, 0x90, 0x80], statuses);
}

#[test]
fn tempo_scales_the_playlist() {
    let settings = Settings {
        tempo: Tempo::from_bpm(60.0),
        ..Settings::default()
    };
    assert_eq!(vec![0.0, 1000.0, 2000.0, 3000.0], times(&with_rest(), &settings));
}

#[test]
fn offsets_shift_the_playlist() {
    let later = Position::default() << 1;
    let playlist = with_rest().playlist(&Settings::default(), &later);
    assert_eq!(Some(2000.0), playlist.first().map(|event| event.time_ms));
}

#[test]
fn repeats_keep_their_fields() {
    let accented = with_rest() << (Node::First ^ Velocity(127));
    let twice = Clip::try_from(&accented * 2).unwrap();
    assert_eq!(6, twice.len());
    assert_eq!(
        Operand::Velocity(Velocity(127)),
        twice.elements[3].extract(&Velocity::default().into())
    );
    assert_eq!(Rational64::new(3, 2), twice.length());
}

#[test]
fn automation_sorts_into_the_playlist() {
    let clip = Clip::try_from(&with_rest() + ControlChange::default()).unwrap();
    assert_eq!(4, clip.len());
    let playlist = clip.playlist(&Settings::default(), &Position::default());
    assert_eq!(5, playlist.len());
    assert_eq!(
        2,
        playlist
            .iter()
            .filter(|event| event.time_ms == 0.0)
            .count()
    );
    assert_eq!(4, clip.midilist(&Settings::default(), &Position::default()).len());
}

#[test]
fn float_positions_render_in_order() {
    let position = Position::default() << Operand::Float(0.1234567891234);
    let note = Note::default() << position << Gate(0.987654321);
    let shifted = Note::try_from(&note + Beat(Rational64::new(1, 3))).unwrap();
    let clip = Clip::try_from(&shifted * 3).unwrap();
    let playlist = clip.playlist(&Settings::default(), &Position::default());
    assert_eq!(6, playlist.len());
    assert!((playlist[0].time_ms - 413.580).abs() < 0.01);
    assert!(playlist
        .windows(2)
        .all(|pair| pair[0].time_ms <= pair[1].time_ms));
    assert_eq!(3, clip.midilist(&Settings::default(), &Position::default()).len());
}

#[test]
fn tuplets_and_retriggers_take_their_span_in_a_sequence() {
    let clip = Clip::sequence(|s| {
        s.play(Tuplet::default());
        s.play(Retrigger::default() << 2);
        s.play(Note::default());
    });
    let settings = Settings::default();
    let note_ons: Vec<f64> = clip
        .playlist(&settings, &Position::default())
        .iter()
        .filter(|event| event.midi_message.status_byte & 0xF0 == 0x90)
        .map(|event| event.time_ms)
        .collect();
    assert_eq!(vec![0.0, 333.333, 666.667, 1000.0, 1500.0, 2000.0], note_ons);
}

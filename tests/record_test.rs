use operata::{
    clip::Clip,
    element::{Chord, Clock, Note, Panic},
    error::Error,
    frame::Node,
    operand::Operand,
    record::{load_json, save_json},
    settings::Settings,
    unit::{Degree, Velocity},
};
use pretty_assertions::assert_eq;
use std::{convert::TryFrom, fs};
use tempdir::TempDir;

fn piece() -> Clip {
    Clip::sequence(|s| {
        s.play(Clock::default());
        s.play(Note::default() << Degree(3.0) << Velocity(90));
        s.parallel(|p| {
            p.play(Chord::default());
            p.play(Panic::default());
        });
    })
}

#[test]
fn clips_survive_a_file() {
    let dir = TempDir::new("operata-tests").unwrap();
    let path = dir.path().join("piece.json");

    let operand = Operand::Clip(piece());
    save_json(&path, &operand).unwrap();
    assert_eq!(operand, load_json(&path).unwrap());
}

#[test]
fn loaded_frames_start_over() {
    let dir = TempDir::new("operata-tests").unwrap();
    let path = dir.path().join("frame.json");

    let frame = Node::Foreach(vec![Operand::Int(10), Operand::Int(20)]) ^ Velocity::default();
    save_json(&path, &frame.clone().into()).unwrap();

    let clip = Clip::try_from(&Note::default() * 3).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(clip.clone() << frame, clip << loaded);
}

#[test]
fn bad_files_are_errors() {
    let dir = TempDir::new("operata-tests").unwrap();
    let path = dir.path().join("bad.json");

    assert!(matches!(load_json(&path), Err(Error::Io(_))));

    fs::write(&path, r#"{"class": "Tuba", "parameters": []}"#).unwrap();
    assert!(matches!(load_json(&path), Err(Error::UnknownClass(_))));

    fs::write(&path, "not json").unwrap();
    assert!(matches!(load_json(&path), Err(Error::Json(_))));
}

#[test]
fn settings_load_from_a_file() {
    let dir = TempDir::new("operata-tests").unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"tempo": 60.0, "velocity": 80}"#).unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(60.0, settings.tempo.bpm());
    assert_eq!(Velocity(80), settings.velocity);
    assert_eq!(Settings::default().octave, settings.octave);
}

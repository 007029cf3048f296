use operata::{
    operand::Operand,
    pitch::Pitch,
    scale::{KeySignature, Scale},
    unit::{Degree, Key, Octave, Transposition},
};
use pretty_assertions::assert_eq;
use std::convert::TryFrom;

fn key_signatures() -> impl Iterator<Item = KeySignature> {
    (-7..=7).flat_map(|accidentals| {
        vec![
            KeySignature::new(accidentals, false),
            KeySignature::new(accidentals, true),
        ]
    })
}

/// Pitches built from every key signature, scale override, degree and transposition.
fn altered_pitches() -> Vec<Pitch> {
    let overrides = vec![
        None,
        Scale::from_name("major pentatonic"),
        Scale::from_name("minor"),
        Scale::from_name("harmonic minor"),
        Scale::from_name("blues"),
    ];
    let degrees = [1.0, 2.1, 3.2, 4.0, 5.1, 6.2, 7.0, 9.1, 12.2];
    let mut pitches = Vec::new();
    for key_signature in key_signatures() {
        for scale in &overrides {
            for degree in degrees.iter() {
                for transposition in -9..=9 {
                    let mut pitch = Pitch::new(key_signature, 4);
                    if let Some(scale) = scale {
                        pitch = pitch << *scale;
                    }
                    pitches.push(pitch << Degree(*degree) << Transposition(transposition));
                }
            }
        }
    }
    pitches
}

#[test]
fn absolute_pitches_survive_every_key_signature() {
    for key_signature in key_signatures() {
        for target in 12..=115_i64 {
            let pitch = Pitch::new(key_signature, 4) << target;
            assert_eq!(
                target,
                pitch.pitch_int(),
                "respelling {} in {}",
                target,
                key_signature.name()
            );
        }
    }
}

#[test]
fn octaves_are_idempotent() {
    for key_signature in key_signatures() {
        for degree in 1..=7 {
            let pitch = Pitch::new(key_signature, 4) << Degree(f64::from(degree));
            for octave in 1..=7 {
                let moved = pitch << Octave(octave);
                assert_eq!(Operand::Octave(Octave(octave)), &moved % Octave::default());
                assert_eq!(moved, moved << Octave(octave));
                assert_eq!(0, (moved.pitch_int() - pitch.pitch_int()).rem_euclid(12));
            }
        }
    }
}

#[test]
fn seven_degrees_make_an_octave() {
    for key_signature in key_signatures() {
        for degree in 1..=7 {
            let pitch = Pitch::new(key_signature, 4) << Degree(f64::from(degree));
            let up = Pitch::try_from(&pitch + Degree(7.0)).unwrap();
            let down = Pitch::try_from(&pitch - Degree(7.0)).unwrap();
            assert_eq!(pitch.pitch_int() + 12, up.pitch_int());
            assert_eq!(pitch.pitch_int() - 12, down.pitch_int());
            assert_eq!(pitch.degree(), up.degree());
        }
    }
}

#[test]
fn normalizing_twice_changes_nothing() {
    for pitch in altered_pitches() {
        let mut once = pitch;
        once.normalize();
        let mut twice = once;
        twice.normalize();
        assert_eq!(once, twice);
        assert_eq!(pitch.pitch_int(), once.pitch_int());
    }
}

#[test]
fn key_and_octave_rebuild_the_pitch() {
    for pitch in altered_pitches() {
        let pitch_class = pitch.pitch_int().rem_euclid(12) as u8;
        let rebuilt = Pitch::new(pitch.key_signature(), pitch.octave()) << Key(pitch_class);
        assert_eq!(
            pitch.pitch_int(),
            rebuilt.pitch_int(),
            "rebuilding {} in {}",
            pitch.name(),
            pitch.key_signature().name()
        );
        assert_eq!(pitch.octave(), rebuilt.octave());
    }
}

//! Equal-tempered frequency model.
//!
//! Pitches are addressed by a tonic index into [`NOTES`], an integer
//! semitone offset, and an octave. Octaves in this model start at A, so
//! tonic 0 at [`MIDDLE_OCTAVE`] is the 440 Hz reference and tonic 3 (C)
//! in the same octave lies three semitones above it.

use std::fmt;
use std::str::FromStr;

use crate::error::NoteError;

/// Reference pitch in Hz.
pub const A440: f64 = 440.0;

/// Ratio between adjacent equal-tempered semitones (2^(1/12)).
pub const SEMITONE: f64 = 1.059_463_094_359_295_3;

/// Octave holding the reference pitch.
pub const MIDDLE_OCTAVE: i32 = 4;

/// Chromatic note names, indexed by tonic.
pub const NOTES: [&str; 12] = [
    "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
];

/// Octaves offered to the picker.
pub const OCTAVES: [i32; 7] = [1, 2, 3, 4, 5, 6, 7];

/// Frequency in Hz of `tonic_index` transposed by `semitone_offset`
/// semitones in `octave`.
///
/// Neither index is range checked: negative or large values simply
/// transpose further, and fractional octaves scale smoothly.
pub fn frequency_of(tonic_index: i32, semitone_offset: i32, octave: f64) -> f64 {
    let octave_factor = 2.0_f64.powf(octave - MIDDLE_OCTAVE as f64);
    let tonic_freq = A440 * octave_factor * SEMITONE.powi(tonic_index);
    tonic_freq * SEMITONE.powi(semitone_offset)
}

/// A pitch class plus octave, e.g. `C#5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Index into [`NOTES`], always in `0..12`.
    pub tonic: usize,
    pub octave: i32,
}

impl Note {
    /// Build a note, folding an out-of-table tonic into the neighbouring octave.
    pub fn new(tonic: i32, octave: i32) -> Self {
        Note {
            tonic: tonic.rem_euclid(12) as usize,
            octave: octave + tonic.div_euclid(12),
        }
    }

    pub fn name(&self) -> &'static str {
        NOTES[self.tonic]
    }

    /// Frequency of this note shifted by `semitone_offset`.
    pub fn frequency(&self, semitone_offset: i32) -> f64 {
        frequency_of(self.tonic as i32, semitone_offset, self.octave as f64)
    }

    /// Parse a note such as `"A4"`, `"F#3"` or `"Bb5"`.
    ///
    /// Flats are folded onto the sharp below, which may borrow from the
    /// previous octave (`"Ab4"` is `G#3`).
    pub fn parse(text: &str) -> Result<Note, NoteError> {
        let text = text.trim();
        let mut chars = text.char_indices();
        let (_, letter) = chars.next().ok_or(NoteError::Empty)?;

        let base = NOTES
            .iter()
            .position(|n| n.len() == 1 && n.starts_with(letter.to_ascii_uppercase()))
            .ok_or_else(|| NoteError::UnknownName {
                name: letter.to_string(),
            })? as i32;

        let mut octave_start = letter.len_utf8();
        let accidental = match chars.next() {
            Some((_, '#')) => 1,
            Some((_, 'b')) => -1,
            _ => 0,
        };
        if accidental != 0 {
            octave_start += 1;
        }

        let octave_text = &text[octave_start..];
        let octave: i32 = octave_text.parse().map_err(|_| NoteError::InvalidOctave {
            text: octave_text.to_string(),
        })?;

        Ok(Note::new(base + accidental, octave))
    }
}

impl FromStr for Note {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::parse(s)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        ((a - b) / b).abs() < 1e-9
    }

    #[test]
    fn reference_pitch_is_exact() {
        assert_eq!(frequency_of(0, 0, 4.0), 440.0);
    }

    #[test]
    fn twelve_semitones_is_an_octave() {
        let f = frequency_of(0, 12, 4.0);
        assert!(close(f, 880.0), "Expected 880 Hz, got {f}");
    }

    #[test]
    fn adjacent_semitones_have_constant_ratio() {
        let ratio = 2.0_f64.powf(1.0 / 12.0);
        for tonic in [0, 3, 7, 11] {
            for octave in [1.0, 4.0, 7.0] {
                for n in -24..24 {
                    let r = frequency_of(tonic, n, octave) / frequency_of(tonic, n - 1, octave);
                    assert!(close(r, ratio), "Ratio {r} at tonic {tonic}, n {n}");
                }
            }
        }
    }

    #[test]
    fn octave_scales_by_two() {
        assert!(close(frequency_of(0, 0, 5.0), 880.0));
        assert!(close(frequency_of(0, 0, 3.0), 220.0));
        assert!(close(frequency_of(0, 0, 1.0), 55.0));
    }

    #[test]
    fn fractional_octave_is_accepted() {
        let f = frequency_of(0, 0, 4.5);
        assert!(close(f, 440.0 * 2.0_f64.sqrt()));
    }

    #[test]
    fn negative_offsets_transpose_down() {
        assert!(close(frequency_of(0, -12, 4.0), 220.0));
        assert!(frequency_of(-30, -30, 1.0) > 0.0);
    }

    #[test]
    fn semitone_constant_matches_twelfth_root() {
        assert!((SEMITONE - 2.0_f64.powf(1.0 / 12.0)).abs() < 1e-15);
    }

    #[test]
    fn parse_sharp_and_natural() {
        assert_eq!(Note::parse("A4").unwrap(), Note { tonic: 0, octave: 4 });
        assert_eq!(Note::parse("C#5").unwrap(), Note { tonic: 4, octave: 5 });
        assert_eq!(Note::parse("g#2").unwrap(), Note { tonic: 11, octave: 2 });
    }

    #[test]
    fn parse_flat_borrows_octave() {
        assert_eq!(Note::parse("Ab4").unwrap(), Note { tonic: 11, octave: 3 });
        assert_eq!(Note::parse("Bb4").unwrap(), Note { tonic: 1, octave: 4 });
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Note::parse(""), Err(NoteError::Empty));
        assert!(matches!(Note::parse("H4"), Err(NoteError::UnknownName { .. })));
        assert!(matches!(Note::parse("C#"), Err(NoteError::InvalidOctave { .. })));
    }

    #[test]
    fn display_round_trips_name() {
        let note: Note = "F#3".parse().unwrap();
        assert_eq!(note.to_string(), "F#3");
        assert!(close(note.frequency(0), frequency_of(9, 0, 3.0)));
    }
}

//! Local extrema with an asymmetric look-back / look-forward window.
//!
//! An index `i` qualifies as a maximum when no neighbour inside
//! `[i - look_back, i + look_forward]` is strictly larger and no *earlier*
//! neighbour is equal; among a run of equal values the earliest one wins.
//! The forward edge of the window is clamped at the end of the input, so the
//! last few samples can still qualify. Indices below `look_back` never do.

use std::collections::BTreeMap;

use crate::domain::regression::Point;

pub fn find_maxima(input: &[f64], look_back: usize, look_forward: usize) -> BTreeMap<usize, Point> {
    find_extrema(input, look_back, look_forward, |candidate, other| other > candidate)
}

pub fn find_minima(input: &[f64], look_back: usize, look_forward: usize) -> BTreeMap<usize, Point> {
    find_extrema(input, look_back, look_forward, |candidate, other| other < candidate)
}

fn find_extrema(
    input: &[f64],
    look_back: usize,
    look_forward: usize,
    beats: fn(f64, f64) -> bool,
) -> BTreeMap<usize, Point> {
    let mut out = BTreeMap::new();
    let Some(last) = input.len().checked_sub(1) else {
        return out;
    };

    for i in look_back..input.len() {
        let candidate = input[i];
        let window_end = (i + look_forward).min(last);
        let disqualified = (i - look_back..=window_end).any(|j| {
            j != i && (beats(candidate, input[j]) || (j < i && input[j] == candidate))
        });
        if !disqualified {
            out.insert(
                i,
                Point {
                    x: i as f64,
                    y: candidate,
                },
            );
        }
    }

    out
}

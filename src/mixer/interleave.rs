use rand::Rng;
use rand::seq::SliceRandom;

use crate::spotify::Track;

pub const MAX_MIX_TRACKS: usize = 20;

pub fn interleave(first: &[Track], second: &[Track]) -> Vec<Track> {
    interleave_with(first, second, &mut rand::rng())
}

/// Shuffles each side independently, then takes up to [`MAX_MIX_TRACKS`]
/// tracks alternating first, second, first, ...
///
/// Position `i` draws `side[i % side.len()]`, so a shorter side repeats.
/// The sequence ends as soon as the side due next is empty.
pub fn interleave_with<R: Rng + ?Sized>(first: &[Track], second: &[Track], rng: &mut R) -> Vec<Track> {
    let mut first = first.to_vec();
    let mut second = second.to_vec();
    first.shuffle(rng);
    second.shuffle(rng);

    let mut mixed = Vec::with_capacity(MAX_MIX_TRACKS);
    for i in 0..MAX_MIX_TRACKS {
        let side = if i % 2 == 0 { &first } else { &second };
        if side.is_empty() {
            break;
        }
        mixed.push(side[i % side.len()].clone());
    }
    mixed
}

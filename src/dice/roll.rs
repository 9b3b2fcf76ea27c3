//! Weighted-descent roll engine
//!
//! A roll starts at the top-level faces, picks one face by weight, records
//! its label if visible, then continues with the chosen face's subfaces
//! until it reaches a leaf.

use rand::Rng;

use super::face::Face;
use crate::error::{DiceError, DiceResult};

/// Default separator between the labels of one roll
pub const DEFAULT_SEPARATOR: &str = "-";

/// Pick an index by cumulative weight scan.
///
/// Draws `r` in `[0, total)` and selects the first entry at which the
/// running `r -= weight` reaches `<= 0`. Float drift past the end lands on
/// the last entry. Returns None for an empty layer.
fn pick_weighted<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    let mut r = rng.random::<f64>() * total;
    for (i, weight) in weights.iter().enumerate() {
        r -= weight;
        if r <= 0.0 {
            return Some(i);
        }
    }
    weights.len().checked_sub(1)
}

/// Walk down from an already selected face, collecting visible labels
fn descend<R: Rng + ?Sized>(rng: &mut R, selected: &Face, labels: &mut Vec<String>) {
    let mut current = selected;
    loop {
        if current.visible {
            labels.push(current.face.clone());
        }
        let weights: Vec<f64> = current.subfaces.iter().map(|f| f.weight).collect();
        match pick_weighted(rng, &weights) {
            Some(i) => current = &current.subfaces[i],
            None => break,
        }
    }
}

/// Roll once with the given random source
pub fn roll_once_with<R: Rng + ?Sized>(rng: &mut R, faces: &[Face], separator: &str) -> String {
    let weights: Vec<f64> = faces.iter().map(|f| f.weight).collect();
    let mut labels = Vec::new();
    if let Some(i) = pick_weighted(rng, &weights) {
        descend(rng, &faces[i], &mut labels);
    }
    labels.join(separator)
}

/// Roll once using the thread-local RNG
pub fn roll_once(faces: &[Face], separator: &str) -> String {
    roll_once_with(&mut rand::rng(), faces, separator)
}

fn check_times(times: i64) -> DiceResult<usize> {
    if times <= 0 {
        return Err(DiceError::RollTimesInvalid(times));
    }
    Ok(times as usize)
}

/// Roll `times` times, results in roll order
pub fn roll_many_with<R: Rng + ?Sized>(
    rng: &mut R,
    faces: &[Face],
    times: i64,
    separator: &str,
) -> DiceResult<Vec<String>> {
    let times = check_times(times)?;
    Ok((0..times)
        .map(|_| roll_once_with(rng, faces, separator))
        .collect())
}

pub fn roll_many(faces: &[Face], times: i64, separator: &str) -> DiceResult<Vec<String>> {
    roll_many_with(&mut rand::rng(), faces, times, separator)
}

/// Roll `times` times, never drawing the same top-level face twice.
///
/// Subfaces below the drawn face are rolled normally.
pub fn roll_many_without_replacement_with<R: Rng + ?Sized>(
    rng: &mut R,
    faces: &[Face],
    times: i64,
    separator: &str,
) -> DiceResult<Vec<String>> {
    let count = check_times(times)?;
    if count > faces.len() {
        return Err(DiceError::RollTimesInvalid(times));
    }

    let mut pool: Vec<&Face> = faces.iter().collect();
    let mut results = Vec::with_capacity(count);
    for _ in 0..count {
        let weights: Vec<f64> = pool.iter().map(|f| f.weight).collect();
        let mut labels = Vec::new();
        if let Some(i) = pick_weighted(rng, &weights) {
            let selected = pool.remove(i);
            descend(rng, selected, &mut labels);
        }
        results.push(labels.join(separator));
    }
    Ok(results)
}

pub fn roll_many_without_replacement(
    faces: &[Face],
    times: i64,
    separator: &str,
) -> DiceResult<Vec<String>> {
    roll_many_without_replacement_with(&mut rand::rng(), faces, times, separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use std::collections::{HashMap, HashSet};

    /// Always yields the same word, so `random::<f64>()` is fixed
    struct ConstRng(u64);

    impl RngCore for ConstRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            for b in dst {
                *b = self.0 as u8;
            }
        }
    }

    fn flat(labels: &[&str]) -> Vec<Face> {
        labels.iter().map(|l| Face::leaf(*l)).collect()
    }

    #[test]
    fn test_empty_faces() {
        assert_eq!(roll_once(&[], "-"), "");
    }

    #[test]
    fn test_single_face_is_deterministic() {
        let faces = flat(&["only"]);
        for _ in 0..100 {
            assert_eq!(roll_once(&faces, "-"), "only");
        }
    }

    #[test]
    fn test_zero_draw_selects_first() {
        let faces = flat(&["a", "b", "c"]);
        assert_eq!(roll_once_with(&mut ConstRng(0), &faces, "-"), "a");
    }

    #[test]
    fn test_max_draw_selects_last() {
        let faces = flat(&["a", "b", "c"]);
        assert_eq!(roll_once_with(&mut ConstRng(u64::MAX), &faces, "-"), "c");
    }

    #[test]
    fn test_uniform_distribution() {
        let faces = flat(&["1", "2", "3", "4", "5", "6"]);
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 60_000;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..trials {
            *counts.entry(roll_once_with(&mut rng, &faces, "-")).or_default() += 1;
        }

        assert_eq!(counts.len(), 6);
        let expected = trials as f64 / 6.0;
        for (label, count) in &counts {
            let deviation = (*count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "face {} rolled {} times", label, count);
        }
    }

    #[test]
    fn test_weights_bias_selection() {
        let faces = vec![Face::leaf("heavy").with_weight(9.0), Face::leaf("light")];
        let mut rng = StdRng::seed_from_u64(7);
        let heavy = (0..10_000)
            .filter(|_| roll_once_with(&mut rng, &faces, "-") == "heavy")
            .count();
        assert!((8_700..=9_300).contains(&heavy), "heavy rolled {}", heavy);
    }

    #[test]
    fn test_nested_descent_joins_labels() {
        let faces = vec![Face::leaf("weapon").with_subfaces(vec![
            Face::leaf("sword").with_subfaces(vec![Face::leaf("rusty")]),
        ])];
        assert_eq!(roll_once(&faces, "-"), "weapon-sword-rusty");
        assert_eq!(roll_once(&faces, " / "), "weapon / sword / rusty");
    }

    #[test]
    fn test_hidden_faces_emit_nothing() {
        let faces = vec![Face::leaf("table")
            .hidden()
            .with_subfaces(vec![Face::leaf("goblin"), Face::leaf("orc")])];
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let result = roll_once_with(&mut rng, &faces, "-");
            assert!(result == "goblin" || result == "orc", "got {}", result);
        }
    }

    #[test]
    fn test_only_selected_path_emitted() {
        let faces = vec![
            Face::leaf("a").with_subfaces(vec![Face::leaf("a1"), Face::leaf("a2")]),
            Face::leaf("b").with_subfaces(vec![Face::leaf("b1")]),
        ];
        let allowed: HashSet<&str> = ["a-a1", "a-a2", "b-b1"].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let result = roll_once_with(&mut rng, &faces, "-");
            assert!(allowed.contains(result.as_str()), "unexpected {}", result);
        }
    }

    #[test]
    fn test_roll_many_count_and_validation() {
        let faces = flat(&["x"]);
        assert_eq!(roll_many(&faces, 3, "-").unwrap(), vec!["x", "x", "x"]);
        assert!(matches!(
            roll_many(&faces, 0, "-"),
            Err(DiceError::RollTimesInvalid(0))
        ));
        assert!(matches!(
            roll_many(&faces, -1, "-"),
            Err(DiceError::RollTimesInvalid(-1))
        ));
        // Large counts are plain positive integers
        assert_eq!(roll_many(&faces, 1001, "-").unwrap().len(), 1001);
    }

    #[test]
    fn test_without_replacement_draws_each_once() {
        let faces = flat(&["a", "b", "c", "d"]);
        let mut rng = StdRng::seed_from_u64(11);
        let results = roll_many_without_replacement_with(&mut rng, &faces, 4, "-").unwrap();
        let unique: HashSet<&String> = results.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_without_replacement_too_many() {
        let faces = flat(&["a", "b"]);
        assert!(matches!(
            roll_many_without_replacement(&faces, 3, "-"),
            Err(DiceError::RollTimesInvalid(3))
        ));
    }
}

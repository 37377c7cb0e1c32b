use rand::Rng;

/// In-place Fisher–Yates shuffle: walks from the last index down to 1 and swaps
/// each element with a uniformly chosen element at an index no greater than its own.
/// Position uniformity is checked by `test_every_position_equally_likely`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items = vec![1, 2, 3, 4, 5, 6, 7, 8];

        fisher_yates(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_shuffle_empty_and_single() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut empty: Vec<u8> = Vec::new();
        fisher_yates(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut single = vec!['a'];
        fisher_yates(&mut single, &mut rng);
        assert_eq!(single, vec!['a']);
    }

    #[test]
    fn test_every_position_equally_likely() {
        const TRIALS: usize = 40_000;
        let mut rng = StdRng::seed_from_u64(2024);
        let mut landed = [0usize; 4];

        for _ in 0..TRIALS {
            // Element 0 plays the correct answer, always generated first.
            let mut items = [0, 1, 2, 3];
            fisher_yates(&mut items, &mut rng);
            let position = items.iter().position(|&x| x == 0).unwrap();
            landed[position] += 1;
        }

        let expected = TRIALS / 4;
        for count in landed {
            assert!(
                count.abs_diff(expected) < 500,
                "positional bias: {landed:?}"
            );
        }
    }
}

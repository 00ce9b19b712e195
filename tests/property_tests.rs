#[cfg(test)]
mod property_tests {
    use ndarray::Array1;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use signal_dqn::action::{argmax, from_one_hot, one_hot};
    use signal_dqn::agent::EpsilonGreedy;
    use signal_dqn::replay_buffer::{ReplayBuffer, Transition};
    use std::collections::HashSet;

    fn transition(id: usize) -> Transition {
        Transition::new(
            Array1::from_elem(1, id as f32),
            0,
            0.0,
            Array1::from_elem(1, id as f32 + 1.0),
            false,
        )
    }

    proptest! {
        #[test]
        fn test_buffer_keeps_most_recent(capacity in 1usize..50, pushes in 0usize..200) {
            let mut buffer = ReplayBuffer::new(capacity, 1).unwrap();
            for id in 0..pushes {
                buffer.push(transition(id)).unwrap();
            }

            prop_assert_eq!(buffer.len(), pushes.min(capacity));
            let kept: Vec<usize> = buffer.iter().map(|t| t.state[0] as usize).collect();
            let expected: Vec<usize> = (pushes.saturating_sub(capacity)..pushes).collect();
            prop_assert_eq!(kept, expected);
        }

        #[test]
        fn test_sample_is_distinct_subset(
            len in 1usize..60,
            batch in 1usize..60,
            seed in any::<u64>(),
        ) {
            let mut buffer = ReplayBuffer::new(64, 1).unwrap();
            for id in 0..len {
                buffer.push(transition(id)).unwrap();
            }
            let mut rng = StdRng::seed_from_u64(seed);

            match buffer.sample(batch, &mut rng) {
                Ok(sample) => {
                    prop_assert!(batch <= len);
                    prop_assert_eq!(sample.len(), batch);
                    let ids: HashSet<usize> = sample.iter().map(|t| t.state[0] as usize).collect();
                    prop_assert_eq!(ids.len(), batch);
                    prop_assert!(ids.iter().all(|&id| id < len));
                }
                Err(err) => {
                    prop_assert!(batch > len);
                    prop_assert!(err.is_insufficient_data());
                }
            }
        }

        #[test]
        fn test_epsilon_stays_within_bounds(
            start in 0.0f32..=1.0,
            floor_ratio in 0.0f32..=1.0,
            decay in 0.5f32..=1.0,
            steps in 0usize..500,
        ) {
            let floor = start * floor_ratio;
            let mut schedule = EpsilonGreedy::new(start, floor, decay).unwrap();
            let mut previous = schedule.value();
            for _ in 0..steps {
                let next = schedule.decay();
                prop_assert!(next <= previous);
                prop_assert!(next >= floor);
                previous = next;
            }
        }

        #[test]
        fn test_one_hot_inverts(dim in 1usize..32, action in 0usize..32) {
            match one_hot(action, dim) {
                Ok(switches) => {
                    prop_assert!(action < dim);
                    prop_assert_eq!(from_one_hot(&switches).unwrap(), action);
                }
                Err(_) => prop_assert!(action >= dim),
            }
        }

        #[test]
        fn test_argmax_is_a_maximum(values in prop::collection::vec(-1e6f32..1e6, 1..20)) {
            let best = argmax(values.iter().copied()).unwrap();
            prop_assert!(values.iter().all(|&v| v <= values[best]));
            prop_assert!(values[..best].iter().all(|&v| v < values[best]));
        }
    }
}

use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use crate::error::DqnError;
use crate::replay_buffer::{ReplayBuffer, Transition};

fn transition(id: usize) -> Transition {
    Transition::new(
        array![id as f32, 0.0],
        0,
        id as f32,
        array![id as f32 + 1.0, 0.0],
        false,
    )
}

fn ids(buffer: &ReplayBuffer) -> Vec<usize> {
    buffer.iter().map(|t| t.state[0] as usize).collect()
}

#[test]
fn test_replay_buffer_add_and_sample() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut buffer = ReplayBuffer::new(10, 2).unwrap();
    let experience = transition(1);
    buffer.push(experience.clone()).unwrap();
    assert_eq!(buffer.len(), 1);
    let sample = buffer.sample(1, &mut rng).unwrap();
    assert_eq!(sample[0], &experience);
}

#[test]
fn test_fifo_eviction_keeps_newest() {
    let mut buffer = ReplayBuffer::new(5, 2).unwrap();
    for id in 1..=7 {
        buffer.push(transition(id)).unwrap();
    }
    assert_eq!(buffer.len(), 5);
    assert_eq!(ids(&buffer), vec![3, 4, 5, 6, 7]);
}

#[test]
fn test_occupancy_never_exceeds_capacity() {
    let mut buffer = ReplayBuffer::new(3, 2).unwrap();
    for id in 0..50 {
        buffer.push(transition(id)).unwrap();
        assert!(buffer.len() <= buffer.capacity());
    }
    assert_eq!(ids(&buffer), vec![47, 48, 49]);
}

#[test]
fn test_sample_fails_when_underfilled() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut buffer = ReplayBuffer::new(10, 2).unwrap();
    for id in 0..4 {
        buffer.push(transition(id)).unwrap();
    }
    match buffer.sample(5, &mut rng) {
        Err(DqnError::InsufficientData {
            requested,
            available,
        }) => {
            assert_eq!(requested, 5);
            assert_eq!(available, 4);
        }
        other => panic!("expected InsufficientData, got {:?}", other.map(|b| b.len())),
    }
}

#[test]
fn test_sample_returns_distinct_transitions() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut buffer = ReplayBuffer::new(20, 2).unwrap();
    for id in 0..20 {
        buffer.push(transition(id)).unwrap();
    }
    for batch_size in [1, 7, 20] {
        let batch = buffer.sample(batch_size, &mut rng).unwrap();
        assert_eq!(batch.len(), batch_size);
        let unique: HashSet<usize> = batch.iter().map(|t| t.state[0] as usize).collect();
        assert_eq!(unique.len(), batch_size);
    }
}

#[test]
fn test_sampling_covers_whole_buffer() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut buffer = ReplayBuffer::new(8, 2).unwrap();
    for id in 0..8 {
        buffer.push(transition(id)).unwrap();
    }
    let mut counts = [0usize; 8];
    for _ in 0..4000 {
        for t in buffer.sample(2, &mut rng).unwrap() {
            counts[t.state[0] as usize] += 1;
        }
    }
    // Each id is expected 1000 times.
    for &count in counts.iter() {
        assert!(count > 850 && count < 1150, "count {} far from uniform", count);
    }
}

#[test]
fn test_push_rejects_wrong_state_length() {
    let mut buffer = ReplayBuffer::new(4, 2).unwrap();
    let bad_state = Transition::new(array![1.0], 0, 0.0, array![1.0, 2.0], false);
    assert!(matches!(
        buffer.push(bad_state),
        Err(DqnError::ShapeMismatch {
            what: "state",
            expected: 2,
            actual: 1
        })
    ));

    let bad_next = Transition::new(array![1.0, 2.0], 0, 0.0, Array1::zeros(3), false);
    assert!(matches!(
        buffer.push(bad_next),
        Err(DqnError::ShapeMismatch {
            what: "next_state",
            ..
        })
    ));
    assert!(buffer.is_empty());
}

#[test]
fn test_zero_capacity_is_rejected() {
    assert!(ReplayBuffer::new(0, 2).is_err());
    assert!(ReplayBuffer::new(2, 0).is_err());
}

#[test]
fn test_clear_empties_buffer() {
    let mut buffer = ReplayBuffer::new(4, 2).unwrap();
    buffer.push(transition(0)).unwrap();
    buffer.clear();
    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), 4);
}

//! Mapping between the canonical discrete action and multi-binary controls.
//!
//! The agent always acts with an index in `0..action_dim`. Adapters that drive
//! one on/off switch per signal turn index `i` into a vector with only switch
//! `i` set.

use crate::error::{DqnError, Result};

/// Switch vector of length `action_dim` with only `action` set.
pub fn one_hot(action: usize, action_dim: usize) -> Result<Vec<bool>> {
    if action >= action_dim {
        return Err(DqnError::InvalidAction { action, action_dim });
    }
    let mut switches = vec![false; action_dim];
    switches[action] = true;
    Ok(switches)
}

/// Inverse of [`one_hot`]. Fails unless exactly one switch is set.
pub fn from_one_hot(switches: &[bool]) -> Result<usize> {
    let mut set = switches
        .iter()
        .enumerate()
        .filter(|&(_, &on)| on)
        .map(|(i, _)| i);

    match (set.next(), set.next()) {
        (Some(index), None) => Ok(index),
        _ => Err(DqnError::invalid_parameter(
            "switches",
            "expected exactly one active switch",
        )),
    }
}

/// Index of the largest value, lowest index on ties. NaN never wins.
pub fn argmax(values: impl IntoIterator<Item = f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in values.into_iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hot_round_trip() {
        let switches = one_hot(2, 4).unwrap();
        assert_eq!(switches, vec![false, false, true, false]);
        assert_eq!(from_one_hot(&switches).unwrap(), 2);
    }

    #[test]
    fn test_one_hot_rejects_out_of_range() {
        assert!(matches!(
            one_hot(4, 4),
            Err(DqnError::InvalidAction { action: 4, action_dim: 4 })
        ));
    }

    #[test]
    fn test_from_one_hot_rejects_multiple_or_none() {
        assert!(from_one_hot(&[true, true]).is_err());
        assert!(from_one_hot(&[false, false]).is_err());
    }

    #[test]
    fn test_argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(vec![1.0, 3.0, 3.0]), Some(1));
        assert_eq!(argmax(vec![f32::NAN, 0.5]), Some(1));
        assert_eq!(argmax(Vec::<f32>::new()), None);
    }
}

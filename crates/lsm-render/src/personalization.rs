//! Personalization state applied to every rendered frame
//!
//! Zone arrays have a fixed capacity of [`MAX_NUM_PERSONALIZATION_ZONES`].
//! A write is validated in full before any entry changes: too many entries
//! or one out-of-range value rejects the whole write and keeps the previous
//! state. Entries past the written length keep their previous values.

use lsm_core::{LsmError, LsmResult, MAX_NUM_PERSONALIZATION_ZONES};
use tracing::{debug, warn};

use crate::RenderParams;

/// Default global lightness
pub const DEFAULT_LIGHTNESS: f32 = 1.0;

/// Fixed-capacity zone array with a logical length
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneArray<T: Copy> {
    values: [T; MAX_NUM_PERSONALIZATION_ZONES],
    len: usize,
}

impl<T: Copy> ZoneArray<T> {
    pub fn filled(value: T) -> Self {
        ZoneArray {
            values: [value; MAX_NUM_PERSONALIZATION_ZONES],
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        MAX_NUM_PERSONALIZATION_ZONES
    }

    /// Number of zones set by the last accepted write
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Explicitly configured zones
    pub fn as_slice(&self) -> &[T] {
        &self.values[..self.len]
    }

    /// Every zone, as handed to the engine
    pub fn as_array(&self) -> &[T; MAX_NUM_PERSONALIZATION_ZONES] {
        &self.values
    }

    /// Overwrite the leading zones; all or nothing
    pub fn try_assign(&mut self, values: &[T]) -> LsmResult<()> {
        if values.len() > MAX_NUM_PERSONALIZATION_ZONES {
            return Err(LsmError::ZoneCapacityExceeded {
                requested: values.len(),
                capacity: MAX_NUM_PERSONALIZATION_ZONES,
            });
        }
        self.values[..values.len()].copy_from_slice(values);
        self.len = values.len();
        Ok(())
    }
}

/// Lightness and zone immersion parameters
#[derive(Clone, Debug, PartialEq)]
pub struct PersonalizationState {
    lightness: f32,
    zone_immersion: ZoneArray<f32>,
    zone_low_immersion: ZoneArray<bool>,
}

impl PersonalizationState {
    pub fn new() -> Self {
        PersonalizationState {
            lightness: DEFAULT_LIGHTNESS,
            zone_immersion: ZoneArray::filled(1.0),
            zone_low_immersion: ZoneArray::filled(false),
        }
    }

    pub fn lightness(&self) -> f32 {
        self.lightness
    }

    pub fn zone_immersion(&self) -> &ZoneArray<f32> {
        &self.zone_immersion
    }

    pub fn zone_low_immersion(&self) -> &ZoneArray<bool> {
        &self.zone_low_immersion
    }

    pub fn set_lightness(&mut self, lightness: f32) -> LsmResult<()> {
        if !(0.0..=1.0).contains(&lightness) {
            warn!(lightness, "lightness outside [0, 1], ignoring");
            return Err(LsmError::InvalidProperty(format!(
                "lightness {} outside [0, 1]",
                lightness
            )));
        }
        self.lightness = lightness;
        debug!(lightness, "lightness updated");
        Ok(())
    }

    /// Set immersion levels from percentages (0-100)
    pub fn set_zone_immersion_levels(&mut self, levels: &[i32]) -> LsmResult<()> {
        check_zone_count(levels.len())?;

        if let Some(bad) = levels.iter().find(|l| !(0..=100).contains(*l)) {
            warn!(level = bad, "zone immersion level outside [0, 100], ignoring write");
            return Err(LsmError::InvalidProperty(format!(
                "zone immersion level {} outside [0, 100]",
                bad
            )));
        }

        let mapped: Vec<f32> = levels.iter().map(|&l| l as f32 / 100.0).collect();
        self.zone_immersion.try_assign(&mapped)?;
        debug!(zones = levels.len(), "zone immersion levels updated");
        Ok(())
    }

    /// Set per-zone low immersion flags (0 = high, 1 = low)
    pub fn set_zone_low_immersion(&mut self, flags: &[i32]) -> LsmResult<()> {
        check_zone_count(flags.len())?;

        if let Some(bad) = flags.iter().find(|f| !(0..=1).contains(*f)) {
            warn!(flag = bad, "zone low immersion flag not 0 or 1, ignoring write");
            return Err(LsmError::InvalidProperty(format!(
                "zone low immersion flag {} not 0 or 1",
                bad
            )));
        }

        let mapped: Vec<bool> = flags.iter().map(|&f| f == 1).collect();
        self.zone_low_immersion.try_assign(&mapped)?;
        debug!(zones = flags.len(), "zone low immersion updated");
        Ok(())
    }

    /// Configured immersion levels as percentages
    pub fn zone_immersion_levels(&self) -> Vec<i32> {
        self.zone_immersion
            .as_slice()
            .iter()
            .map(|&v| (v * 100.0).round() as i32)
            .collect()
    }

    /// Configured low immersion flags as 0/1
    pub fn zone_low_immersion_flags(&self) -> Vec<i32> {
        self.zone_low_immersion
            .as_slice()
            .iter()
            .map(|&low| i32::from(low))
            .collect()
    }

    pub fn params(&self) -> RenderParams<'_> {
        RenderParams {
            zone_immersion: self.zone_immersion.as_array(),
            zone_low_immersion: self.zone_low_immersion.as_array(),
            lightness: self.lightness,
        }
    }
}

impl Default for PersonalizationState {
    fn default() -> Self {
        PersonalizationState::new()
    }
}

fn check_zone_count(requested: usize) -> LsmResult<()> {
    if requested > MAX_NUM_PERSONALIZATION_ZONES {
        warn!(
            requested,
            max = MAX_NUM_PERSONALIZATION_ZONES,
            "too many immersion zones specified"
        );
        return Err(LsmError::ZoneCapacityExceeded {
            requested,
            capacity: MAX_NUM_PERSONALIZATION_ZONES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const Z: usize = MAX_NUM_PERSONALIZATION_ZONES;

    #[test]
    fn test_defaults() {
        let state = PersonalizationState::new();
        assert_eq!(state.lightness(), 1.0);
        assert!(state.zone_immersion().as_array().iter().all(|&v| v == 1.0));
        assert!(state.zone_low_immersion().as_array().iter().all(|&low| !low));
        assert!(state.zone_immersion().is_empty());
    }

    #[test]
    fn test_immersion_levels_mapped() {
        let mut state = PersonalizationState::new();
        state.set_zone_immersion_levels(&[0, 50, 100]).unwrap();

        let zones = state.zone_immersion().as_array();
        assert_eq!(zones[0], 0.0);
        assert_eq!(zones[1], 0.5);
        assert_eq!(zones[2], 1.0);
        assert_eq!(zones[3], 1.0);
        assert_eq!(state.zone_immersion_levels(), vec![0, 50, 100]);
    }

    #[test]
    fn test_shorter_write_keeps_tail() {
        let mut state = PersonalizationState::new();
        state.set_zone_immersion_levels(&[10, 20, 30]).unwrap();
        state.set_zone_immersion_levels(&[90]).unwrap();

        let zones = state.zone_immersion().as_array();
        assert_eq!(zones[0], 0.9);
        assert_eq!(zones[1], 0.2);
        assert_eq!(state.zone_immersion().len(), 1);
    }

    #[test]
    fn test_capacity_overflow_rejected() {
        let mut state = PersonalizationState::new();
        state.set_zone_immersion_levels(&[40; Z]).unwrap();
        let before = state.clone();

        let result = state.set_zone_immersion_levels(&[0; Z + 1]);
        assert!(matches!(
            result,
            Err(LsmError::ZoneCapacityExceeded {
                requested,
                capacity: Z
            }) if requested == Z + 1
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_out_of_range_rejected_in_full() {
        let mut state = PersonalizationState::new();
        let before = state.clone();

        assert!(state.set_zone_immersion_levels(&[10, 101]).is_err());
        assert!(state.set_zone_low_immersion(&[1, 2]).is_err());
        assert!(state.set_lightness(1.5).is_err());
        assert!(state.set_lightness(f32::NAN).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_low_immersion_flags() {
        let mut state = PersonalizationState::new();
        state.set_zone_low_immersion(&[1, 0, 1]).unwrap();
        let params = state.params();
        assert!(params.zone_low_immersion[0]);
        assert!(!params.zone_low_immersion[1]);
        assert!(params.zone_low_immersion[2]);
        assert_eq!(state.zone_low_immersion_flags(), vec![1, 0, 1]);
    }

    proptest! {
        #[test]
        fn prop_overflowing_writes_never_apply(
            initial in proptest::collection::vec(0i32..=100, 0..=Z),
            extra in 1usize..8,
            value in 0i32..=100,
        ) {
            let mut state = PersonalizationState::new();
            state.set_zone_immersion_levels(&initial).unwrap();
            let before = state.clone();

            prop_assert!(state.set_zone_immersion_levels(&vec![value; Z + extra]).is_err());
            prop_assert!(state.set_zone_low_immersion(&vec![1; Z + extra]).is_err());
            prop_assert_eq!(state, before);
        }
    }
}

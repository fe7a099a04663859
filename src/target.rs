use std::hash::Hash;

const WEIGHT_SATURATION: f32 = 0.24;
const WEIGHT_LUMA: f32 = 0.52;
const WEIGHT_POPULATION: f32 = 0.24;

const MIN_VIBRANT_SATURATION: f32 = 0.35;
const TARGET_VIBRANT_SATURATION: f32 = 1.0;

const TARGET_MUTED_SATURATION: f32 = 0.3;
const MAX_MUTED_SATURATION: f32 = 0.4;

const MIN_LIGHT_LUMA: f32 = 0.55;
const TARGET_LIGHT_LUMA: f32 = 0.74;

const TARGET_DARK_LUMA: f32 = 0.26;
const MAX_DARK_LUMA: f32 = 0.45;

const MIN_NORMAL_LUMA: f32 = 0.3;
const TARGET_NORMAL_LUMA: f32 = 0.5;
const MAX_NORMAL_LUMA: f32 = 0.7;

const VIBRANT_SATURATION: (f32, f32, f32) = (MIN_VIBRANT_SATURATION, TARGET_VIBRANT_SATURATION, 1.0);
const MUTED_SATURATION: (f32, f32, f32) = (0.0, TARGET_MUTED_SATURATION, MAX_MUTED_SATURATION);
const LIGHT_LIGHTNESS: (f32, f32, f32) = (MIN_LIGHT_LUMA, TARGET_LIGHT_LUMA, 1.0);
const NORMAL_LIGHTNESS: (f32, f32, f32) = (MIN_NORMAL_LUMA, TARGET_NORMAL_LUMA, MAX_NORMAL_LUMA);
const DARK_LIGHTNESS: (f32, f32, f32) = (0.0, TARGET_DARK_LUMA, MAX_DARK_LUMA);

/// A target profile describing which swatch to select from a palette.
///
/// A target is identified by its id, not by its values: two targets built with the same values are
/// still different targets. The six built-in targets are constants and every copy of them refers to
/// the same target. Use [`TargetBuilder`] to create custom targets.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Target {
    name: u64,
    // min, target, max
    saturation_targets: (f32, f32, f32),
    // min, target, max
    lightness_targets: (f32, f32, f32),
    // sat, luma, pop
    weights: (f32, f32, f32),
    is_exclusive: bool,
}

impl Target {
    /// A target which has the characteristics of a vibrant color which is light in luminance.
    pub const LIGHT_VIBRANT: Target = Target::preset(0, VIBRANT_SATURATION, LIGHT_LIGHTNESS);
    /// A target which has the characteristics of a vibrant color which is neither light or dark.
    pub const VIBRANT: Target = Target::preset(1, VIBRANT_SATURATION, NORMAL_LIGHTNESS);
    /// A target which has the characteristics of a vibrant color which is dark in luminance.
    pub const DARK_VIBRANT: Target = Target::preset(2, VIBRANT_SATURATION, DARK_LIGHTNESS);
    /// A target which has the characteristics of a muted color which is light in luminance.
    pub const LIGHT_MUTED: Target = Target::preset(3, MUTED_SATURATION, LIGHT_LIGHTNESS);
    /// A target which has the characteristics of a muted color which is neither light or dark.
    pub const MUTED: Target = Target::preset(4, MUTED_SATURATION, NORMAL_LIGHTNESS);
    /// A target which has the characteristics of a muted color which is dark in luminance.
    pub const DARK_MUTED: Target = Target::preset(5, MUTED_SATURATION, DARK_LIGHTNESS);

    /// The built-in targets, in the order a palette processes them.
    pub fn default_targets() -> [Target; 6] {
        [
            Target::LIGHT_VIBRANT,
            Target::VIBRANT,
            Target::DARK_VIBRANT,
            Target::LIGHT_MUTED,
            Target::MUTED,
            Target::DARK_MUTED,
        ]
    }

    /// A new target with a fresh identity, accepting any saturation and lightness and preferring the
    /// middle of both.
    pub fn new() -> Self {
        Self {
            name: rand::random(),
            saturation_targets: (0.0, 0.5, 1.0),
            lightness_targets: (0.0, 0.5, 1.0),
            weights: (WEIGHT_SATURATION, WEIGHT_LUMA, WEIGHT_POPULATION),
            is_exclusive: true,
        }
    }

    const fn preset(name: u64, saturation_targets: (f32, f32, f32), lightness_targets: (f32, f32, f32)) -> Self {
        Self {
            name,
            saturation_targets,
            lightness_targets,
            weights: (WEIGHT_SATURATION, WEIGHT_LUMA, WEIGHT_POPULATION),
            is_exclusive: true,
        }
    }

    pub(crate) fn id(self) -> u64 {
        self.name
    }

    /// Rescale the positive weights so all the weights sum up to 1. Weights that are zero or
    /// negative are left as they are, and nothing changes if the weights sum up to zero.
    pub fn normalize_weights(&mut self) {
        let weights_sum = self.weights.0 + self.weights.1 + self.weights.2;

        if weights_sum != 0.0 {
            if self.weights.0 > 0.0 {
                self.weights.0 /= weights_sum;
            }

            if self.weights.1 > 0.0 {
                self.weights.1 /= weights_sum;
            }

            if self.weights.2 > 0.0 {
                self.weights.2 /= weights_sum;
            }
        }
    }

    pub fn minimum_saturation(self) -> f32 {
        self.saturation_targets.0
    }

    pub fn target_saturation(self) -> f32 {
        self.saturation_targets.1
    }

    pub fn maximum_saturation(self) -> f32 {
        self.saturation_targets.2
    }

    pub fn minimum_lightness(self) -> f32 {
        self.lightness_targets.0
    }

    pub fn target_lightness(self) -> f32 {
        self.lightness_targets.1
    }

    pub fn maximum_lightness(self) -> f32 {
        self.lightness_targets.2
    }

    pub fn saturation_weight(self) -> f32 {
        self.weights.0
    }

    pub fn lightness_weight(self) -> f32 {
        self.weights.1
    }

    pub fn population_weight(self) -> f32 {
        self.weights.2
    }

    pub fn is_exclusive(self) -> bool {
        self.is_exclusive
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new()
    }
}

impl Eq for Target {}
impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for Target {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Builder for custom [`Target`]s.
///
/// Saturation and lightness values should be within `[0, 1]` and weights should be non-negative;
/// the builder doesn't check either.
///
/// ```
/// use vibrance::{Target, TargetBuilder};
///
/// let target = TargetBuilder::from_target(Target::VIBRANT)
///     .minimum_lightness(0.4)
///     .population_weight(0.0)
///     .build();
///
/// assert_ne!(target, Target::VIBRANT);
/// assert_eq!(target.minimum_saturation(), Target::VIBRANT.minimum_saturation());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetBuilder {
    target: Target,
}

impl TargetBuilder {
    pub fn new() -> Self {
        Self { target: Target::new() }
    }

    /// Start from the values of an existing target. The built target gets a new identity, so it
    /// never replaces the target it was copied from.
    pub fn from_target(target: Target) -> Self {
        Self {
            target: Target {
                name: rand::random(),
                ..target
            },
        }
    }

    pub fn minimum_saturation(mut self, value: f32) -> Self {
        self.target.saturation_targets.0 = value;
        self
    }

    pub fn target_saturation(mut self, value: f32) -> Self {
        self.target.saturation_targets.1 = value;
        self
    }

    pub fn maximum_saturation(mut self, value: f32) -> Self {
        self.target.saturation_targets.2 = value;
        self
    }

    pub fn minimum_lightness(mut self, value: f32) -> Self {
        self.target.lightness_targets.0 = value;
        self
    }

    pub fn target_lightness(mut self, value: f32) -> Self {
        self.target.lightness_targets.1 = value;
        self
    }

    pub fn maximum_lightness(mut self, value: f32) -> Self {
        self.target.lightness_targets.2 = value;
        self
    }

    /// The weight of importance that this target places on saturation values. A weight of 0 means
    /// saturation has no bearing on the selection.
    pub fn saturation_weight(mut self, weight: f32) -> Self {
        self.target.weights.0 = weight;
        self
    }

    /// The weight of importance that this target places on lightness values.
    pub fn lightness_weight(mut self, weight: f32) -> Self {
        self.target.weights.1 = weight;
        self
    }

    /// The weight of importance that this target places on a color's population being close to the
    /// most populous color.
    pub fn population_weight(mut self, weight: f32) -> Self {
        self.target.weights.2 = weight;
        self
    }

    /// Whether a color selected for this target is unavailable to targets processed after it.
    /// Defaults to true.
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.target.is_exclusive = exclusive;
        self
    }

    pub fn build(self) -> Target {
        self.target
    }
}

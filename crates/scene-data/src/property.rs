//! Time-varying properties.
//!
//! A [`Property`] resolves to a concrete value at a [`SceneTime`], or to
//! nothing when it has no data for that time. Visualizers never look inside a
//! property; they go through [`value_or_default`], [`value_or_none`] and
//! [`is_constant`].

use serde::{Deserialize, Serialize};

use crate::graphics::{HeightReference, HorizontalOrigin, VerticalOrigin};
use crate::math::{
    BoundingRectangle, Cartesian2, Cartesian3, Color, DistanceDisplayCondition, NearFarScalar,
};
use crate::time::{SceneTime, TimeInterval};

/// A value type that can be stored in a [`Property`].
///
/// The default interpolation holds the earlier sample, which is what
/// discrete values (flags, image names, enums) need.
pub trait PropertyValue: Clone {
    fn interpolate(&self, _next: &Self, _t: f64) -> Self {
        self.clone()
    }
}

impl PropertyValue for f64 {
    fn interpolate(&self, next: &Self, t: f64) -> Self {
        self + (next - self) * t
    }
}

impl PropertyValue for bool {}
impl PropertyValue for String {}
impl PropertyValue for HeightReference {}
impl PropertyValue for HorizontalOrigin {}
impl PropertyValue for VerticalOrigin {}

macro_rules! lerp_property_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PropertyValue for $ty {
                fn interpolate(&self, next: &Self, t: f64) -> Self {
                    self.lerp(next, t)
                }
            }
        )*
    };
}

lerp_property_value!(
    Cartesian2,
    Cartesian3,
    Color,
    NearFarScalar,
    DistanceDisplayCondition,
    BoundingRectangle,
);

/// A value at a specific time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample<T> {
    pub time: SceneTime,
    pub value: T,
}

/// A value that holds over a time interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalValue<T> {
    pub interval: TimeInterval,
    pub value: T,
}

/// A time-varying attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Property<T> {
    /// Same value at every time.
    Constant { value: T },
    /// Time-ordered samples; absent before the first and after the last.
    Sampled { samples: Vec<Sample<T>> },
    /// Piecewise values; absent outside every interval.
    Intervals { intervals: Vec<IntervalValue<T>> },
}

impl<T: PropertyValue> Property<T> {
    /// Creates a constant property.
    pub fn constant(value: T) -> Self {
        Property::Constant { value }
    }

    /// Creates a sampled property. Samples are sorted by time.
    pub fn sampled(samples: impl IntoIterator<Item = (SceneTime, T)>) -> Self {
        let mut samples: Vec<Sample<T>> = samples
            .into_iter()
            .map(|(time, value)| Sample { time, value })
            .collect();
        samples.sort_by(|a, b| {
            a.time
                .partial_cmp(&b.time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Property::Sampled { samples }
    }

    /// Creates an interval property.
    pub fn intervals(intervals: impl IntoIterator<Item = (TimeInterval, T)>) -> Self {
        Property::Intervals {
            intervals: intervals
                .into_iter()
                .map(|(interval, value)| IntervalValue { interval, value })
                .collect(),
        }
    }

    /// Resolves the value at `time`.
    pub fn value(&self, time: SceneTime) -> Option<T> {
        match self {
            Property::Constant { value } => Some(value.clone()),
            Property::Sampled { samples } => sample_at(samples, time),
            Property::Intervals { intervals } => intervals
                .iter()
                .find(|iv| iv.interval.contains(time))
                .map(|iv| iv.value.clone()),
        }
    }

    /// Checks whether the property yields the same result at every time.
    pub fn is_constant(&self) -> bool {
        match self {
            Property::Constant { .. } => true,
            Property::Sampled { samples } => samples.is_empty(),
            Property::Intervals { intervals } => intervals.is_empty(),
        }
    }
}

fn sample_at<T: PropertyValue>(samples: &[Sample<T>], time: SceneTime) -> Option<T> {
    let first = samples.first()?;
    let last = samples.last()?;
    if time < first.time || time > last.time {
        return None;
    }

    // Index of the first sample strictly after `time`.
    let upper = samples.partition_point(|s| s.time <= time);
    if upper == 0 {
        return Some(first.value.clone());
    }
    let before = &samples[upper - 1];
    let Some(after) = samples.get(upper) else {
        return Some(before.value.clone());
    };

    let span = after.time.seconds_since(before.time);
    if span <= 0.0 {
        return Some(before.value.clone());
    }
    let t = time.seconds_since(before.time) / span;
    Some(before.value.interpolate(&after.value, t))
}

/// Resolves `property` at `time`, falling back to `default` when the
/// property is absent or has no value for that time.
pub fn value_or_default<T: PropertyValue>(
    property: Option<&Property<T>>,
    time: SceneTime,
    default: T,
) -> T {
    value_or_none(property, time).unwrap_or(default)
}

/// Resolves `property` at `time`, or `None`.
pub fn value_or_none<T: PropertyValue>(property: Option<&Property<T>>, time: SceneTime) -> Option<T> {
    property.and_then(|p| p.value(time))
}

/// An absent property counts as constant.
pub fn is_constant<T: PropertyValue>(property: Option<&Property<T>>) -> bool {
    property.map_or(true, Property::is_constant)
}

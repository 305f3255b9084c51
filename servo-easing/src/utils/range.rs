/// A closed interval `[start, end]`: used for angle limits and pulse widths.
///
/// `start` may be greater than `end` (a reversed range): see [`Range::normalize`].
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Range<T> {
    pub start: T,
    pub end: T,
}

impl<T: Copy + PartialOrd> Range<T> {
    /// Returns the lowest bound.
    pub fn min(&self) -> T {
        match self.start <= self.end {
            true => self.start,
            false => self.end,
        }
    }

    /// Returns the highest bound.
    pub fn max(&self) -> T {
        match self.start <= self.end {
            true => self.end,
            false => self.start,
        }
    }

    /// Returns the same range ordered so that `start <= end`.
    pub fn normalize(&self) -> Self {
        Self {
            start: self.min(),
            end: self.max(),
        }
    }

    /// Clamps a value within the range, whatever the order of its bounds.
    pub fn clamp(&self, value: T) -> T {
        let (min, max) = (self.min(), self.max());
        if value < min {
            min
        } else if value > max {
            max
        } else {
            value
        }
    }

    /// Checks whether the value lies within the range (bounds included).
    pub fn contains(&self, value: T) -> bool {
        value >= self.min() && value <= self.max()
    }
}

impl<T: Copy> From<[T; 2]> for Range<T> {
    fn from(value: [T; 2]) -> Self {
        Self {
            start: value[0],
            end: value[1],
        }
    }
}

#[cfg(feature = "serde")]
impl<T> serde::Serialize for Range<T>
where
    T: serde::Serialize + Copy,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        [self.start, self.end].serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Range<T>
where
    T: serde::Deserialize<'de> + Copy,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let array: [T; 2] = serde::Deserialize::deserialize(deserializer)?;
        Ok(Self::from(array))
    }
}

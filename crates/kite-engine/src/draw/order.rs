use core::cmp::Ordering;

/// Global draw layer. Lower layers are drawn first (further back).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct ZIndex(pub i32);

impl ZIndex {
    #[inline]
    pub const fn new(v: i32) -> Self {
        Self(v)
    }
}

impl From<i32> for ZIndex {
    #[inline]
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// Paint-order key: layer first, then submission order.
///
/// Two entries on the same layer keep the order in which they were queued, so
/// sorting by `DrawOrder` never reshuffles equal layers.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DrawOrder {
    pub z: ZIndex,
    pub seq: u32,
}

impl DrawOrder {
    #[inline]
    pub const fn new(z: ZIndex, seq: u32) -> Self {
        Self { z, seq }
    }
}

impl Ord for DrawOrder {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.z.cmp(&other.z).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for DrawOrder {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_dominates_sequence() {
        let back = DrawOrder::new(ZIndex(3), 9);
        let front = DrawOrder::new(ZIndex(5), 0);
        assert!(back < front);
    }

    #[test]
    fn sequence_breaks_ties() {
        let first = DrawOrder::new(ZIndex(1), 0);
        let second = DrawOrder::new(ZIndex(1), 1);
        assert!(first < second);
    }

    #[test]
    fn negative_layers_sort_behind_default() {
        assert!(ZIndex(-1) < ZIndex::default());
    }
}

use bytes::Bytes;
use std::sync::OnceLock;

use super::render::render_int;

/// Largest value range for which a cache is allocated
pub const MAX_CACHE_SLOTS: i64 = 500_000;

/// Write-once mapping from `value - min` to the rendered bytes of `value`.
///
/// One cache is shared by every worker clone of a generator family. Slots are
/// filled lazily; concurrent first writes to a slot race on the `OnceLock` and
/// exactly one rendering wins, so all readers observe the same bytes.
#[derive(Debug)]
pub struct ValueCache {
    min: i64,
    slots: Box<[OnceLock<Bytes>]>,
}

impl ValueCache {
    /// Allocate a cache covering `[min, max]`, or `None` when the range is
    /// empty or larger than [`MAX_CACHE_SLOTS`]
    pub fn for_range(min: i64, max: i64) -> Option<Self> {
        let size = max.checked_sub(min)?.checked_add(1)?;
        if size <= 0 || size > MAX_CACHE_SLOTS {
            return None;
        }

        let slots = (0..size).map(|_| OnceLock::new()).collect();
        Some(Self { min, slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Rendered bytes for `value`, filling the slot on first use.
    /// Values outside the cached range are rendered without caching.
    pub fn get_or_render(&self, value: i64) -> Bytes {
        match self.slot(value) {
            Some(slot) => slot.get_or_init(|| render_int(value)).clone(),
            None => render_int(value),
        }
    }

    /// Rendered bytes for `value` if its slot was already filled
    pub fn get(&self, value: i64) -> Option<Bytes> {
        self.slot(value).and_then(|slot| slot.get()).cloned()
    }

    fn slot(&self, value: i64) -> Option<&OnceLock<Bytes>> {
        let offset = value.checked_sub(self.min)?;
        let index = usize::try_from(offset).ok()?;
        self.slots.get(index)
    }
}

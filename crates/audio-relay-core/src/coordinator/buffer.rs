use crate::{
    audio::{Fragment, PcmFormat},
    store::Segment,
};

use std::collections::VecDeque;

use tracing::warn;

/// Fragments collected between two flushes.
///
/// Bounded so a long stretch without working storage cannot grow memory
/// without limit; the oldest fragment goes first. Fragments that could not
/// be saved when recording stopped carry over into the next recording.
#[derive(Debug)]
pub(crate) struct FragmentBuffer {
    fragments: VecDeque<Fragment>,
    capacity: usize,
    dropped: u64,
}

impl FragmentBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            fragments: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub(crate) fn push(&mut self, fragment: Fragment) {
        if fragment.is_empty() {
            return;
        }
        if self.fragments.len() == self.capacity {
            self.fragments.pop_front();
            self.dropped += 1;
            warn!(
                capacity = self.capacity,
                dropped_total = self.dropped,
                "Fragment buffer full, dropping oldest fragment"
            );
        }
        self.fragments.push_back(fragment);
    }

    /// Concatenate the buffer into a segment without consuming it.
    pub(crate) fn assemble(&self, format: PcmFormat) -> Option<Segment> {
        Segment::from_fragments(&self.fragments, format)
    }

    pub(crate) fn clear(&mut self) {
        self.fragments.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.fragments.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

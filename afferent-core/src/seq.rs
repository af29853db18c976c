// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sequence-chain accounting.
//!
//! When several queued motion samples are merged into one delivered event,
//! the publisher still expects one FINISHED acknowledgment per sample it
//! published. Each merge records a link `(seq, chain)` meaning
//! "acknowledging `seq` also obliges acknowledging `chain`". When the
//! application finishes the delivered event, the consumer walks the links
//! to recover every absorbed sequence number, and — if a send fails partway
//! through — relinks the unsent remainder so a retry acknowledges each
//! exactly once.
//!
//! Chains stay short (bounded by batch depth, tens of entries at most), so
//! linear scans over a flat vector beat anything fancier.

use alloc::vec::Vec;

/// One link: acknowledging `seq` implies also acknowledging `chain`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SeqChain {
    seq: u32,
    chain: u32,
}

/// The consumer's open set of sequence-chain links.
#[derive(Clone, Debug, Default)]
pub struct SeqChainTracker {
    chains: Vec<SeqChain>,
}

impl SeqChainTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self { chains: Vec::new() }
    }

    /// Records that acknowledging `seq` also obliges acknowledging `chain`.
    pub fn push(&mut self, seq: u32, chain: u32) {
        self.chains.push(SeqChain { seq, chain });
    }

    /// Number of open links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether any links are open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Collects and removes every sequence number chained beneath `seq`.
    ///
    /// The walk scans newest-to-oldest, following each matched link's
    /// `chain` as the next head. The returned order is the collection
    /// order: index 0 is `seq`'s direct predecessor, the last entry is the
    /// oldest absorbed sample. Callers acknowledge in *reverse* of that
    /// order (oldest first).
    #[must_use]
    pub fn take_chain(&mut self, seq: u32) -> Vec<u32> {
        let mut collected = Vec::new();
        if self.chains.is_empty() {
            return collected;
        }
        let mut current = seq;
        let mut i = self.chains.len();
        while i > 0 {
            i -= 1;
            if self.chains[i].seq == current {
                current = self.chains[i].chain;
                collected.push(current);
                self.chains.remove(i);
            }
        }
        collected
    }

    /// Relinks the unsent remainder of a partially acknowledged chain.
    ///
    /// `unsent` is the prefix of a [`take_chain`](Self::take_chain) result
    /// whose FINISHED messages did not go out, ending with the entry whose
    /// send failed. After restoring, a later `take_chain(seq)` yields the
    /// same remainder again.
    pub fn restore(&mut self, seq: u32, unsent: &[u32]) {
        let Some(mut i) = unsent.len().checked_sub(1) else {
            return;
        };
        loop {
            let link_seq = if i == 0 { seq } else { unsent[i - 1] };
            self.chains.push(SeqChain {
                seq: link_seq,
                chain: unsent[i],
            });
            if i == 0 {
                break;
            }
            i -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SeqChainTracker;

    #[test]
    fn take_chain_collects_every_absorbed_seq() {
        let mut tracker = SeqChainTracker::new();
        // Samples 2, 3, 4 merged into one event delivered as seq 4.
        tracker.push(3, 2);
        tracker.push(4, 3);

        let chain = tracker.take_chain(4);
        assert_eq!(chain, [3, 2], "direct predecessor first");
        assert!(tracker.is_empty());
    }

    #[test]
    fn take_chain_leaves_unrelated_links_alone() {
        let mut tracker = SeqChainTracker::new();
        tracker.push(3, 2); // stream A
        tracker.push(13, 12); // stream B
        tracker.push(4, 3); // stream A

        let chain = tracker.take_chain(4);
        assert_eq!(chain, [3, 2]);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.take_chain(13), [12]);
    }

    #[test]
    fn take_chain_without_links_is_empty() {
        let mut tracker = SeqChainTracker::new();
        assert!(tracker.take_chain(7).is_empty());
    }

    #[test]
    fn restore_then_take_yields_the_remainder_again() {
        let mut tracker = SeqChainTracker::new();
        tracker.push(3, 2);
        tracker.push(4, 3);
        tracker.push(5, 4);

        let chain = tracker.take_chain(5);
        assert_eq!(chain, [4, 3, 2]);

        // Oldest (2) was sent; the send of 3 failed, so [4, 3] is unsent.
        tracker.restore(5, &chain[..2]);
        assert_eq!(tracker.take_chain(5), [4, 3]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn restore_of_a_fully_failed_chain_is_lossless() {
        let mut tracker = SeqChainTracker::new();
        tracker.push(3, 2);
        tracker.push(4, 3);

        let chain = tracker.take_chain(4);
        tracker.restore(4, &chain);
        assert_eq!(tracker.take_chain(4), [3, 2]);
    }

    #[test]
    fn restore_with_nothing_unsent_is_a_no_op() {
        let mut tracker = SeqChainTracker::new();
        tracker.restore(4, &[]);
        assert!(tracker.is_empty());
    }
}

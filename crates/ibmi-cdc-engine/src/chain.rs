//! Receiver directory and chain builder.
//!
//! Receivers form chains through their successor edge. The host lists them
//! in no particular order and a listing can contain several chains (a chain
//! breaks wherever a receiver was deleted or freed), so the builder links
//! whatever is available and callers pick the chain holding their
//! checkpoint.
//!
//! Nodes live in one `Vec`; `next` and `previous` are indices into it.

use crate::error::ChainError;
use ibmi_cdc_model::{DetailedJournalReceiver, JournalReceiver};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct Node {
    receiver: DetailedJournalReceiver,
    next: Option<usize>,
    previous: Option<usize>,
}

/// The joined receivers of a listing, keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct ReceiverDirectory {
    nodes: Vec<Node>,
    index: HashMap<JournalReceiver, usize>,
}

/// Keeps joined receivers only, one node per receiver.
///
/// When a listing repeats a receiver the first record wins.
pub fn available_receivers(all: &[DetailedJournalReceiver]) -> ReceiverDirectory {
    let mut directory = ReceiverDirectory::default();
    for receiver in all.iter().filter(|r| r.is_joined()) {
        if directory.index.contains_key(receiver.receiver()) {
            continue;
        }
        directory
            .index
            .insert(receiver.receiver().clone(), directory.nodes.len());
        directory.nodes.push(Node {
            receiver: receiver.clone(),
            next: None,
            previous: None,
        });
    }
    directory
}

impl ReceiverDirectory {
    /// Number of available receivers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no receiver is available.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks a receiver up.
    pub fn get(&self, receiver: &JournalReceiver) -> Option<&DetailedJournalReceiver> {
        self.index.get(receiver).map(|&i| &self.nodes[i].receiver)
    }

    /// Whether the receiver is available.
    pub fn contains(&self, receiver: &JournalReceiver) -> bool {
        self.index.contains_key(receiver)
    }
}

/// Receivers linked into chains.
#[derive(Debug, Clone)]
pub struct LinkedChains {
    nodes: Vec<Node>,
    index: HashMap<JournalReceiver, usize>,
    heads: Vec<usize>,
}

/// Links successor edges between available receivers.
///
/// An edge is only linked when the successor is itself available. Heads
/// are the receivers no other receiver names as successor, ordered by
/// attach time.
///
/// # Errors
///
/// [`ChainError::Branch`] when two receivers share a successor and
/// [`ChainError::Cycle`] when successor edges loop.
pub fn link_chain(directory: ReceiverDirectory) -> Result<LinkedChains, ChainError> {
    let ReceiverDirectory { mut nodes, index } = directory;

    for i in 0..nodes.len() {
        let Some(successor) = nodes[i].receiver.next_receiver.clone() else {
            continue;
        };
        let Some(&j) = index.get(&successor) else {
            continue;
        };
        if let Some(k) = nodes[j].previous {
            return Err(ChainError::Branch {
                successor,
                first: nodes[k].receiver.receiver().clone(),
                second: nodes[i].receiver.receiver().clone(),
            });
        }
        nodes[i].next = Some(j);
        nodes[j].previous = Some(i);
    }

    let mut heads: Vec<usize> = (0..nodes.len())
        .filter(|&i| nodes[i].previous.is_none())
        .collect();
    heads.sort_by(|&a, &b| {
        let a = &nodes[a].receiver;
        let b = &nodes[b].receiver;
        (a.info.attach_time, a.receiver()).cmp(&(b.info.attach_time, b.receiver()))
    });

    // Every node has at most one predecessor, so anything a head cannot
    // reach sits on a cycle.
    let mut reached = vec![false; nodes.len()];
    for &head in &heads {
        let mut cursor = Some(head);
        while let Some(i) = cursor {
            reached[i] = true;
            cursor = nodes[i].next;
        }
    }
    if let Some(i) = reached.iter().position(|r| !r) {
        return Err(ChainError::Cycle {
            receiver: nodes[i].receiver.receiver().clone(),
        });
    }

    Ok(LinkedChains {
        nodes,
        index,
        heads,
    })
}

impl LinkedChains {
    /// First receiver of every chain.
    pub fn heads(&self) -> impl Iterator<Item = &DetailedJournalReceiver> + '_ {
        self.heads.iter().map(|&i| &self.nodes[i].receiver)
    }

    /// Every chain, head to tail.
    pub fn chains(&self) -> Vec<Vec<DetailedJournalReceiver>> {
        self.heads.iter().map(|&head| self.walk(head)).collect()
    }

    /// The chain holding `needle`, head to tail; empty when `needle` is not
    /// available.
    pub fn chain_containing(&self, needle: &JournalReceiver) -> Vec<DetailedJournalReceiver> {
        let Some(&start) = self.index.get(needle) else {
            return Vec::new();
        };
        let mut head = start;
        while let Some(previous) = self.nodes[head].previous {
            head = previous;
        }
        self.walk(head)
    }

    /// The linked successor of `receiver`.
    pub fn successor(&self, receiver: &JournalReceiver) -> Option<&DetailedJournalReceiver> {
        let &i = self.index.get(receiver)?;
        self.nodes[i].next.map(|j| &self.nodes[j].receiver)
    }

    fn walk(&self, head: usize) -> Vec<DetailedJournalReceiver> {
        let mut chain = Vec::new();
        let mut cursor = Some(head);
        while let Some(i) = cursor {
            chain.push(self.nodes[i].receiver.clone());
            cursor = self.nodes[i].next;
        }
        chain
    }
}

/// Convenience for `link_chain(available_receivers(all))` followed by
/// [`LinkedChains::chain_containing`].
pub fn find_chain_containing(
    all: &[DetailedJournalReceiver],
    needle: &JournalReceiver,
) -> Result<Vec<DetailedJournalReceiver>, ChainError> {
    Ok(link_chain(available_receivers(all))?.chain_containing(needle))
}

/// The readable receivers after the most recent gap, oldest first.
///
/// Receivers without an attach time are dropped, the rest sorted by attach
/// time. Everything up to and including the last receiver that is not
/// joined is discarded. This approximates "the current chain" from attach
/// times alone; successor edges are not consulted.
///
/// # Errors
///
/// [`ChainError::NoUsableReceivers`] when nothing remains.
pub fn last_joined(
    all: &[DetailedJournalReceiver],
) -> Result<Vec<DetailedJournalReceiver>, ChainError> {
    let mut attached: Vec<&DetailedJournalReceiver> =
        all.iter().filter(|r| r.info.attach_time.is_some()).collect();
    attached.sort_by(|a, b| {
        (a.info.attach_time, a.receiver()).cmp(&(b.info.attach_time, b.receiver()))
    });

    let start = attached
        .iter()
        .rposition(|r| !r.is_joined())
        .map_or(0, |k| k + 1);
    let run: Vec<DetailedJournalReceiver> = attached[start..].iter().map(|&r| r.clone()).collect();
    if run.is_empty() {
        return Err(ChainError::NoUsableReceivers);
    }
    Ok(run)
}

/// Receivers in the listing that are not part of `chain`, in listing order.
pub fn unreachable(
    all: &[DetailedJournalReceiver],
    chain: &[DetailedJournalReceiver],
) -> Vec<JournalReceiver> {
    let members: HashSet<&JournalReceiver> = chain.iter().map(|r| r.receiver()).collect();
    all.iter()
        .map(|r| r.receiver())
        .filter(|r| !members.contains(r))
        .cloned()
        .collect()
}

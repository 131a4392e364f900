use std::collections::VecDeque;

use super::audio_sources::{LoadRequest, Track};

/// Identifies one `enqueue` call for the lifetime of the scheduler.
pub type LoadTicket = u64;

/// What a queue position currently holds.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueSlot {
    /// Resolution is still in flight; the position is held in call order.
    Pending(LoadRequest),
    /// A resolved track waiting for its turn.
    Ready(Track),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub ticket: LoadTicket,
    pub slot: QueueSlot,
}

/// FIFO of upcoming tracks. Never holds the track that is currently playing.
///
/// Positions are reserved when a load is requested and filled or dropped when
/// the load completes, so the final order always follows request order.
/// There is no locking here: the scheduler task is the only owner.
#[derive(Debug, Default)]
pub struct TrackQueue {
    entries: VecDeque<QueueEntry>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the tail position for a load that has not resolved yet.
    pub fn reserve(&mut self, ticket: LoadTicket, request: LoadRequest) {
        self.entries.push_back(QueueEntry {
            ticket,
            slot: QueueSlot::Pending(request),
        });
    }

    /// Fill a reserved position with its resolved track.
    /// Returns the track back if no pending position exists for the ticket.
    pub fn fulfil(&mut self, ticket: LoadTicket, track: Track) -> Result<(), Track> {
        match self.pending_mut(ticket) {
            Some(entry) => {
                entry.slot = QueueSlot::Ready(track);
                Ok(())
            }
            None => Err(track),
        }
    }

    /// Drop a reserved position whose load produced nothing playable.
    pub fn discard(&mut self, ticket: LoadTicket) -> Option<LoadRequest> {
        let index = self.entries.iter().position(|entry| {
            entry.ticket == ticket && matches!(entry.slot, QueueSlot::Pending(_))
        })?;

        match self.entries.remove(index)?.slot {
            QueueSlot::Pending(request) => Some(request),
            QueueSlot::Ready(_) => None,
        }
    }

    /// Take the head of the queue, whether it is resolved or not.
    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    fn pending_mut(&mut self, ticket: LoadTicket) -> Option<&mut QueueEntry> {
        self.entries.iter_mut().find(|entry| {
            entry.ticket == ticket && matches!(entry.slot, QueueSlot::Pending(_))
        })
    }
}

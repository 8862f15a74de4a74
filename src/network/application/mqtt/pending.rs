//! Packet identifier allocation and the table of unacknowledged publishes.

use heapless::{FnvIndexMap, String, Vec};

use super::error::EncodingError;
use super::packet::{MAX_REMAINING_LENGTH, PacketId, Publish, QoS};

/// Hands out packet identifiers 1, 2, ..., 65535, 1, ... and never 0.
#[derive(Debug, Clone)]
pub struct PacketIdAllocator {
    last: u16,
}

impl PacketIdAllocator {
    /// Start so that the first identifier handed out is 1.
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// The identifier after the last one returned.
    pub fn next(&mut self) -> PacketId {
        self.last = self.last.checked_add(1).unwrap_or(1);
        PacketId::new(self.last).unwrap_or(PacketId::MIN)
    }

    /// The next identifier for which `in_use` is false.
    ///
    /// Gives up after one full cycle through the identifier space.
    pub fn next_unused(&mut self, in_use: impl Fn(PacketId) -> bool) -> Option<PacketId> {
        (0..u16::MAX).map(|_| self.next()).find(|id| !in_use(*id))
    }
}

impl Default for PacketIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A QoS 1 publish that is waiting for its PUBACK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPublish {
    /// Topic the message was published on.
    pub topic: String<MAX_REMAINING_LENGTH>,
    /// Message payload.
    pub payload: Vec<u8, MAX_REMAINING_LENGTH>,
    /// Delivery guarantee the message was sent with.
    pub qos: QoS,
    /// Retain flag the message was sent with.
    pub retain: bool,
    /// When the message was last written, in clock milliseconds.
    pub sent_at_ms: u64,
    /// Re-sends performed so far.
    pub attempts: u8,
}

impl PendingPublish {
    /// Copy `message` into an owned entry stamped with `now_ms`.
    pub fn new(message: &Publish<'_>, now_ms: u64) -> Result<Self, EncodingError> {
        Ok(Self {
            topic: String::try_from(message.topic).map_err(|_| EncodingError::PacketTooLarge)?,
            payload: Vec::from_slice(message.payload).map_err(|_| EncodingError::PacketTooLarge)?,
            qos: message.qos,
            retain: message.retain,
            sent_at_ms: now_ms,
            attempts: 0,
        })
    }

    /// A view of the entry ready to be re-encoded.
    pub fn as_publish(&self, packet_id: PacketId, dup: bool) -> Publish<'_> {
        Publish {
            topic: &self.topic,
            payload: &self.payload,
            qos: self.qos,
            retain: self.retain,
            dup,
            packet_id: Some(packet_id),
        }
    }
}

/// Unacknowledged publishes keyed by packet identifier.
///
/// `N` must be a power of two greater than one.
#[derive(Debug)]
pub struct PendingTable<const N: usize> {
    entries: FnvIndexMap<PacketId, PendingPublish, N>,
}

impl<const N: usize> PendingTable<N> {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
        }
    }

    /// Track `entry` under `id`.
    ///
    /// Fails, handing the entry back, when the table is full or `id` is
    /// already tracked.
    pub fn insert(&mut self, id: PacketId, entry: PendingPublish) -> Result<(), PendingPublish> {
        if self.entries.contains_key(&id) {
            return Err(entry);
        }
        match self.entries.insert(id, entry) {
            Ok(_) => Ok(()),
            Err((_, entry)) => Err(entry),
        }
    }

    /// Remove and return the entry for `id`, if any.
    pub fn remove(&mut self, id: PacketId) -> Option<PendingPublish> {
        self.entries.remove(&id)
    }

    /// Mutable access to the entry for `id`.
    pub fn get_mut(&mut self, id: PacketId) -> Option<&mut PendingPublish> {
        self.entries.get_mut(&id)
    }

    /// `id` is awaiting acknowledgement.
    pub fn contains(&self, id: PacketId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Identifiers whose last send is at least `interval_ms` old.
    pub fn due(&self, now_ms: u64, interval_ms: u64) -> Vec<PacketId, N> {
        let mut due = Vec::new();
        for (id, entry) in &self.entries {
            if now_ms.saturating_sub(entry.sent_at_ms) >= interval_ms {
                // capacity matches the table, so this cannot overflow
                let _ = due.push(*id);
            }
        }
        due
    }

    /// Iterate over tracked entries.
    pub fn iter(&self) -> impl Iterator<Item = (&PacketId, &PendingPublish)> {
        self.entries.iter()
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Nothing is awaiting acknowledgement.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// No room for another entry.
    pub fn is_full(&self) -> bool {
        self.entries.len() == N
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<const N: usize> Default for PendingTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

//! Outbound combat events.
//!
//! The simulation publishes what happened during a tick; the presentation
//! layer drains the bus once per frame (damage numbers, death effects,
//! despawning sprites).

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{ActorId, Cardinal};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::damage::DamageKind;
use crate::enemy::EnemyState;
use crate::spatial::Layer;

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Actor entered the simulation
    Spawned {
        /// Actor ID
        actor: ActorId,
        /// Collision layer
        layer: Layer,
        /// Spawn position
        position: Vec2,
    },
    /// Actor took damage
    Damaged {
        /// Victim
        actor: ActorId,
        /// Damage applied (after kind multiplier)
        amount: i32,
        /// Elemental kind
        kind: DamageKind,
        /// Victim position, for the damage popup
        position: Vec2,
        /// Where the hit came from
        source_position: Vec2,
        /// Health left (may be negative)
        remaining: i32,
    },
    /// Actor died
    Died {
        /// Actor ID
        actor: ActorId,
        /// Death position
        position: Vec2,
    },
    /// Actor left the simulation after its death delay
    Removed {
        /// Actor ID
        actor: ActorId,
    },
    /// Player executed a combo step
    ComboStep {
        /// Player
        actor: ActorId,
        /// Zero-based step index
        step: usize,
        /// Damage per target including bonuses
        damage: i32,
        /// Number of actors hit
        hits: usize,
    },
    /// Player started a dash
    DashStarted {
        /// Player
        actor: ActorId,
        /// Direction tapped
        direction: Cardinal,
        /// Start position
        from: Vec2,
        /// Destination
        to: Vec2,
    },
    /// Enemy changed behavior state
    EnemyStateChanged {
        /// Enemy
        actor: ActorId,
        /// Previous state
        from: EnemyState,
        /// New state
        to: EnemyState,
    },
}

/// Bounded per-frame queue between the simulation and the presentation layer.
///
/// Publishing never blocks; once the queue is full further events are
/// dropped and counted until the host drains it.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<CombatEvent>,
    receiver: Receiver<CombatEvent>,
    capacity: usize,
    dropped: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: CombatEvent) {
        if let Err(err) = self.sender.try_send(event) {
            let event = err.into_inner();
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(?event, dropped, "combat event bus full, dropping event");
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        self.receiver.try_iter().collect()
    }

    /// Drains pending events into `handler` in publish order.
    ///
    /// Returns how many were handled.
    pub fn dispatch<H: EventHandler + ?Sized>(&self, handler: &mut H) -> usize {
        let mut handled = 0;
        for event in self.receiver.try_iter() {
            handler.handle(&event);
            handled += 1;
        }
        handled
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events lost to a full queue since the bus was created.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer of drained events.
pub trait EventHandler {
    /// Handles an event.
    fn handle(&mut self, event: &CombatEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_drain() {
        let bus = EventBus::new(8);
        bus.publish(CombatEvent::Removed {
            actor: ActorId::from_raw(1),
        });
        bus.publish(CombatEvent::Died {
            actor: ActorId::from_raw(2),
            position: Vec2::ZERO,
        });

        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        for raw in 1..=3 {
            bus.publish(CombatEvent::Removed {
                actor: ActorId::from_raw(raw),
            });
        }
        assert_eq!(bus.drain().len(), 1);
        assert_eq!(bus.dropped(), 2);

        // Draining frees room again.
        bus.publish(CombatEvent::Removed {
            actor: ActorId::from_raw(4),
        });
        assert_eq!(bus.pending_count(), 1);
        assert_eq!(bus.dropped(), 2);
    }

    #[test]
    fn test_dispatch_preserves_order() {
        struct Ids(Vec<u64>);
        impl EventHandler for Ids {
            fn handle(&mut self, event: &CombatEvent) {
                if let CombatEvent::Removed { actor } = event {
                    self.0.push(actor.raw());
                }
            }
        }

        let bus = EventBus::default();
        for raw in [4, 2, 9] {
            bus.publish(CombatEvent::Removed {
                actor: ActorId::from_raw(raw),
            });
        }
        let mut ids = Ids(Vec::new());
        assert_eq!(bus.dispatch(&mut ids), 3);
        assert_eq!(ids.0, vec![4, 2, 9]);
        assert_eq!(bus.pending_count(), 0);
        assert_eq!(bus.dispatch(&mut ids), 0);
    }
}

//! Bus d'événements synchrone
//!
//! Les abonnés (interface, triches, réseau, sauvegardes d'état) sont
//! appelés dans l'ordre d'inscription, sur le thread qui diffuse.

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Types d'événements diffusés par le coordinateur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Start,
    Resume,
    Pause,
    Terminate,
    LoadState,
    VBlank,
    Network,
}

/// Abonné : la fermeture capture son propre contexte
///
/// Deux inscriptions sont identiques lorsqu'elles partagent le même `Arc`.
pub type Subscriber = Arc<dyn Fn(Event) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    callbacks: Mutex<HashMap<Event, Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inscrit un abonné ; une inscription identique remplace la précédente
    pub fn register(&self, event: Event, subscriber: Subscriber) {
        let mut callbacks = self.callbacks.lock();
        let list = callbacks.entry(event).or_default();
        list.retain(|s| !Arc::ptr_eq(s, &subscriber));
        list.push(subscriber);
    }

    pub fn unregister(&self, event: Event, subscriber: &Subscriber) {
        let mut callbacks = self.callbacks.lock();
        if let Some(list) = callbacks.get_mut(&event) {
            list.retain(|s| !Arc::ptr_eq(s, subscriber));
        }
    }

    /// Diffuse un événement à tous ses abonnés
    ///
    /// La liste est copiée avant l'itération : un abonné peut s'inscrire
    /// ou se désinscrire pendant la diffusion, l'effet s'applique à la
    /// diffusion suivante.
    pub fn broadcast(&self, event: Event) {
        let snapshot: Vec<Subscriber> = match self.callbacks.lock().get(&event) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => return,
        };
        if event != Event::VBlank {
            debug!("Diffusion de {:?} à {} abonné(s)", event, snapshot.len());
        }
        for subscriber in snapshot {
            subscriber(event);
        }
    }

    pub fn subscriber_count(&self, event: Event) -> usize {
        self.callbacks.lock().get(&event).map(Vec::len).unwrap_or(0)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let callbacks = self.callbacks.lock();
        let counts: HashMap<&Event, usize> = callbacks.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("EventBus").field("subscribers", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Subscriber) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        let subscriber: Subscriber = Arc::new(move |_: Event| {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, subscriber)
    }

    /// Test d'une double inscription
    #[test]
    fn test_register_is_idempotent() {
        let bus = EventBus::new();
        let (count, subscriber) = counter();

        bus.register(Event::Start, subscriber.clone());
        bus.register(Event::Start, subscriber.clone());
        assert_eq!(bus.subscriber_count(Event::Start), 1);

        bus.broadcast(Event::Start);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    /// Test d'un même abonné sur deux événements
    #[test]
    fn test_same_callback_on_distinct_events() {
        let bus = EventBus::new();
        let (count, subscriber) = counter();

        bus.register(Event::Pause, subscriber.clone());
        bus.register(Event::Resume, subscriber);
        bus.broadcast(Event::Pause);
        bus.broadcast(Event::Resume);
        bus.broadcast(Event::Terminate);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    /// Test de l'ordre d'appel des abonnés
    #[test]
    fn test_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            bus.register(Event::VBlank, Arc::new(move |_: Event| order.lock().push(i)));
        }
        bus.broadcast(Event::VBlank);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    /// Test de la désinscription
    #[test]
    fn test_unregister() {
        let bus = EventBus::new();
        let (count, subscriber) = counter();
        bus.register(Event::Terminate, subscriber.clone());
        bus.unregister(Event::Terminate, &subscriber);
        bus.broadcast(Event::Terminate);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(Event::Terminate), 0);
    }

    /// Test d'une désinscription pendant la diffusion
    #[test]
    fn test_unregister_during_broadcast() {
        let bus = Arc::new(EventBus::new());
        let (count, victim) = counter();

        let bus_ref = Arc::downgrade(&bus);
        let victim_ref = victim.clone();
        let remover: Subscriber = Arc::new(move |event: Event| {
            if let Some(bus) = bus_ref.upgrade() {
                bus.unregister(event, &victim_ref);
            }
        });

        bus.register(Event::Network, remover);
        bus.register(Event::Network, victim);

        // La copie de la liste a été prise avant la désinscription
        bus.broadcast(Event::Network);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        bus.broadcast(Event::Network);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(Event::Network), 1);
    }
}

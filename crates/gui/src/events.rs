//! Typed publish/subscribe bus for viewport notifications.
//!
//! Subscribers are called in registration order. Every subscription returns a
//! [`SubscriptionId`] that must be passed to [`EventBus::unsubscribe`] when the
//! listener goes away; nothing is dropped implicitly.

use glam::{Vec2, Vec3};

use crate::input::{InputEvent, Key, MouseButton};
use crate::tools::ToolKind;
use crate::viewport::hit_test::HoverResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseMove,
    MouseDown,
    MouseUp,
    MouseScroll,
    KeyDown,
    KeyUp,
    CameraChange,
    AxisChange,
    ToolChange,
    Hover,
    RegionSelected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    MouseMove {
        current: Vec2,
        delta: Vec2,
        previous: Vec2,
    },
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    MouseScroll(i8),
    KeyDown(Key),
    KeyUp(Key),
    CameraChange,
    /// World-space normal of the newly chosen work plane
    AxisChange(Vec3),
    ToolChange {
        selected: Option<ToolKind>,
        active: Option<ToolKind>,
    },
    Hover(HoverResult),
    /// Screen-space rectangle finished by the select tool (pixels)
    RegionSelected {
        min: Vec2,
        max: Vec2,
    },
}

impl ViewportEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ViewportEvent::MouseMove { .. } => EventKind::MouseMove,
            ViewportEvent::MouseDown(_) => EventKind::MouseDown,
            ViewportEvent::MouseUp(_) => EventKind::MouseUp,
            ViewportEvent::MouseScroll(_) => EventKind::MouseScroll,
            ViewportEvent::KeyDown(_) => EventKind::KeyDown,
            ViewportEvent::KeyUp(_) => EventKind::KeyUp,
            ViewportEvent::CameraChange => EventKind::CameraChange,
            ViewportEvent::AxisChange(_) => EventKind::AxisChange,
            ViewportEvent::ToolChange { .. } => EventKind::ToolChange,
            ViewportEvent::Hover(_) => EventKind::Hover,
            ViewportEvent::RegionSelected { .. } => EventKind::RegionSelected,
        }
    }
}

impl From<InputEvent> for ViewportEvent {
    fn from(event: InputEvent) -> Self {
        match event {
            InputEvent::MouseMove {
                current,
                delta,
                previous,
            } => ViewportEvent::MouseMove {
                current,
                delta,
                previous,
            },
            InputEvent::MouseDown(b) => ViewportEvent::MouseDown(b),
            InputEvent::MouseUp(b) => ViewportEvent::MouseUp(b),
            InputEvent::MouseScroll(d) => ViewportEvent::MouseScroll(d),
            InputEvent::KeyDown(k) => ViewportEvent::KeyDown(k),
            InputEvent::KeyUp(k) => ViewportEvent::KeyUp(k),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&ViewportEvent)>;

struct Subscriber {
    id: SubscriptionId,
    /// None listens to every kind
    kind: Option<EventKind>,
    handler: Handler,
}

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&ViewportEvent) + 'static,
    ) -> SubscriptionId {
        self.insert(Some(kind), Box::new(handler))
    }

    pub fn subscribe_all(&mut self, handler: impl FnMut(&ViewportEvent) + 'static) -> SubscriptionId {
        self.insert(None, Box::new(handler))
    }

    /// Returns false if the id was not registered (already removed)
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Deliver `event` to matching subscribers; returns how many were called
    pub fn publish(&mut self, event: &ViewportEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for sub in &mut self.subscribers {
            if sub.kind.is_none_or(|k| k == kind) {
                (sub.handler)(event);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Drop every subscription (teardown)
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    fn insert(&mut self, kind: Option<EventKind>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, kind, handler });
        id
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_delivery_in_registration_order() {
        let mut bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = log.clone();
        bus.subscribe(EventKind::CameraChange, move |_| l1.borrow_mut().push("first"));
        let l2 = log.clone();
        bus.subscribe_all(move |_| l2.borrow_mut().push("all"));
        let l3 = log.clone();
        bus.subscribe(EventKind::CameraChange, move |_| l3.borrow_mut().push("third"));

        let n = bus.publish(&ViewportEvent::CameraChange);
        assert_eq!(n, 3);
        assert_eq!(*log.borrow(), vec!["first", "all", "third"]);
    }

    #[test]
    fn test_kind_filter() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        bus.subscribe(EventKind::MouseDown, move |_| *c.borrow_mut() += 1);

        bus.publish(&ViewportEvent::MouseUp(MouseButton::Left));
        bus.publish(&ViewportEvent::MouseDown(MouseButton::Left));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let id = bus.subscribe(EventKind::CameraChange, move |_| *c.borrow_mut() += 1);

        bus.publish(&ViewportEvent::CameraChange);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&ViewportEvent::CameraChange);

        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(ViewportEvent::MouseScroll(-1).kind(), EventKind::MouseScroll);
        assert_eq!(ViewportEvent::AxisChange(Vec3::Z).kind(), EventKind::AxisChange);
        assert_eq!(
            ViewportEvent::RegionSelected {
                min: Vec2::ZERO,
                max: Vec2::ONE
            }
            .kind(),
            EventKind::RegionSelected
        );
    }
}

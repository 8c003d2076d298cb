//! Geometry with a change stream.
//!
//! Sessions subscribe to the geometry they mutate; the returned
//! [`ChangeSubscription`] detaches the listener when dropped, so a finished
//! or aborted session cannot leave a listener behind.

use super::Geometry;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener = Box<dyn FnMut(&Geometry)>;

struct Inner {
    geometry: Geometry,
    listeners: Vec<(u64, Listener)>,
    next_key: u64,
}

/// A shared geometry that notifies listeners after every mutation.
#[derive(Clone)]
pub struct ObservableGeometry {
    inner: Rc<RefCell<Inner>>,
}

impl ObservableGeometry {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                geometry,
                listeners: Vec::new(),
                next_key: 0,
            })),
        }
    }

    /// Snapshot of the current geometry.
    pub fn get(&self) -> Geometry {
        self.inner.borrow().geometry.clone()
    }

    /// Replace the geometry and notify listeners.
    pub fn set(&self, geometry: Geometry) {
        self.inner.borrow_mut().geometry = geometry;
        self.notify();
    }

    /// Subscribe to changes. The listener stays attached while the returned
    /// subscription is alive.
    pub fn on_change(&self, listener: impl FnMut(&Geometry) + 'static) -> ChangeSubscription {
        let mut inner = self.inner.borrow_mut();
        let key = inner.next_key;
        inner.next_key += 1;
        inner.listeners.push((key, Box::new(listener)));
        ChangeSubscription {
            key,
            target: Rc::downgrade(&self.inner),
        }
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn notify(&self) {
        // Listeners run without the cell borrowed so they may read the geometry.
        let (mut listeners, geometry) = {
            let mut inner = self.inner.borrow_mut();
            (std::mem::take(&mut inner.listeners), inner.geometry.clone())
        };
        for (_, listener) in listeners.iter_mut() {
            listener(&geometry);
        }
        let mut inner = self.inner.borrow_mut();
        listeners.append(&mut inner.listeners);
        inner.listeners = listeners;
    }
}

impl fmt::Debug for ObservableGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableGeometry")
            .field("geometry", &inner.geometry)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

/// Handle for an attached change listener. Dropping it detaches the listener.
#[must_use = "dropping the subscription detaches the listener immediately"]
#[derive(Debug)]
pub struct ChangeSubscription {
    key: u64,
    target: Weak<RefCell<Inner>>,
}

impl ChangeSubscription {
    /// Detach the listener now.
    pub fn release(self) {}
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.target.upgrade() {
            if let Ok(mut inner) = inner.try_borrow_mut() {
                inner.listeners.retain(|(key, _)| *key != self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use std::cell::Cell;

    #[test]
    fn test_listener_fires_on_change() {
        let geometry = ObservableGeometry::new(Geometry::Point(Point::ZERO));
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let _subscription = geometry.on_change(move |_| counter.set(counter.get() + 1));

        geometry.set(Geometry::Point(Point::new(1.0, 1.0)));
        geometry.set(Geometry::Point(Point::new(2.0, 2.0)));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_drop_releases_listener() {
        let geometry = ObservableGeometry::new(Geometry::Point(Point::ZERO));
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let subscription = geometry.on_change(move |_| counter.set(counter.get() + 1));
        assert_eq!(geometry.listener_count(), 1);

        subscription.release();
        assert_eq!(geometry.listener_count(), 0);

        geometry.set(Geometry::Point(Point::new(1.0, 1.0)));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_listener_sees_new_geometry() {
        let geometry = ObservableGeometry::new(Geometry::Point(Point::ZERO));
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let _subscription = geometry.on_change(move |g| *sink.borrow_mut() = Some(g.clone()));

        geometry.set(Geometry::Point(Point::new(3.0, 4.0)));
        assert_eq!(*seen.borrow(), Some(Geometry::Point(Point::new(3.0, 4.0))));
    }
}

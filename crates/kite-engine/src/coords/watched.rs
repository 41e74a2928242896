use core::fmt;

/// Value cell that notifies a listener when its value actually changes.
///
/// `set` compares against the stored value first; writing an equal value is a
/// no-op and does not invoke the listener. A value unequal to itself (NaN)
/// always counts as a change, so callers reject non-finite input first.
pub struct Watched<T> {
    value: T,
    listener: Option<Box<dyn FnMut(T)>>,
}

impl<T: Copy + PartialEq> Watched<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Self { value, listener: None }
    }

    #[inline]
    pub fn get(&self) -> T {
        self.value
    }

    /// Stores `value`. Returns `true` if it differed from the previous value.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        if let Some(listener) = self.listener.as_mut() {
            listener(value);
        }
        true
    }

    /// Installs the change listener, replacing any previous one.
    pub fn watch(&mut self, listener: impl FnMut(T) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn unwatch(&mut self) {
        self.listener = None;
    }

    #[inline]
    pub fn is_watched(&self) -> bool {
        self.listener.is_some()
    }
}

impl<T: Copy + PartialEq + Default> Default for Watched<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Watched<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watched")
            .field("value", &self.value)
            .field("watched", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::coords::Vec2;

    #[test]
    fn set_reports_change() {
        let mut w = Watched::new(Vec2::ZERO);
        assert!(w.set(Vec2::new(1.0, 0.0)));
        assert!(!w.set(Vec2::new(1.0, 0.0)));
        assert_eq!(w.get(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn listener_fires_only_on_real_change() {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();

        let mut w = Watched::new(Vec2::ZERO);
        w.watch(move |_| seen.set(seen.get() + 1));

        w.set(Vec2::ZERO);
        assert_eq!(calls.get(), 0);

        w.set(Vec2::new(0.0, 2.0));
        w.set(Vec2::new(0.0, 2.0));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unwatch_stops_notifications() {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();

        let mut w = Watched::new(1.0_f32);
        w.watch(move |_| seen.set(seen.get() + 1));
        w.unwatch();
        w.set(2.0);
        assert_eq!(calls.get(), 0);
        assert!(!w.is_watched());
    }
}

use crate::base::Vec2;
use crate::fog::FogOfWar;

//////////////////////////////////////////////////////////////////////////////

type Listener = Box<dyn FnMut(bool)>;

// Follows the visibility of a single location, e.g. an object that should
// only be drawn while some vision unit can see it.
#[derive(Default)]
pub struct VisibilityWatcher {
    visible: Option<bool>,
    listeners: Vec<Listener>,
}

impl VisibilityWatcher {
    pub fn new() -> Self { Self::default() }

    pub fn is_visible(&self) -> bool { self.visible.unwrap_or(true) }

    pub fn subscribe<F: FnMut(bool) + 'static>(&mut self, listener: F) {
        self.listeners.push(Box::new(listener));
    }

    /// Re-checks `location` and returns the new visibility if it changed.
    /// The first call always reports. Listeners see every reported value.
    pub fn update(&mut self, fog: &FogOfWar, location: Vec2) -> Option<bool> {
        let visible = fog.is_location_visible(location);
        if self.visible == Some(visible) { return None; }

        self.visible = Some(visible);
        for listener in &mut self.listeners { listener(visible); }
        Some(visible)
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Vec3;
    use crate::config::{FogConfig, GridBounds};
    use crate::fog::UnitId;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_reports_changes_only() {
        let bounds = GridBounds::new(Vec2::default(), Vec2::new(1000., 1000.));
        let mut fog = FogOfWar::new(FogConfig::with_bounds(bounds), |_| 0.).unwrap();
        fog.register(UnitId(0), 150.);

        let seen = Rc::new(RefCell::new(vec![]));
        let mut watcher = VisibilityWatcher::new();
        let clone = seen.clone();
        watcher.subscribe(move |x| clone.borrow_mut().push(x));
        assert!(watcher.is_visible());

        let target = Vec2::new(550., 550.);
        assert_eq!(watcher.update(&fog, target), Some(false));
        assert_eq!(watcher.update(&fog, target), None);
        assert!(!watcher.is_visible());

        fog.update(|_| Vec3::new(450., 450., 0.));
        assert_eq!(watcher.update(&fog, target), Some(true));
        assert_eq!(watcher.update(&fog, target), None);

        fog.update(|_| Vec3::new(50., 50., 0.));
        assert_eq!(watcher.update(&fog, target), Some(false));
        assert_eq!(*seen.borrow(), vec![false, true, false]);
    }
}

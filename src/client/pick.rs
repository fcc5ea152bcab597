use crate::entities::{Coordinates, NavPoint};

/// Which navigation endpoint the next pick sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickRole {
    Start,
    End,
}

impl PickRole {
    /// Name used when the pick lands on bare map rather than a place.
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::Start => "Start Location",
            Self::End => "End Location",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PickedLocation {
    pub role: PickRole,
    pub point: NavPoint,
}

/// The single pending "next click sets this endpoint" request.
///
/// The navigation panel starts picks and the map layer resolves them; both
/// get the picker by `&mut`, so at most one pick is ever outstanding.
#[derive(Debug, Default)]
pub struct LocationPicker {
    pending: Option<PickRole>,
}

impl LocationPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pick still pending and returns it.
    pub fn start(&mut self, role: PickRole) -> Option<PickRole> {
        let replaced = self.pending.replace(role);
        if let Some(replaced) = replaced {
            tracing::debug!(?replaced, ?role, "pending pick replaced");
        }
        replaced
    }

    pub fn pending(&self) -> Option<PickRole> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Consumes the pending pick. `None` when nothing was pending.
    pub fn resolve(&mut self, at: Coordinates, name: Option<&str>) -> Option<PickedLocation> {
        let role = self.pending.take()?;
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| role.default_name());

        Some(PickedLocation {
            role,
            point: NavPoint::new(name, at),
        })
    }
}

#[test]
fn latest_pick_wins() {
    let mut picker = LocationPicker::new();
    let at = Coordinates::new(17.98, 79.53);

    assert_eq!(picker.start(PickRole::Start), None);
    assert_eq!(picker.start(PickRole::End), Some(PickRole::Start));

    let picked = picker.resolve(at, None).unwrap();
    assert_eq!(picked.role, PickRole::End);
    assert_eq!(picked.point.name, "End Location");

    assert!(!picker.is_pending());
    assert_eq!(picker.resolve(at, Some("Library")), None);
}

#[test]
fn place_name_is_used_when_given() {
    let mut picker = LocationPicker::new();
    picker.start(PickRole::Start);

    let picked = picker
        .resolve(Coordinates::new(17.9843, 79.5305), Some("NIT Warangal Library"))
        .unwrap();

    assert_eq!(picked.point.name, "NIT Warangal Library");
    assert_eq!(picked.point.latitude, 17.9843);
}

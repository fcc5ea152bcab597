use crate::client::pick::{LocationPicker, PickRole, PickedLocation};
use crate::entities::{NavPoint, NavigationRequest, Profile, Suggestion};
use crate::error::{validation_error, Error, FieldError};

const BOTH_ENDS_REQUIRED: &str = "Please set both start and end locations";

/// Start, end and travel profile for one directions lookup. Owns the
/// location picker so only this panel can start a pick.
#[derive(Debug, Default)]
pub struct NavigationPanel {
    start: Option<NavPoint>,
    end: Option<NavPoint>,
    profile: Profile,
    picker: LocationPicker,
}

impl NavigationPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<&NavPoint> {
        self.start.as_ref()
    }

    pub fn end(&self) -> Option<&NavPoint> {
        self.end.as_ref()
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = profile;
    }

    pub fn set(&mut self, role: PickRole, point: NavPoint) {
        match role {
            PickRole::Start => self.start = Some(point),
            PickRole::End => self.end = Some(point),
        }
    }

    pub fn select_suggestion(&mut self, role: PickRole, suggestion: &Suggestion) {
        self.set(role, suggestion.to_nav_point());
    }

    /// Arms a map pick for `role`, dropping any pick already armed.
    pub fn pick_from_map(&mut self, role: PickRole) {
        self.picker.start(role);
    }

    /// Handed to the map layer's click handlers.
    pub fn picker(&mut self) -> &mut LocationPicker {
        &mut self.picker
    }

    pub fn apply_pick(&mut self, picked: PickedLocation) {
        self.set(picked.role, picked.point);
    }

    pub fn request(&self) -> Result<NavigationRequest, Error> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Ok(NavigationRequest {
                start: start.clone(),
                end: end.clone(),
                profile: self.profile,
            }),
            (start, end) => {
                let missing = [("start", start.is_none()), ("end", end.is_none())];
                Err(validation_error(
                    missing
                        .iter()
                        .filter(|(_, is_missing)| *is_missing)
                        .map(|(field, _)| FieldError::new(*field, BOTH_ENDS_REQUIRED))
                        .collect(),
                ))
            }
        }
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
        self.picker.cancel();
    }
}

#[test]
fn request_needs_both_ends() {
    use crate::entities::Coordinates;

    let mut panel = NavigationPanel::new();
    assert_eq!(panel.profile(), Profile::Driving);

    panel.set(
        PickRole::Start,
        NavPoint::new("Main Gate", Coordinates::new(17.98, 79.53)),
    );
    let err = panel.request().unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.fields.len(), 1);
    assert_eq!(err.fields[0].field, "end");

    panel.select_suggestion(
        PickRole::End,
        &Suggestion {
            name: "Hanamkonda Bus Station".into(),
            lng: 79.56,
            lat: 18.01,
            context: "Hanamkonda".into(),
            is_local: false,
            description: None,
        },
    );
    panel.set_profile(Profile::Walking);

    let request = panel.request().unwrap();
    assert_eq!(request.end.name, "Hanamkonda Bus Station");
    assert_eq!(request.profile, Profile::Walking);

    panel.clear();
    assert!(panel.start().is_none() && panel.end().is_none());
}

#[test]
fn map_pick_fills_the_armed_end() {
    use crate::entities::Coordinates;

    let mut panel = NavigationPanel::new();
    panel.pick_from_map(PickRole::Start);
    panel.pick_from_map(PickRole::End);

    let picked = panel
        .picker()
        .resolve(Coordinates::new(17.99, 79.54), None)
        .unwrap();
    panel.apply_pick(picked);

    assert!(panel.start().is_none());
    assert_eq!(panel.end().unwrap().name, "End Location");
    assert!(!panel.picker().is_pending());
}

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::entities::coordinates::{is_valid_latitude, is_valid_longitude, Coordinates};
use crate::entities::validate::{finish, is_blank, is_valid_time, Validate};
use crate::error::{field_error, Error, FieldError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Eateries,
    Recreation,
    Educational,
    Administration,
    StaffQuarters,
    Hostel,
    Library,
    Other,
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Eateries,
        Category::Recreation,
        Category::Educational,
        Category::Administration,
        Category::StaffQuarters,
        Category::Hostel,
        Category::Library,
        Category::Other,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Eateries => "eateries",
            Self::Recreation => "recreation",
            Self::Educational => "educational",
            Self::Administration => "administration",
            Self::StaffQuarters => "staff_quarters",
            Self::Hostel => "hostel",
            Self::Library => "library",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Eateries => "Eateries",
            Self::Recreation => "Recreation",
            Self::Educational => "Educational",
            Self::Administration => "Administration",
            Self::StaffQuarters => "Staff Quarters",
            Self::Hostel => "Hostel",
            Self::Library => "Library",
            Self::Other => "Other",
        }
    }

    /// Anything unrecognised lands in `Other`.
    pub fn lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// Keyword guess used when seeding from provider POI names.
    pub fn guess(name: &str) -> Self {
        let name = name.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if has(&["library"]) {
            Self::Library
        } else if has(&["hostel", "hall of residence", "bhavan"]) {
            Self::Hostel
        } else if has(&["quarters", "staff colony"]) {
            Self::StaffQuarters
        } else if has(&["canteen", "mess", "cafe", "food", "restaurant", "bakery"]) {
            Self::Eateries
        } else if has(&["stadium", "gym", "court", "ground", "pool", "sports"]) {
            Self::Recreation
        } else if has(&["registrar", "dean", "admin", "office"]) {
            Self::Administration
        } else if has(&["department", "block", "lab", "school", "college", "institute"]) {
            Self::Educational
        } else {
            Self::Other
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| field_error("category", "Valid category is required"))
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::lossy(&s))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DayHours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<String>,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningHours {
    pub monday: DayHours,
    pub tuesday: DayHours,
    pub wednesday: DayHours,
    pub thursday: DayHours,
    pub friday: DayHours,
    pub saturday: DayHours,
    pub sunday: DayHours,
}

impl OpeningHours {
    pub fn days(&self) -> [(&'static str, &DayHours); 7] {
        [
            ("monday", &self.monday),
            ("tuesday", &self.tuesday),
            ("wednesday", &self.wednesday),
            ("thursday", &self.thursday),
            ("friday", &self.friday),
            ("saturday", &self.saturday),
            ("sunday", &self.sunday),
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub opening_hours: OpeningHours,
    #[serde(default)]
    pub contact_info: ContactInfo,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload. Every field is optional on the wire so that missing
/// values surface as field errors rather than decode failures.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlace {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub opening_hours: Option<OpeningHours>,
    pub contact_info: Option<ContactInfo>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<OpeningHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

fn parse_category(raw: Option<&str>, fields: &mut Vec<FieldError>) -> Option<Category> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    match raw.parse::<Category>() {
        Ok(category) => Some(category),
        Err(err) => {
            fields.extend(err.fields);
            None
        }
    }
}

impl Place {
    pub fn new(params: NewPlace) -> Result<Self, Error> {
        let mut fields = vec![];
        let category = parse_category(params.category.as_deref(), &mut fields).unwrap_or_default();
        let now = Utc::now();

        let place = Self {
            id: Uuid::new_v4(),
            name: params.name.unwrap_or_default().trim().to_string(),
            description: params.description.unwrap_or_default().trim().to_string(),
            category,
            latitude: params.latitude.unwrap_or(f64::NAN),
            longitude: params.longitude.unwrap_or(f64::NAN),
            opening_hours: params.opening_hours.unwrap_or_default(),
            contact_info: params.contact_info.unwrap_or_default(),
            is_active: params.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        finish(place, fields)
    }

    /// Returns the updated copy; `self` is left untouched on error.
    pub fn apply(&self, update: PlaceUpdate) -> Result<Self, Error> {
        let mut fields = vec![];
        let mut place = self.clone();

        if let Some(name) = update.name {
            place.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            place.description = description.trim().to_string();
        }
        if update.category.is_some() {
            place.category = parse_category(update.category.as_deref(), &mut fields)
                .unwrap_or(place.category);
        }
        if let Some(latitude) = update.latitude {
            place.latitude = latitude;
        }
        if let Some(longitude) = update.longitude {
            place.longitude = longitude;
        }
        if let Some(opening_hours) = update.opening_hours {
            place.opening_hours = opening_hours;
        }
        if let Some(contact_info) = update.contact_info {
            place.contact_info = contact_info;
        }
        if let Some(is_active) = update.is_active {
            place.is_active = is_active;
        }
        place.updated_at = Utc::now();

        finish(place, fields)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Case-insensitive substring match against name or description.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        self.name.to_lowercase().contains(&query)
            || (!self.description.is_empty() && self.description.to_lowercase().contains(&query))
    }
}

impl Validate for Place {
    fn field_errors(&self) -> Vec<FieldError> {
        let mut fields = vec![];

        if is_blank(&self.name) {
            fields.push(FieldError::new("name", "Place name is required"));
        }
        if !is_valid_latitude(self.latitude) {
            fields.push(FieldError::new("latitude", "Valid latitude is required"));
        }
        if !is_valid_longitude(self.longitude) {
            fields.push(FieldError::new("longitude", "Valid longitude is required"));
        }

        for (day, hours) in self.opening_hours.days() {
            for (which, value) in [("open", &hours.open), ("close", &hours.close)] {
                if let Some(value) = value {
                    if !value.is_empty() && !is_valid_time(value) {
                        fields.push(FieldError::new(
                            format!("openingHours.{}.{}", day, which),
                            "Time must be formatted as HH:MM",
                        ));
                    }
                }
            }
        }

        fields
    }
}

#[cfg(test)]
pub fn sample_place(name: &str, category: Category) -> Place {
    Place::new(NewPlace {
        name: Some(name.into()),
        category: Some(category.name().into()),
        latitude: Some(17.9833),
        longitude: Some(79.53),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn new_place_defaults_category_to_other() {
    let place = Place::new(NewPlace {
        name: Some("  Main Gate ".into()),
        latitude: Some(17.9833),
        longitude: Some(79.53),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(place.name, "Main Gate");
    assert_eq!(place.category, Category::Other);
    assert!(place.is_active);
    assert_eq!(place.created_at, place.updated_at);
}

#[test]
fn new_place_reports_every_failing_field() {
    let err = Place::new(NewPlace {
        name: Some("   ".into()),
        category: Some("cafeteria".into()),
        latitude: None,
        longitude: Some(540.0),
        ..Default::default()
    })
    .unwrap_err();

    let fields: Vec<&str> = err.fields.iter().map(|f| f.field.as_str()).collect();
    assert!(err.is_validation());
    assert_eq!(fields, vec!["category", "name", "latitude", "longitude"]);
}

#[test]
fn stored_unknown_category_reads_as_other() {
    let json = serde_json::json!({
        "id": Uuid::new_v4(),
        "name": "Kiosk",
        "category": "kiosk",
        "latitude": 17.98,
        "longitude": 79.53,
        "isActive": true,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z",
    });

    let place: Place = serde_json::from_value(json).unwrap();
    assert_eq!(place.category, Category::Other);
    assert_eq!(serde_json::to_value(place.category).unwrap(), "other");
}

#[test]
fn update_replaces_given_fields_and_refreshes_timestamp() {
    let place = sample_place("Canteen", Category::Eateries);

    let updated = place
        .apply(PlaceUpdate {
            description: Some("College canteen".into()),
            category: Some("staff_quarters".into()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(updated.name, "Canteen");
    assert_eq!(updated.description, "College canteen");
    assert_eq!(updated.category, Category::StaffQuarters);
    assert!(updated.updated_at >= place.updated_at);
    assert_eq!(updated.created_at, place.created_at);
}

#[test]
fn update_rejects_bad_opening_hours() {
    let place = sample_place("Library", Category::Library);
    let mut hours = OpeningHours::default();
    hours.monday.open = Some("nine".into());

    let err = place
        .apply(PlaceUpdate {
            opening_hours: Some(hours),
            ..Default::default()
        })
        .unwrap_err();

    assert_eq!(err.fields[0].field, "openingHours.monday.open");
}

#[test]
fn category_guess_from_name() {
    assert_eq!(Category::guess("NIT Warangal Central Library"), Category::Library);
    assert_eq!(Category::guess("Sri Sai Canteen"), Category::Eateries);
    assert_eq!(Category::guess("Badminton Court"), Category::Recreation);
    assert_eq!(Category::guess("Main Gate"), Category::Other);
}

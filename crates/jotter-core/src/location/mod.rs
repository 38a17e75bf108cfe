//! Location permission capability.
//!
//! The core only needs to know whether access is granted and a short place
//! name to show; everything platform specific lives behind
//! [`LocationProvider`].

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Platform permission state for location access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    NotDetermined,
    Denied,
    Restricted,
    Granted,
}

impl PermissionState {
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Source of location permission and place names
pub trait LocationProvider: Send + Sync {
    /// Current permission without prompting
    fn permission_state(&self) -> PermissionState;

    /// Ask the user for permission and return the resulting state
    fn request_permission(&self) -> PermissionState;

    /// Human readable current place, when known
    fn place_name(&self) -> Option<String>;
}

/// Display text for the settings screen
pub fn describe(use_location: bool, state: PermissionState, place: Option<&str>) -> String {
    if !use_location {
        return "Location is off".to_string();
    }

    match state {
        PermissionState::NotDetermined => "Location permission has not been requested".to_string(),
        PermissionState::Denied => "Location permission denied".to_string(),
        PermissionState::Restricted => "Location access is restricted on this device".to_string(),
        PermissionState::Granted => match place.map(str::trim).filter(|place| !place.is_empty()) {
            Some(place) => format!("Current location: {place}"),
            None => "Location unavailable".to_string(),
        },
    }
}

/// Provider with a scripted permission outcome
///
/// Used where no platform location service exists (the CLI) and in tests.
#[derive(Debug, Default)]
pub struct FixedLocationProvider {
    state: Mutex<PermissionState>,
    on_request: PermissionState,
    place: Option<String>,
}

impl FixedLocationProvider {
    /// Provider whose permission request resolves to `on_request`
    pub fn new(on_request: PermissionState, place: Option<String>) -> Self {
        Self {
            state: Mutex::new(PermissionState::NotDetermined),
            on_request,
            place,
        }
    }

    /// Provider that is already granted and reports `place`
    pub fn granted(place: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(PermissionState::Granted),
            on_request: PermissionState::Granted,
            place: Some(place.into()),
        }
    }

    /// Provider that refuses every request
    pub fn denied() -> Self {
        Self::new(PermissionState::Denied, None)
    }

    /// Provider for hosts without any location service
    pub fn restricted() -> Self {
        Self {
            state: Mutex::new(PermissionState::Restricted),
            on_request: PermissionState::Restricted,
            place: None,
        }
    }
}

impl LocationProvider for FixedLocationProvider {
    fn permission_state(&self) -> PermissionState {
        self.state.lock().map_or(PermissionState::NotDetermined, |state| *state)
    }

    fn request_permission(&self) -> PermissionState {
        match self.state.lock() {
            Ok(mut state) => {
                if *state == PermissionState::NotDetermined {
                    *state = self.on_request;
                }
                *state
            }
            Err(_) => PermissionState::NotDetermined,
        }
    }

    fn place_name(&self) -> Option<String> {
        if self.permission_state().is_granted() {
            self.place.clone()
        } else {
            None
        }
    }
}

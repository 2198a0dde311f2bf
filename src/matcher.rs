//! One matching capability over both daemon generations.
//!
//! The UDisks1 matcher names the device that satisfied the constraints. The
//! UDisks2 matcher only reports that the constraints are satisfied somewhere
//! in the object tree. Callers see the difference through [`MatchOutcome`].

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::bus::LegacyTransport;
use crate::constraint::ConstraintList;
use crate::error::Result;
use crate::legacy;
use crate::tree::{self, ObjectTreeSource};

/// Which daemon generation a deployment talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// UDisks1: flat `EnumerateDevices` / `Properties.Get` interface
    Udisks1,
    /// UDisks2: object manager tree
    #[default]
    Udisks2,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Udisks1 => write!(f, "udisks1"),
            Backend::Udisks2 => write!(f, "udisks2"),
        }
    }
}

/// Result of matching a constraint list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// This device satisfied every constraint.
    Device(String),
    /// Every constraint is satisfied, but the backend cannot say by which device.
    Present,
    NoMatch,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        !matches!(self, MatchOutcome::NoMatch)
    }

    pub fn device(&self) -> Option<&str> {
        match self {
            MatchOutcome::Device(udi) => Some(udi),
            MatchOutcome::Present | MatchOutcome::NoMatch => None,
        }
    }
}

pub trait DeviceMatcher {
    fn match_device(&self, constraints: &ConstraintList) -> Result<MatchOutcome>;
}

/// Matcher over the UDisks1 device list.
pub struct LegacyMatcher<'a, T: LegacyTransport + ?Sized> {
    bus: &'a T,
}

impl<'a, T: LegacyTransport + ?Sized> LegacyMatcher<'a, T> {
    pub fn new(bus: &'a T) -> Self {
        Self { bus }
    }
}

impl<T: LegacyTransport + ?Sized> DeviceMatcher for LegacyMatcher<'_, T> {
    fn match_device(&self, constraints: &ConstraintList) -> Result<MatchOutcome> {
        Ok(match legacy::find_item(self.bus, constraints)? {
            Some(udi) => MatchOutcome::Device(udi),
            None => MatchOutcome::NoMatch,
        })
    }
}

/// Matcher over the UDisks2 object tree.
pub struct ObjectTreeMatcher<S: ObjectTreeSource> {
    source: S,
}

impl<S: ObjectTreeSource> ObjectTreeMatcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: ObjectTreeSource> DeviceMatcher for ObjectTreeMatcher<S> {
    fn match_device(&self, constraints: &ConstraintList) -> Result<MatchOutcome> {
        Ok(if tree::find_item_matches_all(&self.source, constraints)? {
            MatchOutcome::Present
        } else {
            MatchOutcome::NoMatch
        })
    }
}

/// Run a matcher, reporting any bus failure as no match.
pub fn match_or_none(matcher: &dyn DeviceMatcher, constraints: &ConstraintList) -> MatchOutcome {
    match matcher.match_device(constraints) {
        Ok(outcome) => {
            debug!(%constraints, ?outcome, "Match finished");
            outcome
        }
        Err(e) => {
            error!(%constraints, "Device match aborted: {}", e);
            MatchOutcome::NoMatch
        }
    }
}

/// Object path of the first UDisks1 device satisfying `constraints`.
pub fn resolve_device<T>(bus: &T, constraints: &ConstraintList) -> Option<String>
where
    T: LegacyTransport + ?Sized,
{
    match match_or_none(&LegacyMatcher::new(bus), constraints) {
        MatchOutcome::Device(udi) => Some(udi),
        MatchOutcome::Present | MatchOutcome::NoMatch => None,
    }
}

/// Whether the UDisks2 tree satisfies `constraints`.
pub fn device_exists<S: ObjectTreeSource>(source: S, constraints: &ConstraintList) -> bool {
    match_or_none(&ObjectTreeMatcher::new(source), constraints).is_match()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::testing::MockTransport;
    use crate::error::HalError;
    use crate::tree::testing::{MockTree, drive};
    use crate::wire::Arg;

    const DEVICES: [&str; 4] = [
        "/org/freedesktop/UDisks/devices/sda",
        "/org/freedesktop/UDisks/devices/sdb",
        "/org/freedesktop/UDisks/devices/sdc",
        "/org/freedesktop/UDisks/devices/sdd",
    ];

    fn legacy_bus() -> MockTransport {
        MockTransport::with_devices(&DEVICES)
            .property(DEVICES[0], "serial", Arg::str("AAA"))
            .property(DEVICES[1], "serial", Arg::str("ABC123"))
            .property(DEVICES[2], "serial", Arg::str("CCC"))
            .property(DEVICES[3], "serial", Arg::str("DDD"))
    }

    #[test]
    fn test_resolve_device_returns_matching_path() {
        let bus = legacy_bus();
        let constraints = ConstraintList::new().with("serial", "ABC123");
        assert_eq!(resolve_device(&bus, &constraints), Some(DEVICES[1].to_string()));
    }

    #[test]
    fn test_resolve_device_with_vacuous_removable() {
        let bus = legacy_bus();
        let constraints = ConstraintList::new()
            .with("serial", "ABC123")
            .with("removable", "");
        assert_eq!(resolve_device(&bus, &constraints), Some(DEVICES[1].to_string()));
    }

    #[test]
    fn test_resolve_device_error_is_no_match() {
        let bus = legacy_bus().enumerate_reply(Err(HalError::CommunicationError {
            message: "gone".to_string(),
        }));
        let constraints = ConstraintList::new().with("serial", "ABC123");
        assert_eq!(resolve_device(&bus, &constraints), None);
    }

    #[test]
    fn test_legacy_matcher_outcome() {
        let bus = legacy_bus();
        let matcher = LegacyMatcher::new(&bus);
        let hit = matcher
            .match_device(&ConstraintList::new().with("serial", "DDD"))
            .unwrap();
        assert_eq!(hit.device(), Some(DEVICES[3]));
        let miss = matcher
            .match_device(&ConstraintList::new().with("serial", "nope"))
            .unwrap();
        assert_eq!(miss, MatchOutcome::NoMatch);
    }

    #[test]
    fn test_tree_matcher_reports_presence_only() {
        let tree = MockTree::new(vec![drive(
            "/org/freedesktop/UDisks2/drives/stick",
            &[("Serial", Arg::str("ABC123"))],
        )]);
        let outcome = ObjectTreeMatcher::new(tree)
            .match_device(&ConstraintList::new().with("Serial", "ABC123"))
            .unwrap();
        assert_eq!(outcome, MatchOutcome::Present);
        assert!(outcome.is_match());
        assert_eq!(outcome.device(), None);
    }

    #[test]
    fn test_device_exists_error_is_false() {
        let tree = MockTree::failing(HalError::BusUnavailable {
            message: "no bus".to_string(),
        });
        assert!(!device_exists(tree, &ConstraintList::new().with("Serial", "ABC123")));
    }

    #[test]
    fn test_backend_serde_names() {
        assert_eq!(serde_json::to_string(&Backend::Udisks1).unwrap(), "\"udisks1\"");
        let backend: Backend = serde_json::from_str("\"udisks2\"").unwrap();
        assert_eq!(backend, Backend::Udisks2);
        assert_eq!(Backend::default().to_string(), "udisks2");
    }
}

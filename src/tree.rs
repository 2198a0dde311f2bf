//! Property scan over the UDisks2 object tree.
//!
//! UDisks2 publishes every drive, block device and filesystem as its own
//! object under `/org/freedesktop/UDisks2`, each carrying several interfaces
//! with their properties. The whole tree is fetched in one
//! `org.freedesktop.DBus.ObjectManager.GetManagedObjects` call and scanned
//! locally. The scan answers *whether* some object carries a property, not
//! *which* object does.

use std::collections::HashMap;

use tracing::debug;
use zbus::blocking::fdo::ObjectManagerProxy;
use zbus::names::OwnedInterfaceName;
use zbus::zvariant::{OwnedObjectPath, OwnedValue};

use crate::bus::{self, UDISKS2_PATH, UDISKS2_SERVICE};
use crate::constraint::ConstraintList;
use crate::error::{HalError, Result};
use crate::wire::Arg;

/// One interface of a remote object with its cached properties.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceFacet {
    pub name: String,
    pub properties: Vec<(String, Arg)>,
}

/// A managed object and every interface attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteObject {
    pub path: String,
    pub facets: Vec<InterfaceFacet>,
}

/// Source of object tree snapshots.
///
/// Each call opens its own session; nothing is retained between calls.
pub trait ObjectTreeSource {
    fn snapshot(&self) -> Result<Vec<RemoteObject>>;
}

/// What a scan found and how much of the tree it walked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub matched: bool,
    pub objects_visited: usize,
    pub facets_visited: usize,
    pub properties_visited: usize,
}

/// Walk every property of every facet of every object.
///
/// Only string-typed values are compared. The walk always covers the whole
/// tree, even after a hit.
pub fn scan(objects: &[RemoteObject], name: &str, expected: &str) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    for object in objects {
        outcome.objects_visited += 1;
        for facet in &object.facets {
            outcome.facets_visited += 1;
            for (property, value) in &facet.properties {
                outcome.properties_visited += 1;
                if let Arg::Str(value) = value {
                    if property == name && value == expected {
                        debug!(
                            path = %object.path,
                            interface = %facet.name,
                            %property,
                            "Property matched"
                        );
                        outcome.matched = true;
                    }
                }
            }
        }
    }
    outcome
}

/// Whether any object carries the string property `name` equal to `expected`.
pub fn scan_for_property<S>(source: &S, name: &str, expected: &str) -> Result<bool>
where
    S: ObjectTreeSource + ?Sized,
{
    let objects = source.snapshot()?;
    let outcome = scan(&objects, name, expected);
    debug!(
        property = name,
        expected,
        matched = outcome.matched,
        objects = outcome.objects_visited,
        interfaces = outcome.facets_visited,
        properties = outcome.properties_visited,
        "Scanned object tree"
    );
    Ok(outcome.matched)
}

/// Whether every non-vacuous constraint is carried by some object.
///
/// Each pair is checked independently against a fresh snapshot, so the
/// pairs need not be satisfied by the same object.
pub fn find_item_matches_all<S>(source: &S, constraints: &ConstraintList) -> Result<bool>
where
    S: ObjectTreeSource + ?Sized,
{
    constraints.all_satisfied(|name, value| scan_for_property(source, name, value))
}

// ─────────────────────────────────────────────────────────────────────────────
// UDisks2 source
// ─────────────────────────────────────────────────────────────────────────────

type ManagedObjects =
    HashMap<OwnedObjectPath, HashMap<OwnedInterfaceName, HashMap<String, OwnedValue>>>;

/// Snapshots of the live UDisks2 daemon on the system bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct Udisks2Tree;

impl Udisks2Tree {
    fn fetch(bus: &bus::SystemBus) -> Result<ManagedObjects> {
        let proxy = ObjectManagerProxy::builder(bus.connection())
            .destination(UDISKS2_SERVICE)
            .and_then(|b| b.path(UDISKS2_PATH))
            .and_then(|b| b.build())
            .map_err(|e| HalError::AllocationFailed {
                context: format!("ObjectManager proxy for {}: {}", UDISKS2_SERVICE, e),
            })?;

        proxy
            .get_managed_objects()
            .map_err(|e| HalError::CommunicationError {
                message: e.to_string(),
            })
    }
}

impl ObjectTreeSource for Udisks2Tree {
    fn snapshot(&self) -> Result<Vec<RemoteObject>> {
        let bus = bus::connect()?;
        let managed = Self::fetch(&bus);
        bus::disconnect(bus);
        Ok(into_objects(managed?))
    }
}

/// Convert a `GetManagedObjects` reply, sorted by path, interface and name.
fn into_objects(managed: ManagedObjects) -> Vec<RemoteObject> {
    let mut objects: Vec<RemoteObject> = managed
        .into_iter()
        .map(|(path, interfaces)| {
            let mut facets: Vec<InterfaceFacet> = interfaces
                .into_iter()
                .map(|(name, properties)| {
                    let mut properties: Vec<(String, Arg)> = properties
                        .into_iter()
                        .map(|(key, value)| (key, Arg::from(&*value)))
                        .collect();
                    properties.sort_by(|a, b| a.0.cmp(&b.0));
                    InterfaceFacet {
                        name: name.to_string(),
                        properties,
                    }
                })
                .collect();
            facets.sort_by(|a, b| a.name.cmp(&b.name));
            RemoteObject {
                path: path.to_string(),
                facets,
            }
        })
        .collect();
    objects.sort_by(|a, b| a.path.cmp(&b.path));
    objects
}


#[cfg(test)]
mod tests {
    use super::testing::{MockTree, drive};
    use super::*;
    use zbus::zvariant::Value;

    const DRIVES: &str = "/org/freedesktop/UDisks2/drives";

    fn two_serials() -> Vec<RemoteObject> {
        vec![
            drive(
                &format!("{DRIVES}/Acme_Stick_ABC123"),
                &[("Serial", Arg::str("ABC123")), ("Vendor", Arg::str("Acme"))],
            ),
            drive(
                &format!("{DRIVES}/Other_Disk_ZZZ999"),
                &[("Serial", Arg::str("ZZZ999")), ("Vendor", Arg::str("Other"))],
            ),
        ]
    }

    #[test]
    fn test_scan_matches_and_walks_whole_tree() {
        let objects = two_serials();
        let outcome = scan(&objects, "Serial", "ABC123");
        assert!(outcome.matched);
        assert_eq!(outcome.objects_visited, 2);
        assert_eq!(outcome.facets_visited, 2);
        assert_eq!(outcome.properties_visited, 4);
    }

    #[test]
    fn test_scan_requires_name_and_value() {
        let objects = two_serials();
        assert!(!scan(&objects, "Serial", "Acme").matched);
        assert!(!scan(&objects, "Vendor", "ABC123").matched);
        assert!(!scan(&objects, "serial", "ABC123").matched);
    }

    #[test]
    fn test_scan_ignores_non_string_values() {
        let objects = vec![drive(
            "/org/freedesktop/UDisks2/block_devices/sdb",
            &[
                ("Device", Arg::object_path("/dev/sdb")),
                ("Removable", Arg::Bool(true)),
                ("Symlinks", Arg::Array(vec![Arg::str("ABC123")])),
            ],
        )];
        assert!(!scan(&objects, "Device", "/dev/sdb").matched);
        assert!(!scan(&objects, "Symlinks", "ABC123").matched);
    }

    #[test]
    fn test_scan_for_property_opens_one_session() {
        let tree = MockTree::new(two_serials());
        assert!(scan_for_property(&tree, "Serial", "ZZZ999").unwrap());
        assert_eq!(tree.sessions(), 1);
    }

    #[test]
    fn test_matches_all_conjunction() {
        let tree = MockTree::new(two_serials());
        let constraints = ConstraintList::new()
            .with("Serial", "ABC123")
            .with("Vendor", "Acme");
        assert!(find_item_matches_all(&tree, &constraints).unwrap());
        assert_eq!(tree.sessions(), 2);
    }

    #[test]
    fn test_matches_all_short_circuits_on_failure() {
        let tree = MockTree::new(two_serials());
        let constraints = ConstraintList::new()
            .with("Serial", "NOPE")
            .with("Vendor", "Acme");
        assert!(!find_item_matches_all(&tree, &constraints).unwrap());
        assert_eq!(tree.sessions(), 1);
    }

    #[test]
    fn test_matches_all_vacuous_pairs_skip_scan() {
        let tree = MockTree::new(two_serials());
        let constraints = ConstraintList::new()
            .with("Serial", "ABC123")
            .with("Model", "")
            .with_optional("Vendor", None);
        assert!(find_item_matches_all(&tree, &constraints).unwrap());
        assert_eq!(tree.sessions(), 1);
    }

    #[test]
    fn test_snapshot_failure_propagates() {
        let tree = MockTree::failing(HalError::BusUnavailable {
            message: "no bus".to_string(),
        });
        let constraints = ConstraintList::new().with("Serial", "ABC123");
        assert!(matches!(
            find_item_matches_all(&tree, &constraints),
            Err(HalError::BusUnavailable { .. })
        ));
    }

    #[test]
    fn test_into_objects_sorts_tree() {
        let mut managed = ManagedObjects::new();
        for path in ["/org/freedesktop/UDisks2/b", "/org/freedesktop/UDisks2/a"] {
            let mut props = HashMap::new();
            for (key, value) in [("Serial", "S"), ("Model", "M")] {
                props.insert(key.to_string(), OwnedValue::try_from(Value::from(value)).unwrap());
            }
            let mut interfaces = HashMap::new();
            interfaces.insert(
                OwnedInterfaceName::try_from("org.freedesktop.UDisks2.Drive").unwrap(),
                props,
            );
            managed.insert(OwnedObjectPath::try_from(path).unwrap(), interfaces);
        }

        let objects = into_objects(managed);
        assert_eq!(objects[0].path, "/org/freedesktop/UDisks2/a");
        assert_eq!(objects[1].path, "/org/freedesktop/UDisks2/b");
        assert_eq!(
            objects[0].facets[0].properties,
            vec![
                ("Model".to_string(), Arg::str("M")),
                ("Serial".to_string(), Arg::str("S")),
            ]
        );
    }
}

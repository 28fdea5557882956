// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Table contract checks run against every backend.

use serde::{Deserialize, Serialize};

use super::{composite_key, key_prefix, StoreError, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub value: i64,
}

impl Sample {
    pub fn new(id: &str, value: i64) -> Self {
        Self {
            id: id.to_string(),
            value,
        }
    }
}

pub fn exercise(table: &dyn Table<Sample>) {
    let k1 = composite_key(&["org1", "a"]);
    let k2 = composite_key(&["org1", "b"]);
    let k3 = composite_key(&["org10", "c"]);

    // insert never overwrites
    table.insert(&k1, &Sample::new("a", 1)).unwrap();
    let dup = table.insert(&k1, &Sample::new("a", 2));
    assert!(matches!(dup, Err(StoreError::AlreadyExists(_))));
    assert_eq!(table.get(&k1).unwrap(), Some(Sample::new("a", 1)));

    // replace never creates
    let missing = table.replace(&k2, &Sample::new("b", 1));
    assert!(matches!(missing, Err(StoreError::NotFound(_))));
    assert_eq!(table.get(&k2).unwrap(), None);

    table.insert(&k2, &Sample::new("b", 2)).unwrap();
    table.replace(&k2, &Sample::new("b", 20)).unwrap();
    assert_eq!(table.get(&k2).unwrap(), Some(Sample::new("b", 20)));

    // prefix scans stay within one organization
    table.insert(&k3, &Sample::new("c", 3)).unwrap();
    let org1 = table.scan_prefix(&key_prefix(&["org1"])).unwrap();
    assert_eq!(org1, vec![Sample::new("a", 1), Sample::new("b", 20)]);

    // predicate removal
    let removed = table.remove_where(&|s: &Sample| s.value > 10).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(table.get(&k2).unwrap(), None);

    // remove returns the old row
    assert_eq!(table.remove(&k1).unwrap(), Some(Sample::new("a", 1)));
    assert_eq!(table.remove(&k1).unwrap(), None);

    table.clear().unwrap();
    assert_eq!(table.get(&k3).unwrap(), None);
    assert!(table.scan_prefix("").unwrap().is_empty());
}

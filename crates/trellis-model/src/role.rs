//! Data roles and per-item role storage.
//!
//! Each item carries several pieces of data distinguished by their role:
//! the main value, the display label, appearance flags, and so on.
//! [`ItemData`] is the ordered role-to-value map owned by every item.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Standard roles for the data stored on an item.
///
/// Roles have stable numeric values so documents written by one build
/// can be read by another. Values 4-255 are reserved for future standard
/// roles; application-specific data goes into `User` roles (>= 256).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The main value of the item (what editors modify).
    Data,
    /// Label shown next to the value.
    Display,
    /// Appearance flags (enabled, hidden) packed as an integer.
    Appearance,
    /// Tooltip text.
    Tooltip,
    /// Application-specific role. `User(n)` maps to numeric value `256 + n`.
    User(u32),
}

impl Role {
    /// Returns the stable numeric value of this role.
    pub fn value(&self) -> u32 {
        match self {
            Role::Data => 0,
            Role::Display => 1,
            Role::Appearance => 2,
            Role::Tooltip => 3,
            Role::User(n) => 256 + n,
        }
    }

    /// Creates a role from its numeric value.
    ///
    /// Returns `None` for reserved but undefined values (4-255).
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            0 => Some(Role::Data),
            1 => Some(Role::Display),
            2 => Some(Role::Appearance),
            3 => Some(Role::Tooltip),
            4..=255 => None,
            n => Some(Role::User(n - 256)),
        }
    }
}

/// Ordered collection of role/value pairs owned by an item.
///
/// Entries keep their insertion order, which is also the order they
/// appear in serialized documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    entries: Vec<(u32, Value)>,
}

impl ItemData {
    /// Creates empty item data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored for the role, if any.
    pub fn get(&self, role: Role) -> Option<&Value> {
        let key = role.value();
        self.entries
            .iter()
            .find(|(r, _)| *r == key)
            .map(|(_, v)| v)
    }

    /// Stores a value for the role, returning `true` if the stored value
    /// actually changed.
    ///
    /// A new role is appended; an existing role is updated in place and
    /// keeps its position.
    pub fn set(&mut self, role: Role, value: Value) -> bool {
        let key = role.value();
        match self.entries.iter_mut().find(|(r, _)| *r == key) {
            Some((_, existing)) => {
                if *existing == value {
                    false
                } else {
                    *existing = value;
                    true
                }
            }
            None => {
                self.entries.push((key, value));
                true
            }
        }
    }

    /// Returns `true` if a value is stored for the role.
    pub fn contains(&self, role: Role) -> bool {
        self.get(role).is_some()
    }

    /// Number of stored roles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no roles are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(numeric role, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.entries.iter().map(|(r, v)| (*r, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_values() {
        assert_eq!(Role::Data.value(), 0);
        assert_eq!(Role::Display.value(), 1);
        assert_eq!(Role::User(0).value(), 256);
        assert_eq!(Role::User(10).value(), 266);
    }

    #[test]
    fn test_role_from_value() {
        assert_eq!(Role::from_value(0), Some(Role::Data));
        assert_eq!(Role::from_value(3), Some(Role::Tooltip));
        assert_eq!(Role::from_value(256), Some(Role::User(0)));
        assert_eq!(Role::from_value(100), None); // Reserved
    }

    #[test]
    fn test_item_data_set_detects_change() {
        let mut data = ItemData::new();
        assert!(data.set(Role::Data, Value::from(1)));
        assert!(!data.set(Role::Data, Value::from(1)));
        assert!(data.set(Role::Data, Value::from(2)));
        assert_eq!(data.get(Role::Data), Some(&Value::from(2)));
    }

    #[test]
    fn test_item_data_preserves_order() {
        let mut data = ItemData::new();
        data.set(Role::Display, Value::from("label"));
        data.set(Role::Data, Value::from(42));
        data.set(Role::Display, Value::from("relabeled"));

        let roles: Vec<u32> = data.iter().map(|(r, _)| r).collect();
        assert_eq!(roles, vec![Role::Display.value(), Role::Data.value()]);
    }
}

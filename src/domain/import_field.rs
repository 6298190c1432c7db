use serde::{Deserialize, Serialize};
use std::fmt;

/// Participant attributes a spreadsheet column can be mapped onto.
///
/// The serde names are the keys the process and save endpoints use on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    #[serde(rename = "cedula")]
    Identifier,
    #[serde(rename = "NombresCompletos")]
    FullName,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "phone")]
    Phone,
    #[serde(rename = "edad")]
    Age,
}

impl FieldKey {
    /// Selector order in the mapping step.
    pub const ALL: [FieldKey; 5] = [
        FieldKey::Identifier,
        FieldKey::FullName,
        FieldKey::Email,
        FieldKey::Phone,
        FieldKey::Age,
    ];

    pub const REQUIRED: [FieldKey; 3] = [FieldKey::Identifier, FieldKey::FullName, FieldKey::Email];

    pub fn wire_key(self) -> &'static str {
        match self {
            FieldKey::Identifier => "cedula",
            FieldKey::FullName => "NombresCompletos",
            FieldKey::Email => "email",
            FieldKey::Phone => "phone",
            FieldKey::Age => "edad",
        }
    }

    pub fn from_wire_key(key: &str) -> Option<Self> {
        FieldKey::ALL.into_iter().find(|field| field.wire_key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldKey::Identifier => "Cédula",
            FieldKey::FullName => "Nombres Completos",
            FieldKey::Email => "Email",
            FieldKey::Phone => "Teléfono",
            FieldKey::Age => "Edad",
        }
    }

    pub fn is_required(self) -> bool {
        FieldKey::REQUIRED.contains(&self)
    }

    /// Label rendered next to the selector.
    pub fn selector_label(self) -> String {
        if self.is_required() {
            format!("{} (requerido)", self.label())
        } else {
            format!("{} (opcional)", self.label())
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_keys_round_trip() {
        for field in FieldKey::ALL {
            assert_eq!(FieldKey::from_wire_key(field.wire_key()), Some(field));
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.wire_key()));
        }
        assert_eq!(FieldKey::from_wire_key("telefono"), None);
    }

    #[test]
    fn test_required_set() {
        assert!(FieldKey::Identifier.is_required());
        assert!(FieldKey::FullName.is_required());
        assert!(FieldKey::Email.is_required());
        assert!(!FieldKey::Phone.is_required());
        assert!(!FieldKey::Age.is_required());
        assert_eq!(FieldKey::Phone.selector_label(), "Teléfono (opcional)");
    }
}

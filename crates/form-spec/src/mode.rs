use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Bit-flag context a form is opened in.
///
/// A form runs in one mode at a time; a constraint lists the modes its field
/// is shown in, and the field is built only when the two intersect.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FormMode(u32);

const NAMED: [(&str, FormMode); 5] = [
    ("create", FormMode::CREATE),
    ("edit", FormMode::EDIT),
    ("custom1", FormMode::CUSTOM1),
    ("custom2", FormMode::CUSTOM2),
    ("custom3", FormMode::CUSTOM3),
];

impl FormMode {
    pub const NONE: FormMode = FormMode(0);
    pub const CREATE: FormMode = FormMode(1);
    pub const EDIT: FormMode = FormMode(1 << 2);
    pub const CUSTOM1: FormMode = FormMode(1 << 3);
    pub const CUSTOM2: FormMode = FormMode(1 << 4);
    pub const CUSTOM3: FormMode = FormMode(1 << 5);
    pub const ALL: FormMode = FormMode(!0);

    pub const fn from_bits(bits: u32) -> Self {
        FormMode(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when the two sets share at least one mode.
    pub const fn intersects(self, other: FormMode) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn contains(self, other: FormMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: FormMode) -> Self {
        FormMode(self.0 | other.0)
    }
}

impl Default for FormMode {
    fn default() -> Self {
        FormMode::ALL
    }
}

impl BitOr for FormMode {
    type Output = FormMode;

    fn bitor(self, rhs: FormMode) -> FormMode {
        self.union(rhs)
    }
}

impl BitOrAssign for FormMode {
    fn bitor_assign(&mut self, rhs: FormMode) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == FormMode::ALL {
            return f.write_str("all");
        }
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut remaining = self.0;
        let mut names = Vec::new();
        for (name, mode) in NAMED {
            if self.contains(mode) {
                names.push(name.to_string());
                remaining &= !mode.0;
            }
        }
        if remaining != 0 {
            names.push(format!("{remaining:#x}"));
        }
        f.write_str(&names.join("|"))
    }
}

impl fmt::Debug for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormMode({self})")
    }
}

impl FromStr for FormMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut mode = FormMode::NONE;
        for part in raw.split('|').map(str::trim) {
            let lower = part.to_ascii_lowercase();
            if lower == "all" {
                return Ok(FormMode::ALL);
            }
            let Some((_, named)) = NAMED.iter().find(|(name, _)| *name == lower) else {
                return Err(format!(
                    "unknown mode '{part}' (expected create, edit, custom1, custom2, custom3 or all)"
                ));
            };
            mode |= *named;
        }
        Ok(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_only_does_not_intersect_create() {
        assert!(!FormMode::EDIT.intersects(FormMode::CREATE));
        assert!(FormMode::EDIT.intersects(FormMode::EDIT));
        assert!(FormMode::ALL.intersects(FormMode::CUSTOM2));
    }

    #[test]
    fn display_joins_names() {
        assert_eq!((FormMode::CREATE | FormMode::EDIT).to_string(), "create|edit");
        assert_eq!(FormMode::ALL.to_string(), "all");
        assert_eq!(FormMode::NONE.to_string(), "none");
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Edit".parse::<FormMode>(), Ok(FormMode::EDIT));
        assert_eq!(
            "create | custom1".parse::<FormMode>(),
            Ok(FormMode::CREATE | FormMode::CUSTOM1)
        );
        assert_eq!("all".parse::<FormMode>(), Ok(FormMode::ALL));
        assert!("draft".parse::<FormMode>().is_err());
    }

    #[test]
    fn serializes_as_bits() {
        let json = serde_json::to_string(&FormMode::EDIT).expect("serialize");
        assert_eq!(json, "4");
        let mode: FormMode = serde_json::from_str("9").expect("deserialize");
        assert_eq!(mode, FormMode::CREATE | FormMode::CUSTOM1);
    }
}

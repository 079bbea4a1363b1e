//! Field kinds and flag decoding
//!
//! A field's kind comes from its `/FT` entry; its sub-kind (checkbox vs radio,
//! dropdown vs list box) comes from bits in the `/Ff` flag word.

use schemars::JsonSchema;
use serde::Serialize;

/// `/Ff` bit 1: the user may not change the value
pub const FLAG_READ_ONLY: u32 = 0x1;
/// `/Ff` bit 2: a value is required before export
pub const FLAG_REQUIRED: u32 = 0x2;
/// `/Ff` bit 16: a button field is a radio button
pub const FLAG_RADIO: u32 = 0x8000;
/// `/Ff` bit 17: a button field is a push button
pub const FLAG_PUSHBUTTON: u32 = 0x10000;
/// `/Ff` bit 18: a choice field is a combo box (dropdown)
pub const FLAG_COMBO: u32 = 0x20000;
/// `/Ff` bit 22: a choice field accepts several selected options
pub const FLAG_MULTI_SELECT: u32 = 0x200000;

/// Label used for codes that do not match any known kind
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Interactive form field kind, serialized as its PDF `/FT` code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub enum FieldKind {
    #[serde(rename = "Tx")]
    Text,
    #[serde(rename = "Ch")]
    Choice,
    #[serde(rename = "Btn")]
    Button,
    #[serde(rename = "Sig")]
    Signature,
    Unknown,
}

impl FieldKind {
    /// Map a `/FT` code to a kind; unrecognized codes become `Unknown`
    pub fn from_code(code: &str) -> Self {
        match code {
            "Tx" => FieldKind::Text,
            "Ch" => FieldKind::Choice,
            "Btn" => FieldKind::Button,
            "Sig" => FieldKind::Signature,
            _ => FieldKind::Unknown,
        }
    }

    /// The `/FT` code, or `None` for `Unknown`
    pub fn code(&self) -> Option<&'static str> {
        match self {
            FieldKind::Text => Some("Tx"),
            FieldKind::Choice => Some("Ch"),
            FieldKind::Button => Some("Btn"),
            FieldKind::Signature => Some("Sig"),
            FieldKind::Unknown => None,
        }
    }

    /// Human-readable label for this kind under the given flag word
    pub fn label(&self, flags: u32) -> &'static str {
        match self {
            FieldKind::Text => "Text Field",
            FieldKind::Signature => "Signature",
            FieldKind::Choice if flags & FLAG_COMBO != 0 => "Dropdown",
            FieldKind::Choice => "List Box",
            FieldKind::Button if flags & FLAG_RADIO != 0 => "Radio Button",
            FieldKind::Button => "Checkbox",
            FieldKind::Unknown => UNKNOWN_LABEL,
        }
    }
}

/// Label for a raw `/FT` code and `/Ff` flag word
pub fn label_for(type_code: &str, flags: u32) -> &'static str {
    FieldKind::from_code(type_code).label(flags)
}

pub fn is_checkbox(kind: FieldKind, flags: u32) -> bool {
    kind == FieldKind::Button && flags & (FLAG_RADIO | FLAG_PUSHBUTTON) == 0
}

pub fn is_radio_button(kind: FieldKind, flags: u32) -> bool {
    kind == FieldKind::Button && flags & FLAG_RADIO != 0
}

pub fn is_push_button(kind: FieldKind, flags: u32) -> bool {
    kind == FieldKind::Button && flags & FLAG_PUSHBUTTON != 0
}

pub fn is_dropdown(kind: FieldKind, flags: u32) -> bool {
    kind == FieldKind::Choice && flags & FLAG_COMBO != 0
}

pub fn is_list_box(kind: FieldKind, flags: u32) -> bool {
    kind == FieldKind::Choice && flags & FLAG_COMBO == 0
}

pub fn is_multi_select(kind: FieldKind, flags: u32) -> bool {
    kind == FieldKind::Choice && flags & FLAG_MULTI_SELECT != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Tx", 0, "Text Field")]
    #[case("Tx", 0xFFFF_FFFF, "Text Field")]
    #[case("Sig", FLAG_COMBO, "Signature")]
    #[case("Ch", 0, "List Box")]
    #[case("Ch", FLAG_COMBO, "Dropdown")]
    #[case("Ch", FLAG_COMBO | FLAG_READ_ONLY, "Dropdown")]
    #[case("Btn", 0, "Checkbox")]
    #[case("Btn", FLAG_RADIO, "Radio Button")]
    #[case("Btn", FLAG_COMBO, "Checkbox")]
    #[case("Ch", FLAG_RADIO, "List Box")]
    #[case("Zz", FLAG_RADIO, "Unknown")]
    #[case("", 0, "Unknown")]
    #[case("tx", 0, "Unknown")]
    fn test_label_for(#[case] code: &str, #[case] flags: u32, #[case] expected: &str) {
        assert_eq!(label_for(code, flags), expected);
    }

    #[test]
    fn test_code_round_trip() {
        for kind in [
            FieldKind::Text,
            FieldKind::Choice,
            FieldKind::Button,
            FieldKind::Signature,
        ] {
            let code = kind.code().unwrap();
            assert_eq!(FieldKind::from_code(code), kind);
        }
        assert_eq!(FieldKind::Unknown.code(), None);
    }

    #[test]
    fn test_sub_kind_predicates() {
        assert!(is_checkbox(FieldKind::Button, 0));
        assert!(!is_checkbox(FieldKind::Button, FLAG_RADIO));
        assert!(!is_checkbox(FieldKind::Button, FLAG_PUSHBUTTON));
        assert!(!is_checkbox(FieldKind::Text, 0));
        assert!(is_radio_button(FieldKind::Button, FLAG_RADIO));
        assert!(is_push_button(FieldKind::Button, FLAG_PUSHBUTTON));
        assert!(is_dropdown(FieldKind::Choice, FLAG_COMBO));
        assert!(is_list_box(FieldKind::Choice, 0));
        assert!(!is_list_box(FieldKind::Text, 0));
        assert!(is_multi_select(FieldKind::Choice, FLAG_MULTI_SELECT));
        assert!(!is_multi_select(FieldKind::Choice, FLAG_COMBO));
        assert!(!is_multi_select(FieldKind::Text, FLAG_MULTI_SELECT));
    }

    #[test]
    fn test_serializes_as_wire_code() {
        assert_eq!(serde_json::to_string(&FieldKind::Choice).unwrap(), "\"Ch\"");
        assert_eq!(
            serde_json::to_string(&FieldKind::Unknown).unwrap(),
            "\"Unknown\""
        );
    }
}

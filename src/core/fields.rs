//! Loosely-typed input rows and the alias tables used to read them
//!
//! Spreadsheets and repository dumps spell the same logical column many ways
//! (`ISBN`, `isbn`, `ISBN-13`, `ean`...). Each logical field is described by an
//! ordered list of accessor keys that is tried in priority order.

use serde_json::{Map, Value};

/// One row as produced by a spreadsheet/CSV/JSON parser: column name to raw value
pub type RawRow = Map<String, Value>;

/// Ordered accessor keys for one logical field
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    /// Logical field name, used in log output
    pub name: &'static str,
    /// Candidate column names in priority order
    pub keys: &'static [&'static str],
    /// Match column names ignoring ASCII case and surrounding whitespace
    pub case_insensitive: bool,
}

impl FieldAliases {
    const fn exact(name: &'static str, keys: &'static [&'static str]) -> Self {
        Self {
            name,
            keys,
            case_insensitive: false,
        }
    }

    const fn any_case(name: &'static str, keys: &'static [&'static str]) -> Self {
        Self {
            name,
            keys,
            case_insensitive: true,
        }
    }

    /// First present value in priority order
    ///
    /// `null` and blank strings count as absent so the next alias is tried.
    pub fn get<'a>(&self, row: &'a RawRow) -> Option<&'a Value> {
        self.keys.iter().find_map(|key| {
            let value = if self.case_insensitive {
                row.iter()
                    .find(|(column, _)| column.trim().eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            } else {
                row.get(*key)
            };
            value.filter(|v| is_present(v))
        })
    }

    /// First present value rendered as text
    pub fn text(&self, row: &RawRow) -> Option<String> {
        self.get(row).map(value_text)
    }
}

// Repository dataset columns

pub const REPO_ISBN: FieldAliases =
    FieldAliases::exact("isbn", &["ISBN", "isbn", "ISBN-13", "isbn-13", "ean", "EAN"]);
pub const REPO_TITLE: FieldAliases = FieldAliases::exact("title", &["Title", "TITLE", "title"]);
pub const REPO_MASTER_ORDER_ID: FieldAliases = FieldAliases::exact(
    "master_order_id",
    &["Master Order ID", "masterOrderId", "MasterOrderId", "Master Order Id"],
);
pub const REPO_STATUS: FieldAliases = FieldAliases::exact("status", &["Status", "status"]);
pub const REPO_PAPER: FieldAliases = FieldAliases::exact(
    "paper_description",
    &["Paper Desc", "paperDesc", "Paper Description"],
);
pub const REPO_TRIM_HEIGHT: FieldAliases =
    FieldAliases::exact("trim_height", &["Trim Height", "trimHeight"]);
pub const REPO_TRIM_WIDTH: FieldAliases =
    FieldAliases::exact("trim_width", &["Trim Width", "trimWidth"]);
pub const REPO_BIND_STYLE: FieldAliases =
    FieldAliases::exact("bind_style", &["Bind Style", "bindStyle"]);
pub const REPO_EXTENT: FieldAliases = FieldAliases::exact("extent", &["Extent", "extent"]);
pub const REPO_COVER_SPEC: FieldAliases = FieldAliases::exact(
    "cover_spec_code",
    &["Cover Spec Code 1", "Cover Spec Code", "coverSpecCode1"],
);
pub const REPO_COVER_SPINE: FieldAliases =
    FieldAliases::exact("cover_spine", &["Cover Spine", "coverSpine"]);
pub const REPO_PACKING: FieldAliases = FieldAliases::exact("packing", &["Packing", "packing"]);

// Order upload columns

pub const ORDER_ISBN: FieldAliases = FieldAliases::any_case("isbn", &["ISBN", "ISBN-13", "EAN"]);
pub const ORDER_QUANTITY: FieldAliases =
    FieldAliases::any_case("quantity", &["Qty", "Quantity", "Rem"]);
pub const ORDER_MASTER: FieldAliases = FieldAliases::any_case(
    "master",
    &["Master", "Master Order ID", "MasterOrderId", "Master Order Id"],
);

/// Whether a raw cell carries anything at all
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Render a raw cell as text
///
/// Integral floats are written without a fraction or exponent, so a value a
/// spreadsheet coerced to `9.780140175936e12` comes back as `9780140175936`.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_exact_aliases_follow_priority() {
        let r = row(json!({"ean": "111", "ISBN-13": "222"}));
        assert_eq!(REPO_ISBN.text(&r).as_deref(), Some("222"));
    }

    #[test]
    fn test_exact_aliases_are_case_sensitive() {
        let r = row(json!({"Isbn": "111"}));
        assert!(REPO_ISBN.get(&r).is_none());
    }

    #[test]
    fn test_any_case_aliases() {
        let r = row(json!({" qty ": 4}));
        assert_eq!(ORDER_QUANTITY.text(&r).as_deref(), Some("4"));

        let r = row(json!({"MASTER ORDER ID": "SA1657"}));
        assert_eq!(ORDER_MASTER.text(&r).as_deref(), Some("SA1657"));
    }

    #[test]
    fn test_blank_values_fall_through() {
        let r = row(json!({"Qty": "  ", "Quantity": null, "Rem": 3}));
        assert_eq!(ORDER_QUANTITY.text(&r).as_deref(), Some("3"));
    }

    #[test]
    fn test_value_text_numbers() {
        assert_eq!(value_text(&json!(9780140175936_i64)), "9780140175936");
        assert_eq!(value_text(&json!(9.78014e12)), "9780140000000");
        assert_eq!(value_text(&json!(2.5)), "2.5");
        assert_eq!(value_text(&json!(true)), "true");
        assert_eq!(value_text(&Value::Null), "");
    }
}

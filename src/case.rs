//! Request key normalization: clients may send camelCase (`shelterId`), columns are snake_case.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "shelterId" -> "shelter_id", "adoptionStatus" -> "adoption_status"; snake_case is unchanged.
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Take a JSON object's entries with snake_case keys. An explicit snake_case key wins over its
/// camelCase twin.
pub fn object_into_snake_case(obj: Map<String, Value>) -> HashMap<String, Value> {
    let mut out = HashMap::with_capacity(obj.len());
    for (k, v) in obj {
        let snake = to_snake_case(&k);
        if snake == k {
            out.insert(snake, v);
        } else {
            out.entry(snake).or_insert(v);
        }
    }
    out
}

/// Query parameters with snake_case keys.
pub fn query_into_snake_case(params: HashMap<String, String>) -> HashMap<String, String> {
    params.into_iter().map(|(k, v)| (to_snake_case(&k), v)).collect()
}

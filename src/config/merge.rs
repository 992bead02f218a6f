//! Field-by-field merging of configuration tiers.
//!
//! Objects merge key by key, everything else (including arrays such as the
//! catalog section list) is replaced by the higher tier. A null in a higher
//! tier means "not specified" and keeps the lower value.

use serde_json::Value;

/// Merge `overlay` into `base` in place.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Merge tiers in order; later tiers win.
pub fn merge_tiers(tiers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for tier in tiers {
        if merged.is_null() {
            merged = tier;
        } else {
            merge_into(&mut merged, tier);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_keys_override_individually() {
        let mut base = json!({"server": {"port": 31995, "bind": "127.0.0.1"}});
        merge_into(&mut base, json!({"server": {"port": 8080}}));
        assert_eq!(base, json!({"server": {"port": 8080, "bind": "127.0.0.1"}}));
    }

    #[test]
    fn catalog_sections_are_replaced_wholesale() {
        let mut base = json!({"catalog": {"sections": [
            {"name": "Positioning", "topics": ["PR"]},
            {"name": "Sourcing", "topics": ["Officers"]}
        ]}});
        merge_into(
            &mut base,
            json!({"catalog": {"sections": [{"name": "Ops", "topics": ["Logistics"]}]}}),
        );
        assert_eq!(
            base["catalog"]["sections"],
            json!([{"name": "Ops", "topics": ["Logistics"]}])
        );
    }

    #[test]
    fn null_keeps_lower_tier() {
        let mut base = json!({"domains": {"min_role": "team_lead"}});
        merge_into(&mut base, json!({"domains": {"min_role": null}}));
        assert_eq!(base["domains"]["min_role"], "team_lead");
    }

    #[test]
    fn later_tiers_win() {
        let merged = merge_tiers(vec![
            json!({"server": {"port": 1, "busy_timeout_ms": 10}}),
            json!({"server": {"port": 2}}),
            json!({"server": {"port": 3}}),
        ]);
        assert_eq!(merged, json!({"server": {"port": 3, "busy_timeout_ms": 10}}));
    }
}

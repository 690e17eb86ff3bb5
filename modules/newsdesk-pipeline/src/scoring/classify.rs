use newsdesk_common::{RegionScope, RegionalClassification};

use super::keywords::*;

/// Editorial category inferred from keyword presence. First match wins.
pub fn infer_category(lower: &str) -> &'static str {
    if any_term(lower, LABOR_ACTIONS) {
        "labor_action"
    } else if any_term(lower, SAFETY_TERMS) {
        "workplace_safety"
    } else if any_term(lower, WAGE_TERMS) {
        "wages"
    } else if any_term(lower, POLICY_TERMS) {
        "policy"
    } else if any_term(lower, BUSINESS_TERMS) {
        "business"
    } else {
        "news"
    }
}

/// National when national/federal language appears, otherwise local with the
/// first named metro or state as region id.
pub fn classify_region(lower: &str) -> RegionalClassification {
    if any_term(lower, NATIONAL_TERMS) {
        return RegionalClassification {
            scope: RegionScope::National,
            region_id: None,
        };
    }
    let region_id = MAJOR_METROS
        .iter()
        .find(|(term, _)| has_term(lower, term))
        .map(|(_, slug)| slug.to_string())
        .or_else(|| {
            STATES
                .iter()
                .find(|s| has_term(lower, s))
                .map(|s| s.replace(' ', "_"))
        });
    RegionalClassification {
        scope: RegionScope::Local,
        region_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labor_action_takes_precedence_over_safety() {
        assert_eq!(infer_category("strike over safety violations"), "labor_action");
        assert_eq!(infer_category("osha cites plant for hazards"), "workplace_safety");
        assert_eq!(infer_category("ceo announces record profits"), "business");
        assert_eq!(infer_category("a parade downtown"), "news");
    }

    #[test]
    fn metro_mention_is_local_with_region() {
        let r = classify_region("workers in nyc walk out");
        assert_eq!(r.scope, RegionScope::Local);
        assert_eq!(r.region_id.as_deref(), Some("new_york"));
    }

    #[test]
    fn federal_language_is_national() {
        let r = classify_region("nlrb rules on federal complaint");
        assert_eq!(r.scope, RegionScope::National);
        assert!(r.region_id.is_none());
    }

    #[test]
    fn state_mention_uses_state_slug() {
        let r = classify_region("new jersey transit drivers");
        assert_eq!(r.region_id.as_deref(), Some("new_jersey"));
    }
}

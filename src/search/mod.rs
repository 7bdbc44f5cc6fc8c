pub mod field;
pub mod filters;

use chrono::{DateTime, Months, Utc};
use serde::Serialize;

use crate::models::{QuestionAge, QuestionType, SortOrder, SortType};
use filters::SearchState;

/// Request parameters for the filter query, derived from the page state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionQuery {
    pub company_names: Vec<String>,
    pub end_date: DateTime<Utc>,
    pub locations: Vec<String>,
    pub question_types: Vec<QuestionType>,
    pub roles: Vec<String>,
    pub sort_order: SortOrder,
    pub sort_type: SortType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub question_age: QuestionAge,
}

impl QuestionQuery {
    /// Project the state onto a request. `now` is the page's pinned render time.
    pub fn from_state(state: &SearchState, now: DateTime<Utc>) -> Self {
        let age = *state.question_age.get();
        Self {
            company_names: state.companies.values().to_vec(),
            end_date: now,
            locations: state.locations.values().to_vec(),
            question_types: state.question_types.values().to_vec(),
            roles: state.roles.values().to_vec(),
            sort_order: *state.sort_order.get(),
            sort_type: *state.sort_type.get(),
            start_date: start_date(age, now),
            question_age: age,
        }
    }

    /// Cache key over the full request shape.
    ///
    /// The concrete window is a function of the age bucket and the render
    /// time, so the bucket stands in for both dates.
    pub fn cache_key(&self) -> String {
        serde_json::json!({
            "companyNames": self.company_names,
            "locations": self.locations,
            "questionAge": self.question_age.as_str(),
            "questionTypes": self.question_types,
            "roles": self.roles,
            "sortOrder": self.sort_order,
            "sortType": self.sort_type,
        })
        .to_string()
    }
}

/// Lower bound of the date window for an age bucket. `All` has none.
pub fn start_date(age: QuestionAge, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    age.months_back()
        .and_then(|m| now.checked_sub_months(Months::new(m)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::params::QueryParams;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn six_month_window_ends_at_render_time() {
        let state = SearchState::from_query(&QueryParams::parse("questionAge=last-6-months"));
        let q = QuestionQuery::from_state(&state, now());
        assert_eq!(q.end_date, now());
        // Feb has no 31st; the month arithmetic clamps to its last day.
        assert_eq!(
            q.start_date,
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn each_bucket_maps_to_its_lower_bound() {
        let n = now();
        assert_eq!(
            start_date(QuestionAge::LastMonth, n),
            Some(Utc.with_ymd_and_hms(2024, 7, 31, 12, 0, 0).unwrap())
        );
        assert_eq!(
            start_date(QuestionAge::LastYear, n),
            Some(Utc.with_ymd_and_hms(2023, 8, 31, 12, 0, 0).unwrap())
        );
        assert_eq!(start_date(QuestionAge::All, n), None);
    }

    #[test]
    fn all_time_omits_start_date_on_the_wire() {
        let state = SearchState::from_query(&QueryParams::parse("companies=Google"));
        let q = QuestionQuery::from_state(&state, now());
        let json = serde_json::to_value(&q).unwrap();
        assert!(json.get("startDate").is_none());
        assert_eq!(json["companyNames"], serde_json::json!(["Google"]));
        assert_eq!(json["sortOrder"], "DESC");
        assert_eq!(json["sortType"], "TOP");
        assert!(json.get("questionAge").is_none());
    }

    #[test]
    fn cache_key_ignores_render_time_but_not_filters() {
        let state = SearchState::from_query(&QueryParams::parse("questionAge=last-month"));
        let a = QuestionQuery::from_state(&state, now());
        let b = QuestionQuery::from_state(&state, now() + chrono::Duration::hours(3));
        assert_eq!(a.cache_key(), b.cache_key());

        let other = SearchState::from_query(&QueryParams::parse("questionAge=last-year"));
        let c = QuestionQuery::from_state(&other, now());
        assert_ne!(a.cache_key(), c.cache_key());
    }
}

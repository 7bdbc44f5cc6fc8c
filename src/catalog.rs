//! Static option lists shown by the filter sections and the sort bar.

use serde::Serialize;

use crate::models::{QuestionAge, QuestionType, SortOrder, SortType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOption {
    pub label: &'static str,
    pub value: &'static str,
}

/// An option annotated with whether the current state selects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckedOption {
    pub label: String,
    pub value: String,
    pub checked: bool,
}

const fn opt(label: &'static str, value: &'static str) -> FilterOption {
    FilterOption { label, value }
}

pub const COMPANIES: &[FilterOption] = &[
    opt("Amazon", "Amazon"),
    opt("Apple", "Apple"),
    opt("Google", "Google"),
    opt("Meta", "Meta"),
    opt("Microsoft", "Microsoft"),
    opt("Netflix", "Netflix"),
    opt("Shopee", "Shopee"),
    opt("Stripe", "Stripe"),
];

pub const ROLES: &[FilterOption] = &[
    opt("Software Engineer", "Software Engineer"),
    opt("Software Engineer Intern", "Software Engineer Intern"),
    opt("Frontend Engineer", "Frontend Engineer"),
    opt("Backend Engineer", "Backend Engineer"),
    opt("Data Scientist", "Data Scientist"),
    opt("Product Manager", "Product Manager"),
];

pub const LOCATIONS: &[FilterOption] = &[
    opt("Singapore", "Singapore"),
    opt("Menlo Park", "Menlo Park"),
    opt("Mountain View", "Mountain View"),
    opt("New York", "New York"),
    opt("London", "London"),
    opt("Seattle", "Seattle"),
    opt("Hong Kong", "Hong Kong"),
];

pub fn question_type_label(t: QuestionType) -> &'static str {
    match t {
        QuestionType::Coding => "Coding",
        QuestionType::SystemDesign => "System Design",
        QuestionType::Behavioral => "Behavioral",
        QuestionType::Theory => "Theory",
    }
}

pub fn question_age_label(age: QuestionAge) -> &'static str {
    match age {
        QuestionAge::LastMonth => "Last month",
        QuestionAge::LastSixMonths => "Last 6 months",
        QuestionAge::LastYear => "Last year",
        QuestionAge::All => "All",
    }
}

pub fn sort_order_label(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "Ascending",
        SortOrder::Desc => "Descending",
    }
}

pub fn sort_type_label(sort: SortType) -> &'static str {
    match sort {
        SortType::Top => "Top",
        SortType::New => "New",
    }
}

/// Mark each catalog option as checked when `selected` holds its value.
pub fn checked_options(catalog: &[FilterOption], selected: &[String]) -> Vec<CheckedOption> {
    catalog
        .iter()
        .map(|o| CheckedOption {
            label: o.label.to_string(),
            value: o.value.to_string(),
            checked: selected.iter().any(|s| s == o.value),
        })
        .collect()
}

/// Typeahead match: case-insensitive substring on the label. An empty query keeps everything.
pub fn filter_options(options: Vec<CheckedOption>, query: &str) -> Vec<CheckedOption> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return options;
    }
    options
        .into_iter()
        .filter(|o| o.label.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_options_mark_selected_values() {
        let opts = checked_options(COMPANIES, &["Google".to_string(), "Nowhere".to_string()]);
        assert_eq!(opts.len(), COMPANIES.len());
        let checked: Vec<_> = opts.iter().filter(|o| o.checked).map(|o| o.value.as_str()).collect();
        assert_eq!(checked, vec!["Google"]);
    }

    #[test]
    fn typeahead_matches_label_substring() {
        let opts = checked_options(LOCATIONS, &[]);
        let hits = filter_options(opts.clone(), "  park");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, "Menlo Park");
        assert_eq!(filter_options(opts.clone(), "").len(), opts.len());
    }
}

use std::fmt;

use crate::catalog::{self, CheckedOption};
use crate::error::StateError;
use crate::models::{QuestionAge, QuestionType, SortOrder, SortType};
use crate::search::field::{MultiField, ParamCodec, SingleField};
use crate::sync::params::QueryParams;

pub const PARAM_COMPANIES: &str = "companies";
pub const PARAM_QUESTION_TYPES: &str = "questionTypes";
pub const PARAM_QUESTION_AGE: &str = "questionAge";
pub const PARAM_ROLES: &str = "roles";
pub const PARAM_LOCATIONS: &str = "locations";
pub const PARAM_SORT_ORDER: &str = "sortOrder";
pub const PARAM_SORT_TYPE: &str = "sortType";

/// The four checkbox-style filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiFieldKind {
    Companies,
    QuestionTypes,
    Roles,
    Locations,
}

impl MultiFieldKind {
    pub fn param(&self) -> &'static str {
        match self {
            MultiFieldKind::Companies => PARAM_COMPANIES,
            MultiFieldKind::QuestionTypes => PARAM_QUESTION_TYPES,
            MultiFieldKind::Roles => PARAM_ROLES,
            MultiFieldKind::Locations => PARAM_LOCATIONS,
        }
    }
}

impl fmt::Display for MultiFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param())
    }
}

/// A user interaction with the filter sidebar or sort bar.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterAction {
    Toggle {
        field: MultiFieldKind,
        value: String,
        checked: bool,
    },
    SetQuestionAge(QuestionAge),
    SetSortOrder(SortOrder),
    SetSortType(SortType),
    ClearFilters,
}

/// Filter and sort state for the browse page.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub companies: MultiField<String>,
    pub question_types: MultiField<QuestionType>,
    pub question_age: SingleField<QuestionAge>,
    pub roles: MultiField<String>,
    pub locations: MultiField<String>,
    pub sort_order: SingleField<SortOrder>,
    pub sort_type: SingleField<SortType>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchState {
    /// Every field defaulted and not yet initialized.
    pub fn new() -> Self {
        Self {
            companies: MultiField::new(),
            question_types: MultiField::new(),
            question_age: SingleField::new(QuestionAge::All),
            roles: MultiField::new(),
            locations: MultiField::new(),
            sort_order: SingleField::new(SortOrder::Desc),
            sort_type: SingleField::new(SortType::Top),
        }
    }

    /// Initialize every field from the URL query.
    pub fn hydrate(&mut self, query: &QueryParams) {
        self.companies.hydrate(query.get_all(PARAM_COMPANIES));
        self.question_types.hydrate(query.get_all(PARAM_QUESTION_TYPES));
        self.question_age.hydrate(query.first(PARAM_QUESTION_AGE));
        self.roles.hydrate(query.get_all(PARAM_ROLES));
        self.locations.hydrate(query.get_all(PARAM_LOCATIONS));
        self.sort_order.hydrate(query.first(PARAM_SORT_ORDER));
        self.sort_type.hydrate(query.first(PARAM_SORT_TYPE));
    }

    pub fn from_query(query: &QueryParams) -> Self {
        let mut state = Self::new();
        state.hydrate(query);
        state
    }

    pub fn is_initialized(&self) -> bool {
        self.companies.is_initialized()
            && self.question_types.is_initialized()
            && self.question_age.is_initialized()
            && self.roles.is_initialized()
            && self.locations.is_initialized()
            && self.sort_order.is_initialized()
            && self.sort_type.is_initialized()
    }

    /// True when any filter narrows the result set. Sort fields never count.
    pub fn has_filters(&self) -> bool {
        !self.companies.is_empty()
            || !self.question_types.is_empty()
            || !self.question_age.is_default()
            || !self.roles.is_empty()
            || !self.locations.is_empty()
    }

    pub fn apply(&mut self, action: FilterAction) -> Result<(), StateError> {
        match action {
            FilterAction::Toggle {
                field,
                value,
                checked,
            } => self.toggle(field, &value, checked)?,
            FilterAction::SetQuestionAge(age) => self.question_age.set(age),
            FilterAction::SetSortOrder(order) => self.sort_order.set(order),
            FilterAction::SetSortType(sort) => self.sort_type.set(sort),
            FilterAction::ClearFilters => self.clear_filters(),
        }
        Ok(())
    }

    fn toggle(&mut self, field: MultiFieldKind, token: &str, checked: bool) -> Result<(), StateError> {
        let unknown = || StateError::UnknownOption {
            field,
            token: token.to_string(),
        };
        match field {
            MultiFieldKind::Companies => {
                let value = String::from_param(token).ok_or_else(unknown)?;
                self.companies.toggle(value, checked);
            }
            MultiFieldKind::QuestionTypes => {
                let value = QuestionType::from_param(token).ok_or_else(unknown)?;
                self.question_types.toggle(value, checked);
            }
            MultiFieldKind::Roles => {
                let value = String::from_param(token).ok_or_else(unknown)?;
                self.roles.toggle(value, checked);
            }
            MultiFieldKind::Locations => {
                let value = String::from_param(token).ok_or_else(unknown)?;
                self.locations.toggle(value, checked);
            }
        }
        Ok(())
    }

    /// Empty every multi-valued filter and reset the age bucket. Sort is kept.
    pub fn clear_filters(&mut self) {
        self.companies.set(Vec::new());
        self.question_types.set(Vec::new());
        self.question_age.reset();
        self.roles.set(Vec::new());
        self.locations.set(Vec::new());
    }

    /// Canonical URL query for the current state.
    pub fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query.set(PARAM_COMPANIES, self.companies.tokens());
        query.set(PARAM_LOCATIONS, self.locations.tokens());
        query.set(PARAM_QUESTION_AGE, vec![self.question_age.token()]);
        query.set(PARAM_QUESTION_TYPES, self.question_types.tokens());
        query.set(PARAM_ROLES, self.roles.tokens());
        query.set(PARAM_SORT_ORDER, vec![self.sort_order.token()]);
        query.set(PARAM_SORT_TYPE, vec![self.sort_type.token()]);
        query
    }

    pub fn company_options(&self) -> Vec<CheckedOption> {
        catalog::checked_options(catalog::COMPANIES, self.companies.values())
    }

    pub fn role_options(&self) -> Vec<CheckedOption> {
        catalog::checked_options(catalog::ROLES, self.roles.values())
    }

    pub fn location_options(&self) -> Vec<CheckedOption> {
        catalog::checked_options(catalog::LOCATIONS, self.locations.values())
    }

    pub fn question_type_options(&self) -> Vec<CheckedOption> {
        QuestionType::ALL
            .into_iter()
            .map(|t| CheckedOption {
                label: catalog::question_type_label(t).to_string(),
                value: t.as_str().to_string(),
                checked: self.question_types.contains(&t),
            })
            .collect()
    }

    /// Single-select: exactly one option is checked.
    pub fn question_age_options(&self) -> Vec<CheckedOption> {
        QuestionAge::ALL
            .into_iter()
            .map(|a| CheckedOption {
                label: catalog::question_age_label(a).to_string(),
                value: a.as_str().to_string(),
                checked: *self.question_age.get() == a,
            })
            .collect()
    }

    pub fn sort_order_options(&self) -> Vec<CheckedOption> {
        [SortOrder::Asc, SortOrder::Desc]
            .into_iter()
            .map(|o| CheckedOption {
                label: catalog::sort_order_label(o).to_string(),
                value: o.as_str().to_string(),
                checked: *self.sort_order.get() == o,
            })
            .collect()
    }

    pub fn sort_type_options(&self) -> Vec<CheckedOption> {
        [SortType::Top, SortType::New]
            .into_iter()
            .map(|s| CheckedOption {
                label: catalog::sort_type_label(s).to_string(),
                value: s.as_str().to_string(),
                checked: *self.sort_type.get() == s,
            })
            .collect()
    }
}

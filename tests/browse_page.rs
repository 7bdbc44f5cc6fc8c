use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};

use qbrowse::cache::CacheStore;
use qbrowse::error::RemoteError;
use qbrowse::models::{NewQuestion, Question, QuestionAge, QuestionType, SortOrder};
use qbrowse::page::BrowsePage;
use qbrowse::remote::client::QueryClient;
use qbrowse::remote::QuestionService;
use qbrowse::search::filters::{FilterAction, MultiFieldKind};
use qbrowse::search::QuestionQuery;
use qbrowse::sync::navigator::{MemoryHistory, Navigator};
use qbrowse::sync::params::{Location, QueryParams};
use qbrowse::sync::SyncOutcome;

#[derive(Default)]
struct FakeService {
    questions: Vec<Question>,
    fail: RefCell<bool>,
    requests: RefCell<Vec<QuestionQuery>>,
    created: RefCell<Vec<NewQuestion>>,
}

impl QuestionService for FakeService {
    fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, RemoteError> {
        self.requests.borrow_mut().push(query.clone());
        if *self.fail.borrow() {
            return Err(RemoteError::Procedure {
                procedure: "getQuestionsByFilter".into(),
                message: "INTERNAL_SERVER_ERROR".into(),
            });
        }
        Ok(self
            .questions
            .iter()
            .filter(|q| query.company_names.is_empty() || query.company_names.contains(&q.company))
            .cloned()
            .collect())
    }

    fn create_question(&self, question: &NewQuestion) -> Result<(), RemoteError> {
        self.created.borrow_mut().push(question.clone());
        Ok(())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
}

fn question(id: &str, company: &str) -> Question {
    Question {
        id: id.into(),
        content: format!("Question {id}"),
        company: company.into(),
        location: "Singapore".into(),
        role: "Software Engineer".into(),
        question_type: QuestionType::Coding,
        seen_at: now(),
        num_answers: 1,
        num_votes: 2,
        received_count: 3,
    }
}

fn service() -> FakeService {
    FakeService {
        questions: vec![question("q1", "Google"), question("q2", "Meta")],
        ..Default::default()
    }
}

fn mount<'a>(
    url: &str,
    svc: &'a FakeService,
    store: Option<CacheStore>,
) -> BrowsePage<MemoryHistory, &'a FakeService> {
    let location = Location::parse(url, "/questions/browse").unwrap();
    BrowsePage::mount(MemoryHistory::new(location), QueryClient::new(svc, store), now()).unwrap()
}

fn toggle(field: MultiFieldKind, value: &str, checked: bool) -> FilterAction {
    FilterAction::Toggle {
        field,
        value: value.into(),
        checked,
    }
}

#[test]
fn deep_link_is_reconstructed_and_canonicalized() {
    let svc = service();
    let page = mount("/questions/browse?companies=Google&sortOrder=asc", &svc, None);

    let state = page.state();
    assert_eq!(state.companies.tokens(), vec!["Google"]);
    assert_eq!(*state.sort_order.get(), SortOrder::Asc);
    assert_eq!(*state.question_age.get(), QuestionAge::All);
    assert!(state.question_types.is_empty());

    assert!(page.is_loaded());
    assert_eq!(page.navigator().replace_count(), 1);
    assert_eq!(
        page.navigator().current().unwrap().to_string(),
        "/questions/browse?companies=Google&questionAge=all&sortOrder=ASC&sortType=TOP"
    );
}

#[test]
fn page_renders_nothing_until_router_is_ready() {
    let svc = service();
    let mut page = BrowsePage::mount(
        MemoryHistory::pending(),
        QueryClient::new(&svc, None),
        now(),
    )
    .unwrap();

    assert!(!page.state().is_initialized());
    assert!(page.render().is_none());
    assert_eq!(page.navigator().replace_count(), 0);

    page.load().unwrap();
    assert!(svc.requests.borrow().is_empty());

    // A filter change before init still cannot write the URL.
    let outcome = page
        .dispatch([toggle(MultiFieldKind::Roles, "SWE", true)])
        .unwrap();
    assert_eq!(outcome, SyncOutcome::NotInitialized);
    assert!(page.render().is_none());
}

#[test]
fn clear_filters_is_a_single_url_rewrite() {
    let svc = service();
    let mut page = mount(
        "?companies=Google&roles=SWE&locations=Singapore&questionTypes=coding&questionAge=last-year",
        &svc,
        None,
    );
    assert!(page.state().has_filters());
    let before = page.navigator().replace_count();

    let outcome = page.dispatch([FilterAction::ClearFilters]).unwrap();
    assert_eq!(outcome, SyncOutcome::Replaced);
    assert_eq!(page.navigator().replace_count(), before + 1);
    assert!(!page.state().has_filters());
    assert_eq!(
        page.navigator().current().unwrap().query,
        QueryParams::parse("questionAge=all&sortOrder=DESC&sortType=TOP")
    );
}

#[test]
fn batched_actions_produce_one_rewrite_and_reject_atomically() {
    let svc = service();
    let mut page = mount("", &svc, None);
    let before = page.navigator().replace_count();

    page.dispatch([
        toggle(MultiFieldKind::Companies, "Google", true),
        toggle(MultiFieldKind::Companies, "Meta", true),
        FilterAction::SetQuestionAge(QuestionAge::LastMonth),
    ])
    .unwrap();
    assert_eq!(page.navigator().replace_count(), before + 1);

    let err = page.dispatch([
        toggle(MultiFieldKind::Companies, "Apple", true),
        toggle(MultiFieldKind::QuestionTypes, "riddles", true),
    ]);
    assert!(err.is_err());
    assert_eq!(page.state().companies.tokens(), vec!["Google", "Meta"]);
    assert_eq!(page.navigator().replace_count(), before + 1);

    // No-op batch leaves the URL alone.
    let outcome = page
        .dispatch([toggle(MultiFieldKind::Companies, "Google", true)])
        .unwrap();
    assert_eq!(outcome, SyncOutcome::Unchanged);
    assert_eq!(page.navigator().replace_count(), before + 1);
}

#[test]
fn query_carries_filters_and_pinned_window() {
    let svc = service();
    let mut page = mount("?questionAge=last-6-months&companies=Google", &svc, None);
    page.load().unwrap();

    let requests = svc.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].company_names, vec!["Google"]);
    assert_eq!(requests[0].end_date, now());
    assert_eq!(
        requests[0].start_date,
        Some(Utc.with_ymd_and_hms(2023, 12, 15, 9, 30, 0).unwrap())
    );

    let view = page.render().unwrap();
    let ids: Vec<_> = view.questions.unwrap().iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["q1"]);
    assert!(view.has_filters);
}

#[test]
fn previous_results_stay_visible_when_refresh_fails() {
    let svc = service();
    let mut page = mount("", &svc, None);
    page.load().unwrap();
    assert_eq!(page.render().unwrap().questions.unwrap().len(), 2);

    *svc.fail.borrow_mut() = true;
    page.dispatch([toggle(MultiFieldKind::Companies, "Meta", true)])
        .unwrap();
    assert!(page.load().is_err());

    let view = page.render().unwrap();
    assert_eq!(view.questions.unwrap().len(), 2);
    assert!(view.is_previous_data);
    assert!(view.error.unwrap().contains("INTERNAL_SERVER_ERROR"));
}

#[test]
fn unchanged_filters_are_not_refetched() {
    let svc = service();
    let mut page = mount("", &svc, None);
    page.load().unwrap();
    page.load().unwrap();
    assert_eq!(svc.requests.borrow().len(), 1);

    page.dispatch([FilterAction::SetSortOrder(SortOrder::Asc)]).unwrap();
    page.load().unwrap();
    assert_eq!(svc.requests.borrow().len(), 2);
}

#[test]
fn contributing_invalidates_and_refetches() {
    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::open(&dir.path().join("cache.db")).unwrap();
    let svc = service();
    let mut page = mount("", &svc, Some(store));
    page.load().unwrap();
    assert_eq!(page.client().store().unwrap().stats().unwrap().entries, 1);

    let new_question = NewQuestion {
        company_id: "Google".into(),
        content: "Implement an LRU cache".into(),
        location: "Singapore".into(),
        question_type: QuestionType::Coding,
        role: "Software Engineer".into(),
        seen_at: now(),
    };
    page.contribute(&new_question).unwrap();

    assert_eq!(svc.created.borrow().len(), 1);
    assert_eq!(svc.requests.borrow().len(), 2);
    assert_eq!(page.client().store().unwrap().stats().unwrap().entries, 1);
}

#[test]
fn offline_mode_serves_the_stored_copy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let svc = service();

    let mut first = mount("?companies=Meta", &svc, Some(CacheStore::open(&path).unwrap()));
    first.load().unwrap();
    drop(first);

    let mut second = mount("?companies=Meta", &svc, Some(CacheStore::open(&path).unwrap()));
    assert!(second.load_offline());
    let view = second.render().unwrap();
    assert_eq!(view.questions.unwrap()[0].id, "q2");
    assert!(view.is_stale);
    assert!(view.cached_at.is_some());
    assert_eq!(svc.requests.borrow().len(), 1);

    let mut other = mount("?companies=Apple", &svc, Some(CacheStore::open(&path).unwrap()));
    assert!(!other.load_offline());
}

#[test]
fn empty_result_reports_active_filters() {
    let svc = service();
    let mut page = mount("?companies=Netflix", &svc, None);
    page.load().unwrap();
    let view = page.render().unwrap();
    assert!(view.questions.unwrap().is_empty());
    assert!(view.has_filters);

    let checked: Vec<_> = view
        .filters
        .companies
        .iter()
        .filter(|o| o.checked)
        .map(|o| o.value.as_str())
        .collect();
    assert_eq!(checked, vec!["Netflix"]);
}

/// Router whose location only becomes available after the page mounts.
#[derive(Clone, Default)]
struct LateRouter {
    location: Rc<RefCell<Option<Location>>>,
}

impl Navigator for LateRouter {
    fn current(&self) -> Option<Location> {
        self.location.borrow().clone()
    }

    fn replace(&mut self, location: Location) -> Result<()> {
        *self.location.borrow_mut() = Some(location);
        Ok(())
    }
}

#[test]
fn late_router_keeps_its_own_path_on_write_back() {
    let svc = service();
    let router = LateRouter::default();
    let mut page = BrowsePage::mount(router.clone(), QueryClient::new(&svc, None), now()).unwrap();
    assert!(!page.is_loaded());

    *router.location.borrow_mut() = Some(
        Location::parse("/portal/questions?companies=Google", "/questions/browse").unwrap(),
    );
    assert_eq!(page.init().unwrap(), SyncOutcome::Replaced);

    assert_eq!(
        router.current().unwrap().to_string(),
        "/portal/questions?companies=Google&questionAge=all&sortOrder=DESC&sortType=TOP"
    );
    assert_eq!(page.render().unwrap().location, router.current().unwrap().to_string());

    page.dispatch([toggle(MultiFieldKind::Roles, "SWE", true)]).unwrap();
    assert_eq!(router.current().unwrap().pathname, "/portal/questions");
}

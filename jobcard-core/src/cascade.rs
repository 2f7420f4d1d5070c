//! Dependent dropdowns: customer → address → contact person → {number, email}.
//!
//! [`DependentOptionSet`] is the state and its transitions. It never performs
//! I/O: selecting a value returns [`FetchTicket`]s describing the option lists
//! that now need loading, and the caller hands each response back through
//! [`DependentOptionSet::apply`].
//!
//! Every ticket carries a request token. Selecting a new value re-stamps the
//! affected levels, so a response that arrives after a newer selection no
//! longer matches and is dropped. This keeps a slow answer for an old customer
//! from filling the address list of the current one.
//!
//! [`OptionCascade`] drives the state against a [`JobCardBackend`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{BackendError, JobCardBackend};
use crate::models::{Notice, OptionItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CascadeLevel {
    Customer,
    Address,
    ContactPerson,
    ContactNumber,
    Email,
}

impl CascadeLevel {
    pub const ALL: [CascadeLevel; 5] = [
        CascadeLevel::Customer,
        CascadeLevel::Address,
        CascadeLevel::ContactPerson,
        CascadeLevel::ContactNumber,
        CascadeLevel::Email,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Address => "address",
            Self::ContactPerson => "contact_person",
            Self::ContactNumber => "contact_number",
            Self::Email => "email",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == s.trim())
    }

    /// Position in the chain. Contact number and email share the last tier.
    pub fn depth(&self) -> u8 {
        match self {
            Self::Customer => 0,
            Self::Address => 1,
            Self::ContactPerson => 2,
            Self::ContactNumber | Self::Email => 3,
        }
    }

    /// Levels whose option lists are keyed by this level's selection.
    pub fn children(&self) -> &'static [CascadeLevel] {
        match self {
            Self::Customer => &[Self::Address],
            Self::Address => &[Self::ContactPerson],
            Self::ContactPerson => &[Self::ContactNumber, Self::Email],
            Self::ContactNumber | Self::Email => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Every level deeper than this one.
    pub fn descendants(&self) -> impl Iterator<Item = CascadeLevel> {
        let depth = self.depth();
        Self::ALL.into_iter().filter(move |level| level.depth() > depth)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CascadeLevel {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An option list that needs loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub level: CascadeLevel,
    /// Selection of the parent level; `None` for the customer list.
    pub parent: Option<String>,
    token: u64,
}

impl FetchTicket {
    pub fn token(&self) -> u64 {
        self.token
    }
}

/// What happened to a fetch response handed to [`DependentOptionSet::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { level: CascadeLevel, count: usize },
    /// A newer request superseded this one; the response was dropped.
    Stale { level: CascadeLevel },
    /// The fetch failed; the list was emptied.
    Failed { level: CascadeLevel, notice: Notice },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LevelState {
    selection: Option<String>,
    options: Vec<OptionItem>,
    token: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependentOptionSet {
    levels: [LevelState; 5],
    last_token: u64,
}

impl DependentOptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(
        &self,
        level: CascadeLevel,
    ) -> Option<&str> {
        self.levels[level.index()].selection.as_deref()
    }

    pub fn options(
        &self,
        level: CascadeLevel,
    ) -> &[OptionItem] {
        &self.levels[level.index()].options
    }

    /// Ticket for the root customer list, loaded when the form opens.
    pub fn request_root(&mut self) -> FetchTicket {
        self.issue(CascadeLevel::Customer, None)
    }

    /// Selects `value` at `level`.
    ///
    /// Re-selecting the current value does nothing. Otherwise every deeper
    /// selection and option list is cleared and one ticket is returned per
    /// immediate child level. A blank value clears without fetching.
    pub fn select(
        &mut self,
        level: CascadeLevel,
        value: &str,
    ) -> Vec<FetchTicket> {
        if level.is_leaf() {
            self.select_leaf(level, value);
            return Vec::new();
        }

        let value = value.trim();
        let new_selection = (!value.is_empty()).then(|| value.to_string());
        if self.levels[level.index()].selection == new_selection {
            debug!(%level, value, "selection unchanged; nothing to fetch");
            return Vec::new();
        }

        self.levels[level.index()].selection = new_selection.clone();
        for descendant in level.descendants() {
            let state = &mut self.levels[descendant.index()];
            state.selection = None;
            state.options.clear();
            // Invalidate anything still in flight for the cleared level.
            self.last_token += 1;
            state.token = self.last_token;
        }

        let Some(parent) = new_selection else {
            return Vec::new();
        };

        level
            .children()
            .iter()
            .map(|child| self.issue(*child, Some(parent.clone())))
            .collect()
    }

    /// Sets a leaf selection. Leaves have no dependents.
    pub fn select_leaf(
        &mut self,
        level: CascadeLevel,
        value: &str,
    ) {
        let value = value.trim();
        self.levels[level.index()].selection = (!value.is_empty()).then(|| value.to_string());
    }

    /// Hands a fetch response back to the state.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<OptionItem>, BackendError>,
    ) -> ApplyOutcome {
        let level = ticket.level;
        let state = &mut self.levels[level.index()];

        if state.token != ticket.token {
            debug!(
                %level,
                ticket = ticket.token,
                current = state.token,
                "discarding stale option response"
            );
            return ApplyOutcome::Stale { level };
        }

        match result {
            Ok(options) => {
                let count = options.len();
                state.options = options;
                ApplyOutcome::Applied { level, count }
            }
            Err(error) => {
                warn!(%level, parent = ?ticket.parent, %error, "option fetch failed");
                state.options.clear();
                ApplyOutcome::Failed {
                    level,
                    notice: Notice::error(format!(
                        "Could not load {} options: {error}",
                        level.as_str().replace('_', " ")
                    )),
                }
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn issue(
        &mut self,
        level: CascadeLevel,
        parent: Option<String>,
    ) -> FetchTicket {
        self.last_token += 1;
        self.levels[level.index()].token = self.last_token;
        FetchTicket {
            level,
            parent,
            token: self.last_token,
        }
    }
}

/// Drives a [`DependentOptionSet`] against a backend.
///
/// [`change`](Self::change) awaits fetches one at a time, so each level is
/// populated before the next one is requested. A caller that lets fetches
/// overlap uses [`begin`](Self::begin), [`fetch`](Self::fetch) and
/// [`complete`](Self::complete) instead; late answers are then dropped by the
/// token check. Failures become notices; nothing is retried.
pub struct OptionCascade {
    backend: Arc<dyn JobCardBackend>,
    state: DependentOptionSet,
}

impl OptionCascade {
    pub fn new(backend: Arc<dyn JobCardBackend>) -> Self {
        Self {
            backend,
            state: DependentOptionSet::new(),
        }
    }

    pub fn state(&self) -> &DependentOptionSet {
        &self.state
    }

    /// Loads the customer list.
    pub async fn load_root(&mut self) -> Vec<Notice> {
        let ticket = self.state.request_root();
        self.fulfil(vec![ticket]).await
    }

    /// Changes a controlling selection and reloads its children.
    pub async fn change(
        &mut self,
        level: CascadeLevel,
        value: &str,
    ) -> Vec<Notice> {
        let tickets = self.state.select(level, value);
        self.fulfil(tickets).await
    }

    /// Changes a selection without fetching. Each returned ticket goes to
    /// [`fetch`](Self::fetch) and its answer to [`complete`](Self::complete).
    pub fn begin(
        &mut self,
        level: CascadeLevel,
        value: &str,
    ) -> Vec<FetchTicket> {
        self.state.select(level, value)
    }

    pub async fn fetch(
        &self,
        ticket: &FetchTicket,
    ) -> Result<Vec<OptionItem>, BackendError> {
        self.backend
            .fetch_options(ticket.level, ticket.parent.as_deref())
            .await
    }

    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<OptionItem>, BackendError>,
    ) -> ApplyOutcome {
        self.state.apply(ticket, result)
    }

    pub fn change_leaf(
        &mut self,
        level: CascadeLevel,
        value: &str,
    ) {
        self.state.select_leaf(level, value);
    }

    /// Re-applies saved selections when an existing record is opened.
    ///
    /// Selections are applied from the root down, awaiting each level's
    /// option list before the next selection is made.
    pub async fn restore(
        &mut self,
        selections: &[(CascadeLevel, String)],
    ) -> Vec<Notice> {
        let mut ordered: Vec<_> = selections.iter().collect();
        ordered.sort_by_key(|(level, _)| level.depth());

        let mut notices = Vec::new();
        for (level, value) in ordered {
            if level.is_leaf() {
                self.change_leaf(*level, value);
            } else {
                notices.extend(self.change(*level, value).await);
            }
        }
        notices
    }

    pub fn clear(&mut self) {
        self.state.clear();
    }

    async fn fulfil(
        &mut self,
        tickets: Vec<FetchTicket>,
    ) -> Vec<Notice> {
        let mut notices = Vec::new();
        for ticket in tickets {
            let result = self.fetch(&ticket).await;
            if let ApplyOutcome::Failed { notice, .. } = self.complete(&ticket, result) {
                notices.push(notice);
            }
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::UniquenessCheck;
    use crate::models::{JobCardRecord, SaveOutcome};

    fn items(values: &[&str]) -> Vec<OptionItem> {
        values.iter().map(|v| OptionItem::new(*v, *v)).collect()
    }

    // ── recording backend ────────────────────────────────────────────────
    /// Records every fetch and answers from a fixed table. Parents listed in
    /// `failing` produce a transport error.
    #[derive(Default)]
    struct RecordingBackend {
        fetches: Mutex<Vec<(CascadeLevel, Option<String>)>>,
        failing: Vec<&'static str>,
    }

    impl RecordingBackend {
        fn fetches(&self) -> Vec<(CascadeLevel, Option<String>)> {
            self.fetches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobCardBackend for RecordingBackend {
        async fn fetch_options(
            &self,
            level: CascadeLevel,
            parent: Option<&str>,
        ) -> Result<Vec<OptionItem>, BackendError> {
            self.fetches
                .lock()
                .unwrap()
                .push((level, parent.map(str::to_string)));
            if parent.is_some_and(|p| self.failing.contains(&p)) {
                return Err(BackendError::Transport("timeout".to_string()));
            }
            let prefix = parent.unwrap_or("root");
            Ok((1..=2)
                .map(|n| {
                    let value = format!("{prefix}-{level}-{n}");
                    OptionItem::new(value.clone(), value)
                })
                .collect())
        }
        async fn next_sequence(&self, _category_code: &str) -> Result<String, BackendError> {
            unimplemented!()
        }
        async fn check_unique(
            &self,
            _field: &str,
            _value: &str,
        ) -> Result<UniquenessCheck, BackendError> {
            unimplemented!()
        }
        async fn save(&self, _record: &JobCardRecord) -> Result<SaveOutcome, BackendError> {
            unimplemented!()
        }
    }

    // =========================================================================
    // CascadeLevel tests
    // =========================================================================

    #[test]
    fn contact_person_fans_out_to_both_leaves() {
        assert_eq!(
            CascadeLevel::ContactPerson.children(),
            &[CascadeLevel::ContactNumber, CascadeLevel::Email]
        );
    }

    #[test]
    fn customer_descendants_are_every_other_level() {
        let descendants: Vec<_> = CascadeLevel::Customer.descendants().collect();

        assert_eq!(descendants, CascadeLevel::ALL[1..].to_vec());
    }

    #[test]
    fn parse_round_trips() {
        for level in CascadeLevel::ALL {
            assert_eq!(CascadeLevel::parse(level.as_str()), Some(level));
        }
    }

    // =========================================================================
    // DependentOptionSet tests
    // =========================================================================

    /// A set with every level selected and populated.
    fn fully_selected() -> DependentOptionSet {
        let mut set = DependentOptionSet::new();
        for ticket in set.select(CascadeLevel::Customer, "ACME") {
            set.apply(&ticket, Ok(items(&["HQ"])));
        }
        for ticket in set.select(CascadeLevel::Address, "HQ") {
            set.apply(&ticket, Ok(items(&["Asha"])));
        }
        for ticket in set.select(CascadeLevel::ContactPerson, "Asha") {
            set.apply(&ticket, Ok(items(&["x"])));
        }
        set.select_leaf(CascadeLevel::ContactNumber, "555-0100");
        set.select_leaf(CascadeLevel::Email, "asha@acme.test");
        set
    }

    #[test]
    fn reselecting_same_value_issues_no_tickets() {
        let mut set = fully_selected();
        let before = set.clone();

        let tickets = set.select(CascadeLevel::Customer, "ACME");

        assert!(tickets.is_empty());
        assert_eq!(set, before);
    }

    #[test]
    fn changing_customer_clears_descendants_and_requests_addresses() {
        let mut set = fully_selected();

        let tickets = set.select(CascadeLevel::Customer, "Globex");

        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].level, CascadeLevel::Address);
        assert_eq!(tickets[0].parent.as_deref(), Some("Globex"));
        assert_eq!(set.selection(CascadeLevel::Customer), Some("Globex"));
        for level in CascadeLevel::Customer.descendants() {
            assert_eq!(set.selection(level), None, "{level} selection should be cleared");
            assert!(set.options(level).is_empty(), "{level} options should be cleared");
        }
    }

    #[test]
    fn changing_contact_person_requests_both_leaves() {
        let mut set = fully_selected();

        let tickets = set.select(CascadeLevel::ContactPerson, "Ravi");
        let levels: Vec<_> = tickets.iter().map(|t| t.level).collect();

        assert_eq!(levels, vec![CascadeLevel::ContactNumber, CascadeLevel::Email]);
        assert_eq!(set.selection(CascadeLevel::Address), Some("HQ"));
    }

    #[test]
    fn blank_selection_clears_without_fetching() {
        let mut set = fully_selected();

        let tickets = set.select(CascadeLevel::Address, "");

        assert!(tickets.is_empty());
        assert_eq!(set.selection(CascadeLevel::Address), None);
        assert_eq!(set.selection(CascadeLevel::ContactPerson), None);
        assert_eq!(set.selection(CascadeLevel::Customer), Some("ACME"));
    }

    #[test]
    fn leaf_selection_has_no_cascade() {
        let mut set = fully_selected();

        let tickets = set.select(CascadeLevel::Email, "other@acme.test");

        assert!(tickets.is_empty());
        assert_eq!(set.selection(CascadeLevel::Email), Some("other@acme.test"));
        assert_eq!(set.selection(CascadeLevel::ContactNumber), Some("555-0100"));
    }

    #[test]
    fn stale_response_does_not_overwrite_newer_list() {
        let mut set = DependentOptionSet::new();
        let for_a = set.select(CascadeLevel::Customer, "A").remove(0);
        let for_b = set.select(CascadeLevel::Customer, "B").remove(0);

        let newer = set.apply(&for_b, Ok(items(&["B-addr"])));
        let older = set.apply(&for_a, Ok(items(&["A-addr"])));

        assert_eq!(
            newer,
            ApplyOutcome::Applied {
                level: CascadeLevel::Address,
                count: 1
            }
        );
        assert_eq!(
            older,
            ApplyOutcome::Stale {
                level: CascadeLevel::Address
            }
        );
        assert_eq!(set.options(CascadeLevel::Address), items(&["B-addr"]).as_slice());
    }

    #[test]
    fn ancestor_change_invalidates_grandchild_fetch() {
        let mut set = DependentOptionSet::new();
        for ticket in set.select(CascadeLevel::Customer, "A") {
            set.apply(&ticket, Ok(items(&["HQ"])));
        }
        let persons = set.select(CascadeLevel::Address, "HQ").remove(0);

        set.select(CascadeLevel::Customer, "B");
        let outcome = set.apply(&persons, Ok(items(&["Asha"])));

        assert_eq!(
            outcome,
            ApplyOutcome::Stale {
                level: CascadeLevel::ContactPerson
            }
        );
        assert!(set.options(CascadeLevel::ContactPerson).is_empty());
    }

    #[test]
    fn failed_fetch_empties_list_and_reports() {
        let mut set = DependentOptionSet::new();
        let ticket = set.select(CascadeLevel::Customer, "A").remove(0);

        let outcome = set.apply(&ticket, Err(BackendError::Transport("timeout".into())));

        match outcome {
            ApplyOutcome::Failed { level, notice } => {
                assert_eq!(level, CascadeLevel::Address);
                assert_eq!(
                    notice.message,
                    "Could not load address options: Transport error: timeout"
                );
            }
            other => panic!("expected Failed, got {other:#?}"),
        }
        assert!(set.options(CascadeLevel::Address).is_empty());
    }

    // =========================================================================
    // OptionCascade tests
    // =========================================================================

    #[tokio::test]
    async fn same_customer_twice_fetches_once() {
        let backend = Arc::new(RecordingBackend::default());
        let mut cascade = OptionCascade::new(backend.clone());

        cascade.change(CascadeLevel::Customer, "ACME").await;
        cascade.change(CascadeLevel::Customer, "ACME").await;

        assert_eq!(
            backend.fetches(),
            vec![(CascadeLevel::Address, Some("ACME".to_string()))]
        );
    }

    #[tokio::test]
    async fn different_customer_issues_exactly_one_address_fetch() {
        let backend = Arc::new(RecordingBackend::default());
        let mut cascade = OptionCascade::new(backend.clone());
        cascade
            .restore(&[
                (CascadeLevel::Customer, "ACME".to_string()),
                (CascadeLevel::Address, "HQ".to_string()),
            ])
            .await;
        let before = backend.fetches().len();

        cascade.change(CascadeLevel::Customer, "Globex").await;

        let after = backend.fetches();
        assert_eq!(after.len(), before + 1);
        assert_eq!(after[before], (CascadeLevel::Address, Some("Globex".to_string())));
        assert_eq!(cascade.state().selection(CascadeLevel::Address), None);
        assert_eq!(cascade.state().options(CascadeLevel::Address).len(), 2);
    }

    #[tokio::test]
    async fn restore_populates_levels_in_order() {
        let backend = Arc::new(RecordingBackend::default());
        let mut cascade = OptionCascade::new(backend.clone());

        let notices = cascade
            .restore(&[
                (CascadeLevel::Email, "asha@acme.test".to_string()),
                (CascadeLevel::ContactPerson, "Asha".to_string()),
                (CascadeLevel::Customer, "ACME".to_string()),
                (CascadeLevel::Address, "HQ".to_string()),
            ])
            .await;

        assert!(notices.is_empty());
        let levels: Vec<_> = backend.fetches().into_iter().map(|(l, _)| l).collect();
        assert_eq!(
            levels,
            vec![
                CascadeLevel::Address,
                CascadeLevel::ContactPerson,
                CascadeLevel::ContactNumber,
                CascadeLevel::Email,
            ]
        );
        let state = cascade.state();
        assert_eq!(state.selection(CascadeLevel::Customer), Some("ACME"));
        assert_eq!(state.selection(CascadeLevel::Address), Some("HQ"));
        assert_eq!(state.selection(CascadeLevel::ContactPerson), Some("Asha"));
        assert_eq!(state.selection(CascadeLevel::Email), Some("asha@acme.test"));
    }

    #[tokio::test]
    async fn failed_fetch_surfaces_notice_without_blocking() {
        let backend = Arc::new(RecordingBackend {
            failing: vec!["ACME"],
            ..Default::default()
        });
        let mut cascade = OptionCascade::new(backend.clone());

        let notices = cascade.change(CascadeLevel::Customer, "ACME").await;

        assert_eq!(notices.len(), 1);
        assert!(cascade.state().options(CascadeLevel::Address).is_empty());
        assert_eq!(cascade.state().selection(CascadeLevel::Customer), Some("ACME"));

        // The operator can carry on with another customer.
        let notices = cascade.change(CascadeLevel::Customer, "Globex").await;
        assert!(notices.is_empty());
        assert_eq!(cascade.state().options(CascadeLevel::Address).len(), 2);
    }

    #[tokio::test]
    async fn overlapping_fetches_keep_only_the_newest_answer() {
        let backend = Arc::new(RecordingBackend::default());
        let mut cascade = OptionCascade::new(backend.clone());

        let acme = cascade.begin(CascadeLevel::Customer, "ACME");
        let globex = cascade.begin(CascadeLevel::Customer, "Globex");
        let (acme_result, globex_result) =
            tokio::join!(cascade.fetch(&acme[0]), cascade.fetch(&globex[0]));

        // Globex answers first; ACME's answer arrives after it.
        let fresh = cascade.complete(&globex[0], globex_result);
        let late = cascade.complete(&acme[0], acme_result);

        assert_eq!(
            fresh,
            ApplyOutcome::Applied {
                level: CascadeLevel::Address,
                count: 2
            }
        );
        assert_eq!(
            late,
            ApplyOutcome::Stale {
                level: CascadeLevel::Address
            }
        );
        assert_eq!(backend.fetches().len(), 2);
        assert_eq!(
            cascade.state().options(CascadeLevel::Address),
            items(&["Globex-address-1", "Globex-address-2"]).as_slice()
        );
    }

    #[tokio::test]
    async fn load_root_fetches_customers_without_parent() {
        let backend = Arc::new(RecordingBackend::default());
        let mut cascade = OptionCascade::new(backend.clone());

        cascade.load_root().await;

        assert_eq!(backend.fetches(), vec![(CascadeLevel::Customer, None)]);
        assert_eq!(cascade.state().options(CascadeLevel::Customer).len(), 2);
    }
}

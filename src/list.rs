use serde::Serialize;
use tracing::{debug, warn};

use crate::entities::Entity;
use crate::error::{DeskError, DeskResult};
use crate::repository::Repository;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub filtered: usize,
    pub current_page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub search_term: String,
    pub sort_field: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub retryable: bool,
}

/// Search, sort and pagination state over one entity collection.
#[derive(Debug)]
pub struct ListController<T> {
    items: Vec<T>,
    is_loading: bool,
    error: Option<DeskError>,
    search_term: String,
    sort: Option<(String, SortDirection)>,
    current_page: usize,
    page_size: usize,
    generation: u64,
}

impl<T: Entity> ListController<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            error: None,
            search_term: String::new(),
            sort: None,
            current_page: 1,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            generation: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&DeskError> {
        self.error.as_ref()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort(&self) -> Option<(&str, SortDirection)> {
        self.sort.as_ref().map(|(f, d)| (f.as_str(), *d))
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.is_loading = true;
        LoadTicket(self.generation)
    }

    /// Applies a fetch result unless a newer load or a reset superseded it.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: DeskResult<Vec<T>>) -> bool {
        if ticket.0 != self.generation {
            debug!(entity = T::KIND.resource(), "dropping superseded list result");
            return false;
        }
        self.is_loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
                self.current_page = self.current_page.min(self.page_count());
            }
            Err(e) => {
                warn!(entity = T::KIND.resource(), error = %e, "list load failed");
                self.error = Some(e);
            }
        }
        true
    }

    /// Fetches through whichever repository the data source resolved.
    pub fn load(&mut self, repo: &dyn Repository<T>) -> bool {
        let ticket = self.begin_load();
        let result = repo.list();
        self.finish_load(ticket, result);
        self.error.is_none()
    }

    /// Forgets loaded data, e.g. after sign-out. In-flight loads are dropped.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.is_loading = false;
        self.error = None;
        self.search_term.clear();
        self.sort = None;
        self.current_page = 1;
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.trim().to_string();
        self.current_page = 1;
    }

    /// Cycles `field` through ascending, descending, unsorted. A different
    /// field always starts ascending.
    pub fn toggle_sort(&mut self, field: &str) -> DeskResult<()> {
        if !T::SORT_FIELDS.contains(&field) {
            return Err(DeskError::invalid_input(
                "field",
                format!("cannot sort {} by {}", T::KIND.resource(), field),
            ));
        }
        self.sort = match self.sort.take() {
            Some((f, SortDirection::Asc)) if f == field => Some((f, SortDirection::Desc)),
            Some((f, SortDirection::Desc)) if f == field => None,
            _ => Some((field.to_string(), SortDirection::Asc)),
        };
        self.current_page = 1;
        Ok(())
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.page_count());
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.clamp(1, MAX_PAGE_SIZE);
        self.current_page = 1;
    }

    fn matches(item: &T, needle: &str) -> bool {
        needle.is_empty()
            || item
                .search_fields()
                .iter()
                .any(|f| f.to_lowercase().contains(needle))
    }

    /// Filtered and sorted records, unpaged.
    pub fn visible(&self) -> Vec<&T> {
        let needle = self.search_term.to_lowercase();
        let mut rows: Vec<&T> = self
            .items
            .iter()
            .filter(|it| Self::matches(it, &needle))
            .collect();
        if let Some((field, dir)) = &self.sort {
            // Stable: equal keys keep repository order.
            rows.sort_by(|a, b| {
                let ord = a.sort_value(field).compare(&b.sort_value(field));
                match dir {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        rows
    }

    pub fn page_count(&self) -> usize {
        let n = self.visible().len();
        n.div_ceil(self.page_size).max(1)
    }

    pub fn view(&self) -> ListView<T> {
        let rows = self.visible();
        let filtered = rows.len();
        let page_count = filtered.div_ceil(self.page_size).max(1);
        let page = self.current_page.clamp(1, page_count);
        let items = rows
            .into_iter()
            .skip((page - 1) * self.page_size)
            .take(self.page_size)
            .cloned()
            .collect();
        ListView {
            items,
            total: self.items.len(),
            filtered,
            current_page: page,
            page_count,
            page_size: self.page_size,
            search_term: self.search_term.clone(),
            sort_field: self.sort.as_ref().map(|(f, _)| f.clone()),
            sort_direction: self.sort.as_ref().map(|(_, d)| *d),
            is_loading: self.is_loading,
            error: self.error.as_ref().map(|e| e.to_string()),
            retryable: self.error.as_ref().map(DeskError::is_retryable).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityKind, SortValue};
    use crate::repository::MemoryRepository;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        name: String,
    }

    impl Entity for Row {
        const KIND: EntityKind = EntityKind::Students;
        const SORT_FIELDS: &'static [&'static str] = &["name"];

        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }

        fn search_fields(&self) -> Vec<&str> {
            vec![self.name.as_str()]
        }

        fn sort_value(&self, field: &str) -> SortValue {
            match field {
                "name" => SortValue::text(&self.name),
                _ => SortValue::Missing,
            }
        }
    }

    fn rows(names: &[&str]) -> Vec<Row> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Row {
                id: format!("r{}", i),
                name: n.to_string(),
            })
            .collect()
    }

    fn loaded(names: &[&str], page_size: usize) -> ListController<Row> {
        let mut c = ListController::new(page_size);
        assert!(c.load(&MemoryRepository::new(rows(names))));
        c
    }

    fn names(view: &ListView<Row>) -> Vec<String> {
        view.items.iter().map(|r| r.name.clone()).collect()
    }

    struct Offline;

    impl Repository<Row> for Offline {
        fn list(&self) -> DeskResult<Vec<Row>> {
            Err(DeskError::unavailable("connection refused"))
        }
        fn get(&self, _id: &str) -> DeskResult<Row> {
            Err(DeskError::unavailable("connection refused"))
        }
        fn create(&mut self, _item: Row) -> DeskResult<Row> {
            Err(DeskError::unavailable("connection refused"))
        }
        fn update(&mut self, _id: &str, _patch: &Value) -> DeskResult<Row> {
            Err(DeskError::unavailable("connection refused"))
        }
        fn delete(&mut self, _id: &str) -> DeskResult<()> {
            Err(DeskError::unavailable("connection refused"))
        }
    }

    #[test]
    fn search_is_case_insensitive_and_resets_page() {
        let mut c = loaded(&["Ann", "Bob", "Cid"], 1);
        c.set_page(3);
        assert_eq!(c.current_page(), 3);
        c.set_search_term("b");
        assert_eq!(c.current_page(), 1);
        let v = c.view();
        assert_eq!(names(&v), vec!["Bob"]);
        assert_eq!(v.filtered, 1);
        assert_eq!(v.total, 3);

        c.set_search_term("  ");
        assert_eq!(c.view().filtered, 3);
    }

    #[test]
    fn sort_cycles_back_to_original_order() {
        let original = ["Cid", "Ann", "Bob"];
        let mut c = loaded(&original, 10);
        assert_eq!(names(&c.view()), original);

        c.toggle_sort("name").expect("asc");
        assert_eq!(names(&c.view()), ["Ann", "Bob", "Cid"]);
        c.toggle_sort("name").expect("desc");
        assert_eq!(names(&c.view()), ["Cid", "Bob", "Ann"]);
        c.toggle_sort("name").expect("off");
        assert_eq!(c.sort(), None);
        assert_eq!(names(&c.view()), original);
    }

    #[test]
    fn sort_resets_page_and_rejects_unknown_fields() {
        let mut c = loaded(&["a", "b", "c", "d"], 2);
        c.set_page(2);
        c.toggle_sort("name").expect("sort");
        assert_eq!(c.current_page(), 1);
        assert!(c.toggle_sort("shoeSize").is_err());
        assert_eq!(c.sort(), Some(("name", SortDirection::Asc)));
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut c = loaded(&["b", "A", "a", "B"], 10);
        c.toggle_sort("name").expect("asc");
        let ids: Vec<String> = c.view().items.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["r1", "r2", "r0", "r3"]);
    }

    #[test]
    fn paging_clamps_into_range() {
        let mut c = loaded(&["a", "b", "c", "d", "e"], 2);
        assert_eq!(c.page_count(), 3);
        c.set_page(0);
        assert_eq!(c.current_page(), 1);
        c.set_page(99);
        assert_eq!(c.current_page(), 3);
        assert_eq!(names(&c.view()), ["e"]);

        let empty = loaded(&[], 2);
        assert_eq!(empty.page_count(), 1);
        assert_eq!(empty.view().current_page, 1);
    }

    #[test]
    fn failed_load_surfaces_retryable_error() {
        let mut c: ListController<Row> = ListController::new(10);
        assert!(!c.load(&Offline));
        let v = c.view();
        assert!(!v.is_loading);
        assert!(v.retryable);
        assert!(v.error.expect("error").contains("connection refused"));

        assert!(c.load(&MemoryRepository::new(rows(&["x"]))));
        assert!(c.view().error.is_none());
    }

    #[test]
    fn superseded_load_is_dropped() {
        let mut c: ListController<Row> = ListController::new(10);
        let stale = c.begin_load();
        c.reset();
        assert!(!c.finish_load(stale, Ok(rows(&["late"]))));
        assert!(c.items().is_empty());
        assert!(!c.is_loading());
    }
}

//! Generic data-table engine: sorting, pagination and id-keyed row selection.
//!
//! The engine owns the dataset handed to it but never reorders it.  Sorting
//! produces a permutation of row indices ([`DataTable::sorted_indices`]) and
//! pagination slices that permutation.  Selection is keyed by the stable
//! [`TableRecord::Id`] of each row, never by position, and is cleared whenever
//! the dataset is replaced.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;

use tracing::debug;

// ───────────────────────────────────────── rows & columns ────

/// A row the table can display.  The id must be stable across renders.
pub trait TableRecord {
    type Id: Clone + Eq + Hash + Ord + std::fmt::Debug;

    fn row_id(&self) -> Self::Id;
}

/// A single cell value produced by a column's cell renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Number(f64),
}

impl CellValue {
    /// Display form used by the table widget.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(n) => n.to_string(),
            CellValue::Unsigned(n) => n.to_string(),
            CellValue::Number(n) => format!("{n:.2}"),
        }
    }

    /// Exact integer value; `i128` holds both `i64` and `u64` cells.
    fn as_integer(&self) -> Option<i128> {
        match self {
            CellValue::Integer(n) => Some(i128::from(*n)),
            CellValue::Unsigned(n) => Some(i128::from(*n)),
            CellValue::Number(_) | CellValue::Text(_) => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Integer(n) => Some(*n as f64),
            CellValue::Unsigned(n) => Some(*n as f64),
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }

    /// Default comparator: numbers numerically, text case-insensitively,
    /// numbers before text when the kinds differ.
    pub fn compare(&self, other: &Self) -> Ordering {
        if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
            return a.cmp(&b);
        }
        match (self, other) {
            (CellValue::Text(a), CellValue::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

/// Column descriptor: identity, header label and cell renderer.
pub struct Column<R> {
    pub id: &'static str,
    pub header: &'static str,
    pub cell: fn(&R) -> CellValue,
    pub sortable: bool,
    /// Preferred display width in terminal columns.
    pub width: u16,
}

impl<R> Column<R> {
    pub fn new(id: &'static str, header: &'static str, cell: fn(&R) -> CellValue) -> Self {
        Self {
            id,
            header,
            cell,
            sortable: true,
            width: 12,
        }
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

// ───────────────────────────────────────── view state ────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Active sort: which column (by index into the column list) and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

/// Rendered table body: either the visible page or a single placeholder row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableBody {
    /// Indices into the dataset, in display order.
    Rows(Vec<usize>),
    /// "No results." spanning every column.
    Placeholder { col_span: usize },
}

/// What happened when the bulk-delete affordance was activated.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome<Id> {
    /// No delete handler is wired up; nothing changed.
    Inert,
    /// Nothing was selected.
    NothingSelected,
    /// Every selected row was deleted.
    Deleted(Vec<Id>),
    /// Some rows were deleted, the rest stay selected.
    Partial { deleted: Vec<Id>, failed: Vec<(Id, String)> },
    /// The handler failed outright; dataset and selection are unchanged.
    Failed(String),
}

/// Failure reported by a [`DeleteHandler`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeleteError<Id: std::fmt::Debug> {
    #[error("{} of {} rows could not be deleted", .failed.len(), .failed.len() + .deleted.len())]
    Partial {
        deleted: Vec<Id>,
        failed: Vec<(Id, String)>,
    },
    #[error("delete failed: {0}")]
    Failed(String),
}

/// External hook invoked by the bulk-delete affordance.
pub trait DeleteHandler<R: TableRecord> {
    fn delete(&mut self, ids: &[R::Id]) -> Result<(), DeleteError<R::Id>>;
}

// ───────────────────────────────────────── engine ────────────

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Table engine bound to a column list and a dataset.
pub struct DataTable<R: TableRecord> {
    columns: Vec<Column<R>>,
    data: Vec<R>,
    sort: Option<SortState>,
    selected: HashSet<R::Id>,
    page_index: usize,
    page_size: usize,
}

impl<R: TableRecord> DataTable<R> {
    pub fn new(columns: Vec<Column<R>>, data: Vec<R>) -> Self {
        Self {
            columns,
            data,
            sort: None,
            selected: HashSet::new(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn data(&self) -> &[R] {
        &self.data
    }

    pub fn row(&self, index: usize) -> Option<&R> {
        self.data.get(index)
    }

    /// Swap the dataset.  Selection is cleared so no stale id can point at
    /// a row that no longer exists (or a different logical row).
    pub fn replace_data(&mut self, data: Vec<R>) {
        self.data = data;
        self.selected.clear();
        self.page_index = 0;
        debug!(rows = self.data.len(), "table dataset replaced");
    }

    // ── sorting ────────────────────────────────────────────────

    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    /// Cycle the sort on `column`: none → ascending → descending → none.
    /// Selecting a different column starts over at ascending.
    pub fn toggle_sort(&mut self, column: usize) {
        if !self.columns.get(column).is_some_and(|c| c.sortable) {
            return;
        }
        self.sort = match self.sort {
            Some(SortState { column: c, direction: SortDirection::Ascending }) if c == column => {
                Some(SortState { column, direction: SortDirection::Descending })
            }
            Some(SortState { column: c, direction: SortDirection::Descending }) if c == column => {
                None
            }
            _ => Some(SortState { column, direction: SortDirection::Ascending }),
        };
        self.page_index = 0;
        debug!(column, sort = ?self.sort, "table sort changed");
    }

    /// Dataset indices in display order (stable; the dataset is untouched).
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.data.len()).collect();
        let Some(sort) = self.sort else {
            return order;
        };
        let Some(column) = self.columns.get(sort.column) else {
            return order;
        };
        let keys: Vec<CellValue> = self.data.iter().map(|r| (column.cell)(r)).collect();
        order.sort_by(|&a, &b| {
            let ord = keys[a].compare(&keys[b]);
            match sort.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        order
    }

    // ── pagination ─────────────────────────────────────────────

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.clamp_page();
    }

    /// Always at least one page, even for an empty dataset.
    pub fn page_count(&self) -> usize {
        self.data.len().div_ceil(self.page_size).max(1)
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.page_index += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    pub fn first_page(&mut self) {
        self.page_index = 0;
    }

    pub fn last_page(&mut self) {
        self.page_index = self.page_count() - 1;
    }

    fn clamp_page(&mut self) {
        self.page_index = self.page_index.min(self.page_count() - 1);
    }

    /// Dataset indices on the current page, in display order.
    pub fn page_indices(&self) -> Vec<usize> {
        self.sorted_indices()
            .into_iter()
            .skip(self.page_index * self.page_size)
            .take(self.page_size)
            .collect()
    }

    pub fn body(&self) -> TableBody {
        if self.data.is_empty() {
            TableBody::Placeholder {
                col_span: self.columns.len(),
            }
        } else {
            TableBody::Rows(self.page_indices())
        }
    }

    // ── selection ──────────────────────────────────────────────

    pub fn is_selected(&self, id: &R::Id) -> bool {
        self.selected.contains(id)
    }

    pub fn selection_len(&self) -> usize {
        self.selected.len()
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Selected ids, sorted for deterministic ordering.
    pub fn selected_ids(&self) -> Vec<R::Id> {
        let mut ids: Vec<_> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Toggle a row's membership.  Ids not present in the dataset are ignored.
    pub fn toggle_row(&mut self, id: &R::Id) {
        if self.selected.remove(id) {
            debug!(?id, "row deselected");
            return;
        }
        if self.data.iter().any(|r| &r.row_id() == id) {
            self.selected.insert(id.clone());
            debug!(?id, "row selected");
        }
    }

    /// Select every row on the current page, or clear them when they are
    /// all already selected.
    pub fn toggle_page(&mut self) {
        let ids: Vec<R::Id> = self
            .page_indices()
            .into_iter()
            .map(|i| self.data[i].row_id())
            .collect();
        if ids.is_empty() {
            return;
        }
        if ids.iter().all(|id| self.selected.contains(id)) {
            for id in &ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(ids);
        }
    }

    /// `Some(true)` all, `Some(false)` none, `None` some of the page selected.
    pub fn page_selection(&self) -> Option<bool> {
        let page = self.page_indices();
        let count = page
            .iter()
            .filter(|&&i| self.selected.contains(&self.data[i].row_id()))
            .count();
        if count == 0 {
            Some(false)
        } else if count == page.len() {
            Some(true)
        } else {
            None
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    // ── bulk delete ────────────────────────────────────────────

    /// Run the bulk-delete hook over the current selection.
    ///
    /// Only rows the handler actually deleted leave the dataset and the
    /// selection; anything it failed on stays selected.
    pub fn delete_selected(
        &mut self,
        handler: Option<&mut dyn DeleteHandler<R>>,
    ) -> DeleteOutcome<R::Id> {
        let Some(handler) = handler else {
            return DeleteOutcome::Inert;
        };
        let ids = self.selected_ids();
        if ids.is_empty() {
            return DeleteOutcome::NothingSelected;
        }

        match handler.delete(&ids) {
            Ok(()) => {
                self.remove_rows(&ids);
                DeleteOutcome::Deleted(ids)
            }
            Err(DeleteError::Partial { deleted, failed }) => {
                self.remove_rows(&deleted);
                DeleteOutcome::Partial { deleted, failed }
            }
            Err(DeleteError::Failed(msg)) => DeleteOutcome::Failed(msg),
        }
    }

    fn remove_rows(&mut self, ids: &[R::Id]) {
        let doomed: HashSet<&R::Id> = ids.iter().collect();
        self.data.retain(|r| !doomed.contains(&r.row_id()));
        for id in ids {
            self.selected.remove(id);
        }
        // Anything the handler deleted without reporting must not linger.
        let present: HashSet<R::Id> = self.data.iter().map(|r| r.row_id()).collect();
        self.selected.retain(|id| present.contains(id));
        self.clamp_page();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        name: &'static str,
        price: f64,
    }

    impl TableRecord for Row {
        type Id = u32;
        fn row_id(&self) -> u32 {
            self.id
        }
    }

    fn columns() -> Vec<Column<Row>> {
        vec![
            Column::new("name", "Name", |r: &Row| CellValue::Text(r.name.to_string())),
            Column::new("price", "Price", |r: &Row| CellValue::Number(r.price)),
        ]
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, name: "beta", price: 20.0 },
            Row { id: 2, name: "Alpha", price: 5.0 },
            Row { id: 3, name: "gamma", price: 12.5 },
            Row { id: 4, name: "alpha", price: 5.0 },
        ]
    }

    fn ids_in_order(table: &DataTable<Row>) -> Vec<u32> {
        table
            .sorted_indices()
            .into_iter()
            .map(|i| table.data()[i].id)
            .collect()
    }

    #[test]
    fn sort_cycles_ascending_descending_none() {
        let mut t = DataTable::new(columns(), rows());
        assert_eq!(ids_in_order(&t), vec![1, 2, 3, 4]);

        t.toggle_sort(1);
        assert_eq!(t.sort().map(|s| s.direction), Some(SortDirection::Ascending));
        // Stable: ties (ids 2 and 4) keep dataset order.
        assert_eq!(ids_in_order(&t), vec![2, 4, 3, 1]);

        t.toggle_sort(1);
        assert_eq!(ids_in_order(&t), vec![1, 3, 2, 4]);

        t.toggle_sort(1);
        assert_eq!(t.sort(), None);
        assert_eq!(ids_in_order(&t), vec![1, 2, 3, 4]);
    }

    #[test]
    fn sorting_never_mutates_the_dataset() {
        let mut t = DataTable::new(columns(), rows());
        for column in [0, 1, 1, 0, 0, 0, 1] {
            t.toggle_sort(column);
        }
        assert_eq!(t.data(), rows().as_slice());
    }

    #[test]
    fn text_sort_is_case_insensitive() {
        let mut t = DataTable::new(columns(), rows());
        t.toggle_sort(0);
        assert_eq!(ids_in_order(&t), vec![2, 4, 1, 3]);
    }

    #[test]
    fn switching_column_restarts_at_ascending_and_resets_page() {
        let mut t = DataTable::new(columns(), rows());
        t.set_page_size(2);
        t.next_page();
        t.toggle_sort(0);
        t.toggle_sort(0);
        t.toggle_sort(1);
        assert_eq!(
            t.sort(),
            Some(SortState { column: 1, direction: SortDirection::Ascending })
        );
        assert_eq!(t.page_index(), 0);
    }

    #[test]
    fn unsortable_and_unknown_columns_are_ignored() {
        let mut cols = columns();
        cols[0] = Column::new("name", "Name", |r: &Row| CellValue::Text(r.name.into())).unsortable();
        let mut t = DataTable::new(cols, rows());
        t.toggle_sort(0);
        t.toggle_sort(9);
        assert_eq!(t.sort(), None);
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        let mut t = DataTable::new(columns(), rows());
        t.toggle_row(&3);
        t.toggle_row(&1);
        t.toggle_row(&3);
        assert_eq!(t.selected_ids(), vec![1]);
        t.toggle_row(&1);
        assert!(!t.has_selection());
    }

    #[test]
    fn unknown_ids_never_enter_the_selection() {
        let mut t = DataTable::new(columns(), rows());
        t.toggle_row(&42);
        assert!(!t.has_selection());
    }

    #[test]
    fn empty_dataset_renders_placeholder_spanning_all_columns() {
        for n in [0usize, 1, 5] {
            let cols: Vec<Column<Row>> = (0..n)
                .map(|_| Column::new("c", "C", |r: &Row| CellValue::Number(r.price)))
                .collect();
            let t = DataTable::new(cols, Vec::new());
            assert_eq!(t.body(), TableBody::Placeholder { col_span: n });
        }
    }

    #[test]
    fn pagination_slices_sorted_order() {
        let mut t = DataTable::new(columns(), rows());
        t.set_page_size(3);
        assert_eq!(t.page_count(), 2);
        assert!(!t.can_previous_page());
        t.toggle_sort(1);
        t.next_page();
        assert_eq!(t.body(), TableBody::Rows(vec![0]));
        assert!(!t.can_next_page());
        t.next_page();
        assert_eq!(t.page_index(), 1);
        t.first_page();
        assert_eq!(t.page_indices(), vec![1, 3, 2]);
    }

    #[test]
    fn empty_table_has_one_page() {
        let t = DataTable::new(columns(), Vec::new());
        assert_eq!(t.page_count(), 1);
        assert!(!t.can_next_page());
    }

    #[test]
    fn toggle_page_selects_then_clears_the_visible_rows() {
        let mut t = DataTable::new(columns(), rows());
        t.set_page_size(2);
        assert_eq!(t.page_selection(), Some(false));
        t.toggle_row(&1);
        assert_eq!(t.page_selection(), None);
        t.toggle_page();
        assert_eq!(t.selected_ids(), vec![1, 2]);
        assert_eq!(t.page_selection(), Some(true));
        t.toggle_page();
        assert!(!t.has_selection());
    }

    #[test]
    fn replacing_data_clears_stale_selection() {
        let mut t = DataTable::new(columns(), rows());
        t.toggle_row(&2);
        t.next_page();
        t.replace_data(vec![Row { id: 2, name: "other", price: 1.0 }]);
        assert!(!t.has_selection());
        assert_eq!(t.page_index(), 0);
    }

    struct Recorder {
        fail: Vec<u32>,
        calls: Vec<Vec<u32>>,
        outright: bool,
    }

    impl DeleteHandler<Row> for Recorder {
        fn delete(&mut self, ids: &[u32]) -> Result<(), DeleteError<u32>> {
            self.calls.push(ids.to_vec());
            if self.outright {
                return Err(DeleteError::Failed("backend offline".into()));
            }
            if self.fail.is_empty() {
                return Ok(());
            }
            let (failed, deleted): (Vec<u32>, Vec<u32>) =
                ids.iter().copied().partition(|id| self.fail.contains(id));
            Err(DeleteError::Partial {
                deleted,
                failed: failed.into_iter().map(|id| (id, "locked".to_string())).collect(),
            })
        }
    }

    #[test]
    fn delete_without_handler_is_inert() {
        let mut t = DataTable::new(columns(), rows());
        t.toggle_row(&1);
        assert_eq!(t.delete_selected(None), DeleteOutcome::Inert);
        assert_eq!(t.data().len(), 4);
        assert_eq!(t.selected_ids(), vec![1]);
    }

    #[test]
    fn delete_removes_rows_and_selection() {
        let mut t = DataTable::new(columns(), rows());
        let mut h = Recorder { fail: vec![], calls: vec![], outright: false };
        assert_eq!(t.delete_selected(Some(&mut h)), DeleteOutcome::NothingSelected);
        assert!(h.calls.is_empty());

        t.toggle_row(&3);
        t.toggle_row(&1);
        assert_eq!(t.delete_selected(Some(&mut h)), DeleteOutcome::Deleted(vec![1, 3]));
        assert_eq!(h.calls, vec![vec![1, 3]]);
        let remaining: Vec<u32> = t.data().iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec![2, 4]);
        assert!(!t.has_selection());
    }

    #[test]
    fn partial_delete_keeps_failed_rows_selected() {
        let mut t = DataTable::new(columns(), rows());
        let mut h = Recorder { fail: vec![2], calls: vec![], outright: false };
        t.toggle_row(&1);
        t.toggle_row(&2);
        let outcome = t.delete_selected(Some(&mut h));
        assert_eq!(
            outcome,
            DeleteOutcome::Partial {
                deleted: vec![1],
                failed: vec![(2, "locked".to_string())],
            }
        );
        assert_eq!(t.selected_ids(), vec![2]);
        assert!(t.data().iter().all(|r| r.id != 1));
    }

    #[test]
    fn failed_delete_changes_nothing() {
        let mut t = DataTable::new(columns(), rows());
        let mut h = Recorder { fail: vec![], calls: vec![], outright: true };
        t.toggle_row(&4);
        assert_eq!(
            t.delete_selected(Some(&mut h)),
            DeleteOutcome::Failed("backend offline".into())
        );
        assert_eq!(t.data().len(), 4);
        assert_eq!(t.selected_ids(), vec![4]);
    }

    #[test]
    fn delete_clamps_page_index() {
        let mut t = DataTable::new(columns(), rows());
        let mut h = Recorder { fail: vec![], calls: vec![], outright: false };
        t.set_page_size(2);
        t.last_page();
        t.toggle_page();
        t.delete_selected(Some(&mut h));
        assert_eq!(t.page_count(), 1);
        assert_eq!(t.page_index(), 0);
    }

    #[test]
    fn integers_and_numbers_compare_numerically() {
        assert_eq!(CellValue::Integer(2).compare(&CellValue::Number(10.5)), Ordering::Less);
        assert_eq!(CellValue::Integer(12).compare(&CellValue::Integer(9)), Ordering::Greater);
        assert_eq!(CellValue::Integer(1).compare(&CellValue::Text("a".into())), Ordering::Less);
        assert_eq!(CellValue::Integer(7).display(), "7");
        assert_eq!(
            CellValue::Unsigned(u64::MAX).compare(&CellValue::Integer(-1)),
            Ordering::Greater
        );
        assert_eq!(CellValue::Unsigned(3).compare(&CellValue::Integer(3)), Ordering::Equal);
    }
}

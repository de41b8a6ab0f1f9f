use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::mem::discriminant;

use crate::cinder::Cinder;
use crate::collection::listener::{listen, ListenerRegistration};
use crate::collection::{Document, DocumentSnapshot, QuerySnapshot};
use crate::common::{ResourcePath, SortOrder, Value, COLLECTION_PATH_INDEX, DOC_ID};
use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::filter::{FieldFilter, FieldPredicate, WhereOperator};
use crate::store::TransactionMode;

/// One query clause.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryConstraint {
    Where(FieldFilter),
    OrderBy { field: String, direction: SortOrder },
    Limit(usize),
    StartAt(Value),
    StartAfter(Value),
    EndAt(Value),
    EndBefore(Value),
}

impl Display for QueryConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryConstraint::Where(filter) => write!(f, "where{}", filter),
            QueryConstraint::OrderBy { field, direction } => write!(f, "orderBy({} {})", field, direction),
            QueryConstraint::Limit(n) => write!(f, "limit({})", n),
            QueryConstraint::StartAt(v) => write!(f, "startAt({})", v),
            QueryConstraint::StartAfter(v) => write!(f, "startAfter({})", v),
            QueryConstraint::EndAt(v) => write!(f, "endAt({})", v),
            QueryConstraint::EndBefore(v) => write!(f, "endBefore({})", v),
        }
    }
}

/// An immutable query over the documents of one collection path.
///
/// Builder methods return a new `Query` and leave the receiver untouched.
/// Any number of `where` clauses may be combined (conjunction); `order_by`,
/// `limit` and each cursor kind may appear at most once.
///
/// Execution scans the `collectionPath` index, then applies the clauses in
/// a fixed order: filters, ordering, cursors, limit.
#[derive(Clone)]
pub struct Query {
    db: Cinder,
    path: ResourcePath,
    constraints: Vec<QueryConstraint>,
}

impl Query {
    pub(crate) fn new(db: Cinder, path: ResourcePath) -> Self {
        Query {
            db,
            path,
            constraints: Vec::new(),
        }
    }

    /// Collection path the query runs against.
    pub fn path(&self) -> String {
        self.path.as_string()
    }

    pub(crate) fn resource_path(&self) -> &ResourcePath {
        &self.path
    }

    pub(crate) fn db(&self) -> &Cinder {
        &self.db
    }

    pub fn constraints(&self) -> &[QueryConstraint] {
        &self.constraints
    }

    pub fn where_field<T: Into<Value>>(&self, field: &str, operator: WhereOperator, value: T) -> CinderResult<Query> {
        let filter = FieldFilter::new(field, operator, value.into())?;
        self.with_constraint(QueryConstraint::Where(filter))
    }

    /// Adds a filter built with [field](crate::filter::field).
    pub fn where_filter(&self, filter: FieldPredicate) -> CinderResult<Query> {
        self.with_constraint(QueryConstraint::Where(filter.build()?))
    }

    pub fn order_by(&self, field: &str, direction: SortOrder) -> CinderResult<Query> {
        if field.is_empty() {
            log::error!("Order by field name cannot be empty");
            return Err(CinderError::new(
                "Order by field name cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        self.with_constraint(QueryConstraint::OrderBy {
            field: field.to_string(),
            direction,
        })
    }

    pub fn limit(&self, limit: usize) -> CinderResult<Query> {
        self.with_constraint(QueryConstraint::Limit(limit))
    }

    /// Starts at the first document whose ordering key is at or after `value`.
    pub fn start_at<T: Into<Value>>(&self, value: T) -> CinderResult<Query> {
        self.with_constraint(QueryConstraint::StartAt(value.into()))
    }

    /// Starts strictly after `value`.
    pub fn start_after<T: Into<Value>>(&self, value: T) -> CinderResult<Query> {
        self.with_constraint(QueryConstraint::StartAfter(value.into()))
    }

    /// Ends at the last document whose ordering key is at or before `value`.
    pub fn end_at<T: Into<Value>>(&self, value: T) -> CinderResult<Query> {
        self.with_constraint(QueryConstraint::EndAt(value.into()))
    }

    /// Ends strictly before `value`.
    pub fn end_before<T: Into<Value>>(&self, value: T) -> CinderResult<Query> {
        self.with_constraint(QueryConstraint::EndBefore(value.into()))
    }

    /// Returns a copy of this query with `constraint` appended.
    pub fn with_constraint(&self, constraint: QueryConstraint) -> CinderResult<Query> {
        if !matches!(constraint, QueryConstraint::Where(_))
            && self
                .constraints
                .iter()
                .any(|c| discriminant(c) == discriminant(&constraint))
        {
            log::error!("Query on {} already has a constraint like {}", self.path, constraint);
            return Err(CinderError::new(
                &format!("Query on {} already has a constraint like {}", self.path, constraint),
                ErrorKind::InvalidOperation,
            ));
        }

        let mut constraints = self.constraints.clone();
        constraints.push(constraint);
        Ok(Query {
            db: self.db.clone(),
            path: self.path.clone(),
            constraints,
        })
    }

    /// Runs the query against the current store state.
    pub fn get(&self) -> CinderResult<QuerySnapshot> {
        let tx = self.db.store().begin(TransactionMode::ReadOnly)?;
        let records = tx.get_all_by_index(COLLECTION_PATH_INDEX, &Value::from(self.path.as_string()))?;
        tx.commit()?;
        Ok(self.evaluate(records))
    }

    /// Polls the query every configured interval and calls `callback` with
    /// the result whenever it differs from the previous poll. The first
    /// successful poll always calls back.
    ///
    /// Polling stops when the returned registration is unsubscribed or
    /// dropped, or after the first failed poll.
    pub fn on_snapshot<F>(&self, callback: F) -> CinderResult<ListenerRegistration>
    where
        F: FnMut(&QuerySnapshot) + Send + 'static,
    {
        listen(self.clone(), self.db.config().poll_interval(), callback)
    }

    pub(crate) fn evaluate(&self, records: Vec<Document>) -> QuerySnapshot {
        let mut filters = Vec::new();
        let mut ordering: Option<(&str, SortOrder)> = None;
        let mut limit = None;
        let mut cursors = Vec::new();

        for constraint in &self.constraints {
            match constraint {
                QueryConstraint::Where(filter) => filters.push(filter),
                QueryConstraint::OrderBy { field, direction } => ordering = Some((field.as_str(), *direction)),
                QueryConstraint::Limit(n) => limit = Some(*n),
                cursor => cursors.push(cursor),
            }
        }

        let mut results: Vec<Document> = records
            .into_iter()
            .filter(|record| filters.iter().all(|filter| filter.apply(record)))
            .collect();

        let (key_field, direction) = match ordering {
            Some((field, direction)) => (field, direction),
            None => (DOC_ID, SortOrder::Ascending),
        };

        // stable, undefined keys first
        if ordering.is_some() || !cursors.is_empty() {
            results.sort_by(|a, b| direction.apply(a.get_path(key_field).cmp(&b.get_path(key_field))));
        }

        for cursor in cursors {
            results.retain(|record| {
                let position = |bound: &Value| direction.apply(record.get_path(key_field).cmp(&Some(bound)));
                match cursor {
                    QueryConstraint::StartAt(bound) => position(bound) != Ordering::Less,
                    QueryConstraint::StartAfter(bound) => position(bound) == Ordering::Greater,
                    QueryConstraint::EndAt(bound) => position(bound) != Ordering::Greater,
                    QueryConstraint::EndBefore(bound) => position(bound) == Ordering::Less,
                    _ => true,
                }
            });
        }

        if let Some(limit) = limit {
            results.truncate(limit);
        }

        QuerySnapshot::new(results.into_iter().map(DocumentSnapshot::from_record).collect())
    }
}

impl Debug for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("path", &self.path.as_string())
            .field("constraints", &self.constraints)
            .finish()
    }
}

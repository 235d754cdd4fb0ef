use serde_json::{Map, Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collection endpoints served by the mock, relative to `/api`.
pub const RESOURCES: &[&str] = &[
    "/teacher-list",
    "/student",
    "/faculty",
    "/department",
    "/certificate",
    "/donation/categories",
    "/donation",
    "/salary-type",
    "/job-post",
    "/page",
];

pub type Row = Map<String, Value>;

/// Textual form of a row's id, as it appears in URLs.
pub fn row_id(row: &Row) -> Option<String> {
    match row.get("id")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// One resource's rows in insertion order.
#[derive(Debug, Default)]
pub struct Collection {
    pub rows: Vec<Row>,
    next_id: i64,
}

impl Collection {
    /// Store a new row under the next integer id.
    pub fn insert(&mut self, mut row: Row) -> Row {
        self.next_id += 1;
        row.insert("id".to_string(), json!(self.next_id));
        self.rows.push(row.clone());
        row
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row_id(row).as_deref() == Some(id))
    }

    /// Whether another row already holds `value` in `field` (case-insensitive).
    pub fn value_taken(&self, field: &str, value: &str, except_id: Option<&str>) -> bool {
        self.rows.iter().any(|row| {
            row_id(row).as_deref() != except_id
                && row
                    .get(field)
                    .and_then(Value::as_str)
                    .is_some_and(|existing| existing.eq_ignore_ascii_case(value))
        })
    }
}

/// Failure returned for the next request instead of running the handler.
#[derive(Debug, Clone)]
pub struct InjectedFailure {
    pub status: u16,
    pub message: Option<String>,
}

pub struct AppStateInner {
    pub collections: HashMap<String, Collection>,
    pub failures: VecDeque<InjectedFailure>,
}

#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// State pre-filled with sample school data.
    pub fn new() -> Self {
        let mut inner = Self::empty_inner();
        Self::init_mock_data(&mut inner);
        Self::from_inner(inner)
    }

    /// State with every resource present but no rows.
    pub fn empty() -> Self {
        Self::from_inner(Self::empty_inner())
    }

    fn empty_inner() -> AppStateInner {
        AppStateInner {
            collections: RESOURCES
                .iter()
                .map(|path| (path.to_string(), Collection::default()))
                .collect(),
            failures: VecDeque::new(),
        }
    }

    fn from_inner(inner: AppStateInner) -> Self {
        AppState {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Make the next request fail with `status`.
    pub async fn fail_next(&self, status: u16, message: Option<&str>) {
        self.inner.write().await.failures.push_back(InjectedFailure {
            status,
            message: message.map(str::to_string),
        });
    }

    /// Current rows of a resource, for assertions.
    pub async fn rows(&self, resource: &str) -> Vec<Row> {
        self.inner
            .read()
            .await
            .collections
            .get(resource)
            .map(|c| c.rows.clone())
            .unwrap_or_default()
    }

    fn seed(inner: &mut AppStateInner, resource: &str, rows: Vec<Value>) {
        let collection = inner.collections.entry(resource.to_string()).or_default();
        for row in rows {
            if let Value::Object(row) = row {
                collection.insert(row);
            }
        }
    }

    fn init_mock_data(inner: &mut AppStateInner) {
        Self::seed(
            inner,
            "/faculty",
            vec![
                json!({"name": "Science", "code": "SCI", "active": true}),
                json!({"name": "Humanities", "code": "HUM", "active": true}),
                json!({"name": "Commerce", "code": "COM", "active": false}),
            ],
        );

        Self::seed(
            inner,
            "/department",
            vec![
                json!({"name": "Physics", "faculty_id": 1, "active": true}),
                json!({"name": "Chemistry", "faculty_id": 1, "active": true}),
                json!({"name": "History", "faculty_id": 2, "active": true}),
            ],
        );

        Self::seed(
            inner,
            "/teacher-list",
            vec![
                json!({
                    "name": "Farhana Akter",
                    "email": "farhana@school.test",
                    "designation": "Senior Lecturer",
                    "department_id": 1,
                    "active": true
                }),
                json!({
                    "name": "Rahim Uddin",
                    "email": "rahim@school.test",
                    "designation": "Lecturer",
                    "department_id": 3,
                    "active": false
                }),
            ],
        );

        Self::seed(
            inner,
            "/student",
            vec![
                json!({"name": "Amina Khatun", "roll_no": "1001", "class": "10", "batch": "2024", "section": "A", "active": true}),
                json!({"name": "Tanvir Hasan", "roll_no": "1002", "class": "10", "batch": "2024", "section": "B", "active": true}),
                json!({"name": "Nusrat Jahan", "roll_no": "1101", "class": "11", "batch": "2023", "section": "A", "active": true}),
            ],
        );

        Self::seed(
            inner,
            "/certificate",
            vec![
                json!({"title": "Testimonial", "student_id": 1, "template": "testimonial", "issued_on": "2024-01-15", "status": "published"}),
                json!({"title": "Transfer Certificate", "student_id": 2, "template": "transfer", "status": "draft"}),
            ],
        );

        Self::seed(
            inner,
            "/donation/categories",
            vec![
                json!({"name": "Scholarship Fund", "description": "Tuition support", "active": true}),
                json!({"name": "Library", "description": "Books and journals", "active": true}),
            ],
        );

        Self::seed(
            inner,
            "/donation",
            vec![
                json!({"donor_name": "Alumni Association", "category_id": 1, "amount": 50000.0, "donated_on": "2024-02-01", "status": "received"}),
            ],
        );

        Self::seed(
            inner,
            "/salary-type",
            vec![
                json!({"name": "Basic", "amount": 25000.0, "active": true}),
                json!({"name": "House Rent", "amount": 10000.0, "active": true}),
            ],
        );

        Self::seed(
            inner,
            "/job-post",
            vec![
                json!({"title": "Mathematics Teacher", "vacancies": 2, "deadline": "2024-03-31", "status": "published"}),
            ],
        );

        Self::seed(
            inner,
            "/page",
            vec![
                json!({"title": "About Us", "slug": "about", "content": "<p>Founded in 1965.</p>", "status": "published"}),
                json!({"title": "Admissions", "slug": "admissions", "content": "", "status": "draft"}),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut collection = Collection::default();
        let a = collection.insert(Map::new());
        let b = collection.insert(Map::new());
        assert_eq!(a["id"], json!(1));
        assert_eq!(b["id"], json!(2));
        assert_eq!(collection.position("2"), Some(1));
    }

    #[test]
    fn test_value_taken_ignores_case_and_self() {
        let mut collection = Collection::default();
        let mut row = Map::new();
        row.insert("name".into(), json!("Physics"));
        collection.insert(row);

        assert!(collection.value_taken("name", "physics", None));
        assert!(!collection.value_taken("name", "physics", Some("1")));
        assert!(!collection.value_taken("name", "Chemistry", None));
    }

    #[tokio::test]
    async fn test_seed_covers_every_resource() {
        let state = AppState::new();
        for resource in RESOURCES {
            assert!(
                !state.rows(resource).await.is_empty(),
                "{} has no seed rows",
                resource
            );
        }
    }
}

use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::api::health::{HealthCheck, HealthReport};
use crate::api::{ApiError, Collection, PatchProducts};
use crate::form::{FormMode, SubmitIntent};
use crate::loader::{LoadOutcome, LoadState, ProductLoader, RetryPolicy};
use crate::manager::{FlowError, ProductManager, UserManager};
use crate::model::{Product, ProductDraft, ProductPatch, Record, User};
use crate::output::{Severity, Surface};
use crate::session::{Session, View};

#[derive(Clone, Debug, PartialEq)]
enum Call {
    List,
    Get(i64),
    Create(String),
    Replace(i64, String),
    Patch(i64),
    Delete(i64),
}

struct Store<R: Record> {
    records: Vec<R>,
    next_id: i64,
    failing_lists: u32,
    failing_list_calls: Vec<usize>,
    creates_before_failure: Option<usize>,
    fail_writes: bool,
    create_failure_is_transport: bool,
    calls: Vec<Call>,
    list_times: Vec<Instant>,
    replaced: Vec<R::Draft>,
}

/// Backend stand-in: keeps records in memory, counts calls and fails on
/// demand.
struct MemoryCollection<R: Record> {
    store: Mutex<Store<R>>,
}

impl<R: Record> MemoryCollection<R> {
    fn new(records: Vec<R>) -> Self {
        let next_id = records.iter().map(Record::id).max().unwrap_or(0) + 1;
        Self {
            store: Mutex::new(Store {
                records,
                next_id,
                failing_lists: 0,
                failing_list_calls: Vec::new(),
                creates_before_failure: None,
                fail_writes: false,
                create_failure_is_transport: false,
                calls: Vec::new(),
                list_times: Vec::new(),
                replaced: Vec::new(),
            }),
        }
    }

    fn fail_next_lists(&self, count: u32) {
        self.store.lock().unwrap().failing_lists = count;
    }

    /// Fails the `n`th list call (1-based) regardless of earlier ones.
    fn fail_list_call(&self, n: usize) {
        self.store.lock().unwrap().failing_list_calls.push(n);
    }

    fn fail_creates_after(&self, count: usize) {
        self.store.lock().unwrap().creates_before_failure = Some(count);
    }

    fn drop_connection_on_creates_after(&self, count: usize) {
        let mut store = self.store.lock().unwrap();
        store.creates_before_failure = Some(count);
        store.create_failure_is_transport = true;
    }

    fn fail_writes(&self) {
        self.store.lock().unwrap().fail_writes = true;
    }

    fn calls(&self) -> Vec<Call> {
        self.store.lock().unwrap().calls.clone()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn list_times(&self) -> Vec<Instant> {
        self.store.lock().unwrap().list_times.clone()
    }

    fn records(&self) -> Vec<R> {
        self.store.lock().unwrap().records.clone()
    }

    fn replaced(&self) -> Vec<R::Draft> {
        self.store.lock().unwrap().replaced.clone()
    }
}

fn unreachable_backend() -> ApiError {
    ApiError::transport("http://localhost:8080", "connection refused")
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        reason: "Internal Server Error".to_string(),
        body: Some("constraint violated".to_string()),
    }
}

impl<R: Record> Collection<R> for MemoryCollection<R> {
    async fn list(&self) -> Result<Vec<R>, ApiError> {
        let mut store = self.store.lock().unwrap();
        store.calls.push(Call::List);
        store.list_times.push(Instant::now());
        let call = store.list_times.len();
        if store.failing_list_calls.contains(&call) {
            return Err(unreachable_backend());
        }
        if store.failing_lists > 0 {
            store.failing_lists -= 1;
            return Err(unreachable_backend());
        }
        Ok(store.records.clone())
    }

    async fn get(&self, id: i64) -> Result<R, ApiError> {
        let mut store = self.store.lock().unwrap();
        store.calls.push(Call::Get(id));
        store
            .records
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| ApiError::status_only(404, "Not Found"))
    }

    async fn create(&self, draft: &R::Draft) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        store.calls.push(Call::Create(format!("{draft:?}")));
        if store.creates_before_failure == Some(0) && store.create_failure_is_transport {
            return Err(unreachable_backend());
        }
        if store.fail_writes || store.creates_before_failure == Some(0) {
            return Err(server_error());
        }
        if let Some(left) = store.creates_before_failure.as_mut() {
            *left -= 1;
        }
        let id = store.next_id;
        store.next_id += 1;
        store.records.push(R::from_draft(id, draft));
        Ok(())
    }

    async fn replace(&self, id: i64, draft: &R::Draft) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        store.calls.push(Call::Replace(id, format!("{draft:?}")));
        if store.fail_writes {
            return Err(server_error());
        }
        store.replaced.push(draft.clone());
        match store.records.iter_mut().find(|r| r.id() == id) {
            Some(record) => {
                *record = R::from_draft(id, draft);
                Ok(())
            }
            None => Err(ApiError::status_only(404, "Not Found")),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        store.calls.push(Call::Delete(id));
        if store.fail_writes {
            return Err(server_error());
        }
        let before = store.records.len();
        store.records.retain(|r| r.id() != id);
        if store.records.len() == before {
            return Err(ApiError::status_only(404, "Not Found"));
        }
        Ok(())
    }
}

impl PatchProducts for MemoryCollection<Product> {
    async fn patch(&self, id: i64, patch: &ProductPatch) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        store.calls.push(Call::Patch(id));
        if store.fail_writes {
            return Err(server_error());
        }
        match store.records.iter_mut().find(|p| p.id == id) {
            Some(product) => {
                patch.apply_to(product);
                Ok(())
            }
            None => Err(ApiError::status_only(404, "Not Found")),
        }
    }
}

#[derive(Default)]
struct RecordingSurface {
    notices: Vec<(Severity, String)>,
    product_tables: Vec<Vec<Product>>,
    user_tables: Vec<Vec<User>>,
    lines: Vec<String>,
}

impl RecordingSurface {
    fn has_notice(&self, severity: Severity, needle: &str) -> bool {
        self.notices
            .iter()
            .any(|(s, m)| *s == severity && m.contains(needle))
    }

    fn has_line(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl Surface for RecordingSurface {
    fn notice(&mut self, severity: Severity, message: &str) {
        self.notices.push((severity, message.to_string()));
    }

    fn products(&mut self, products: &[Product]) {
        self.product_tables.push(products.to_vec());
    }

    fn users(&mut self, users: &[User]) {
        self.user_tables.push(users.to_vec());
    }

    fn status_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

fn product(id: i64, name: &str, price: &str, quantity: u32) -> Product {
    Product {
        id,
        name: name.to_string(),
        description: Some(format!("{name} description")),
        price: Decimal::from_str(price).unwrap(),
        quantity,
        created_at: None,
    }
}

fn catalog() -> Vec<Product> {
    vec![
        product(1, "Laptop HP", "12999.99", 50),
        product(2, "Monitor LG", "3499.99", 100),
        product(3, "Mouse Inalámbrico", "499.99", 75),
    ]
}

fn user(id: i64, name: &str, email: &str) -> User {
    User {
        id,
        name: name.to_string(),
        email: email.to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn failing_backend_gets_three_attempts_with_growing_delays() {
    let products = MemoryCollection::<Product>::new(catalog());
    products.fail_next_lists(u32::MAX);
    let mut loader = ProductLoader::new(RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    let outcome = loader.load(&products, &mut surface).await;

    assert!(outcome.is_failed());
    assert_eq!(loader.attempts(), 3);
    assert_eq!(loader.state(), LoadState::Failed);
    let times = products.list_times();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_millis(1000));
    assert_eq!(times[2] - times[1], Duration::from_millis(2000));
    assert!(surface.has_notice(Severity::Warning, "Retrying in 1 seconds"));
    assert!(surface.has_notice(Severity::Warning, "Retrying in 2 seconds"));
    assert!(surface.has_notice(Severity::Danger, "check the database connection"));
    assert!(surface.has_line("Database connection error"));
}

#[tokio::test(start_paused = true)]
async fn recovers_on_a_later_attempt() {
    let products = MemoryCollection::<Product>::new(catalog());
    products.fail_next_lists(1);
    let mut loader = ProductLoader::new(RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    let outcome = loader.load(&products, &mut surface).await;

    assert_eq!(outcome.products().len(), 3);
    assert_eq!(loader.attempts(), 2);
    assert_eq!(loader.state(), LoadState::Loaded(3));
    assert_eq!(surface.product_tables.len(), 1);
    assert!(products.count(|c| matches!(c, Call::Create(_))) == 0);
}

#[tokio::test(start_paused = true)]
async fn empty_first_load_seeds_three_products_then_reloads() {
    let products = MemoryCollection::<Product>::new(Vec::new());
    let mut loader = ProductLoader::new(RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    let outcome = loader.load(&products, &mut surface).await;

    let calls = products.calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0], Call::List);
    assert!(calls[1..4].iter().all(|c| matches!(c, Call::Create(_))));
    assert_eq!(calls[4], Call::List);

    let names: Vec<_> = outcome.products().iter().map(|p| p.name.clone()).collect();
    assert_eq!(names, ["Laptop HP", "Monitor LG", "Mouse Inalámbrico"]);

    let times = products.list_times();
    assert_eq!(times[1] - times[0], Duration::from_millis(1000));
    // the reload continues the count instead of starting over
    assert_eq!(loader.attempts(), 2);
    assert!(surface.has_notice(Severity::Info, "Creating sample data"));
    assert!(surface.has_notice(Severity::Success, "Sample data created successfully"));
}

#[tokio::test(start_paused = true)]
async fn empty_list_after_a_failure_is_not_seeded() {
    let products = MemoryCollection::<Product>::new(Vec::new());
    products.fail_next_lists(1);
    let mut loader = ProductLoader::new(RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    let outcome = loader.load(&products, &mut surface).await;

    assert!(matches!(outcome, LoadOutcome::Empty));
    assert_eq!(products.count(|c| matches!(c, Call::Create(_))), 0);
    assert_eq!(loader.state(), LoadState::Loaded(0));
    assert!(surface.has_line("No products available"));
}

#[tokio::test(start_paused = true)]
async fn rejected_sample_does_not_stop_seeding() {
    let products = MemoryCollection::<Product>::new(Vec::new());
    products.fail_creates_after(1);
    let mut loader = ProductLoader::new(RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    let outcome = loader.load(&products, &mut surface).await;

    assert_eq!(products.count(|c| matches!(c, Call::Create(_))), 3);
    assert_eq!(products.count(|c| *c == Call::List), 2);
    assert_eq!(outcome.products().len(), 1);
    assert!(surface.has_notice(Severity::Warning, "'Monitor LG': constraint violated"));
    assert!(surface.has_notice(Severity::Warning, "'Mouse Inalámbrico': constraint violated"));
    assert!(surface.has_notice(Severity::Warning, "Created 1 of 3 sample products"));
    assert!(!surface.has_notice(Severity::Success, "Sample data created"));
}

#[tokio::test(start_paused = true)]
async fn rejected_first_sample_still_sends_all_three() {
    let products = MemoryCollection::<Product>::new(Vec::new());
    products.fail_creates_after(0);
    let mut loader = ProductLoader::new(RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    let outcome = loader.load(&products, &mut surface).await;

    assert_eq!(products.count(|c| matches!(c, Call::Create(_))), 3);
    assert!(matches!(outcome, LoadOutcome::Empty));
    assert_eq!(loader.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn lost_connection_stops_seeding_and_still_reloads() {
    let products = MemoryCollection::<Product>::new(Vec::new());
    products.drop_connection_on_creates_after(1);
    let mut loader = ProductLoader::new(RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    let outcome = loader.load(&products, &mut surface).await;

    assert_eq!(products.count(|c| matches!(c, Call::Create(_))), 2);
    assert_eq!(products.count(|c| *c == Call::List), 2);
    assert_eq!(outcome.products().len(), 1);
    assert!(surface.has_notice(Severity::Danger, "Failed to create sample data"));
    assert!(!surface.has_notice(Severity::Success, "Sample data created"));
}

#[tokio::test(start_paused = true)]
async fn empty_list_on_the_last_attempt_is_not_seeded() {
    let products = MemoryCollection::<Product>::new(Vec::new());
    products.fail_next_lists(2);
    let mut loader = ProductLoader::new(RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    let outcome = loader.load(&products, &mut surface).await;

    assert!(matches!(outcome, LoadOutcome::Empty));
    assert_eq!(loader.attempts(), 3);
    assert_eq!(products.count(|c| matches!(c, Call::Create(_))), 0);
    let times = products.list_times();
    assert_eq!(times[1] - times[0], Duration::from_millis(1000));
    assert_eq!(times[2] - times[1], Duration::from_millis(2000));
    assert!(surface.has_line("No products available"));
}

#[tokio::test(start_paused = true)]
async fn failed_reload_after_seeding_backs_off_as_attempt_three() {
    let products = MemoryCollection::<Product>::new(Vec::new());
    products.fail_list_call(2);
    let mut loader = ProductLoader::new(RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    let outcome = loader.load(&products, &mut surface).await;

    assert_eq!(outcome.products().len(), 3);
    assert_eq!(loader.attempts(), 3);
    assert_eq!(products.count(|c| matches!(c, Call::Create(_))), 3);
    let times = products.list_times();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_millis(1000));
    assert_eq!(times[2] - times[1], Duration::from_millis(2000));
    assert!(surface.has_notice(Severity::Warning, "Retrying in 2 seconds"));
}

#[tokio::test(start_paused = true)]
async fn no_seed_policy_shows_the_empty_state() {
    let products = MemoryCollection::<Product>::new(Vec::new());
    let policy = RetryPolicy {
        seed_on_empty: false,
        ..RetryPolicy::default()
    };
    let mut loader = ProductLoader::new(policy);
    let mut surface = RecordingSurface::default();

    let outcome = loader.load(&products, &mut surface).await;

    assert!(matches!(outcome, LoadOutcome::Empty));
    assert_eq!(products.calls(), vec![Call::List]);
}

#[tokio::test(start_paused = true)]
async fn manual_retry_starts_again_from_attempt_one() {
    let products = MemoryCollection::<Product>::new(catalog());
    products.fail_next_lists(3);
    let mut manager = ProductManager::new(products, RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    assert!(manager.load(&mut surface).await.is_failed());
    assert_eq!(manager.loader().attempts(), 3);

    let started = Instant::now();
    let outcome = manager.retry(&mut surface).await;

    assert_eq!(outcome.products().len(), 3);
    assert_eq!(manager.loader().attempts(), 1);
    assert_eq!(Instant::now(), started);
    assert_eq!(manager.snapshot().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn manual_retry_on_an_empty_backend_seeds_again() {
    let products = MemoryCollection::<Product>::new(Vec::new());
    products.fail_next_lists(3);
    let mut manager = ProductManager::new(products, RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    assert!(manager.load(&mut surface).await.is_failed());
    assert_eq!(manager.collection().count(|c| matches!(c, Call::Create(_))), 0);

    let outcome = manager.retry(&mut surface).await;

    assert_eq!(outcome.products().len(), 3);
    assert_eq!(manager.loader().attempts(), 2);
    assert_eq!(manager.collection().count(|c| matches!(c, Call::Create(_))), 3);
    assert!(surface.has_notice(Severity::Success, "Sample data created successfully"));
}

#[tokio::test(start_paused = true)]
async fn created_product_is_listed_once_after_reload() {
    let policy = RetryPolicy {
        seed_on_empty: false,
        ..RetryPolicy::default()
    };
    let mut manager = ProductManager::new(MemoryCollection::<Product>::new(Vec::new()), policy);
    let mut surface = RecordingSurface::default();
    manager.load(&mut surface).await;

    let form = manager.form_mut();
    form.set("name", "Teclado").unwrap();
    form.set("description", "Mecánico").unwrap();
    form.set("price", "15.5").unwrap();
    form.set("quantity", "4").unwrap();
    assert_eq!(form.submit().unwrap().0, SubmitIntent::Create);

    manager.save(&mut surface).await.unwrap();

    let listed: Vec<_> = manager
        .snapshot()
        .iter()
        .filter(|p| p.name == "Teclado")
        .collect();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].price, Decimal::from_str("15.50").unwrap());
    assert_eq!(manager.form().mode(), FormMode::Idle);
    assert_eq!(manager.loader().attempts(), 1);
    assert!(surface.has_notice(Severity::Success, "Product created successfully"));
}

#[tokio::test(start_paused = true)]
async fn editing_without_changes_sends_the_same_values() {
    let mut manager = ProductManager::new(
        MemoryCollection::<Product>::new(catalog()),
        RetryPolicy::default(),
    );
    let mut surface = RecordingSurface::default();

    manager.begin_edit(2, &mut surface).await.unwrap();
    assert_eq!(manager.form().mode(), FormMode::Editing(2));
    manager.save(&mut surface).await.unwrap();

    let sent = manager.collection().replaced();
    assert_eq!(sent.len(), 1);
    let expected: ProductDraft = catalog()[1].to_draft();
    assert_eq!(sent[0], expected);
    assert_eq!(manager.form().mode(), FormMode::Idle);
    assert!(surface.has_notice(Severity::Success, "Product updated successfully"));
}

#[tokio::test(start_paused = true)]
async fn confirmed_delete_removes_only_that_product() {
    let mut manager = ProductManager::new(
        MemoryCollection::<Product>::new(catalog()),
        RetryPolicy::default(),
    );
    let mut surface = RecordingSurface::default();

    manager.request_delete(2);
    manager.confirm_delete(&mut surface).await.unwrap();

    let ids: Vec<_> = manager.snapshot().iter().map(|p| p.id).collect();
    assert_eq!(ids, [1, 3]);
    assert_eq!(manager.pending_delete(), None);
}

#[tokio::test(start_paused = true)]
async fn cancelled_delete_sends_nothing() {
    let mut manager = ProductManager::new(
        MemoryCollection::<Product>::new(catalog()),
        RetryPolicy::default(),
    );
    let mut surface = RecordingSurface::default();

    manager.request_delete(1);
    manager.cancel_delete();
    let err = manager.confirm_delete(&mut surface).await.unwrap_err();

    assert!(matches!(err, FlowError::NothingPending(_)));
    assert!(manager.collection().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_product_save_shows_server_message() {
    let products = MemoryCollection::<Product>::new(catalog());
    products.fail_writes();
    let mut manager = ProductManager::new(products, RetryPolicy::default());
    let mut surface = RecordingSurface::default();

    manager.begin_edit(1, &mut surface).await.unwrap();
    assert!(manager.save(&mut surface).await.is_err());

    assert!(surface.has_notice(Severity::Danger, "Failed to update product: constraint violated"));
    assert_eq!(manager.form().mode(), FormMode::Editing(1));
    assert_eq!(manager.collection().count(|c| *c == Call::List), 0);
}

#[tokio::test(start_paused = true)]
async fn patch_changes_only_the_given_fields() {
    let mut manager = ProductManager::new(
        MemoryCollection::<Product>::new(catalog()),
        RetryPolicy::default(),
    );
    let mut surface = RecordingSurface::default();
    let patch = ProductPatch {
        quantity: Some(7),
        ..ProductPatch::default()
    };

    manager.patch(3, &patch, &mut surface).await.unwrap();

    let updated = manager.snapshot().iter().find(|p| p.id == 3).unwrap().clone();
    assert_eq!(updated.quantity, 7);
    assert_eq!(updated.name, "Mouse Inalámbrico");
    assert_eq!(updated.price, Decimal::from_str("499.99").unwrap());
}

#[tokio::test(start_paused = true)]
async fn empty_patch_is_rejected_locally() {
    let mut manager = ProductManager::new(
        MemoryCollection::<Product>::new(catalog()),
        RetryPolicy::default(),
    );
    let mut surface = RecordingSurface::default();

    let err = manager
        .patch(3, &ProductPatch::default(), &mut surface)
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::EmptyPatch));
    assert!(manager.collection().calls().is_empty());
}

#[tokio::test]
async fn user_save_failure_stays_in_edit_mode() {
    let users = MemoryCollection::<User>::new(vec![user(1, "Ana", "ana@example.com")]);
    users.fail_writes();
    let mut manager = UserManager::new(users);
    let mut surface = RecordingSurface::default();

    manager.begin_edit(1, &mut surface).await.unwrap();
    manager.form_mut().set("email", "ana@correo.mx").unwrap();
    assert!(manager.save(&mut surface).await.is_err());

    assert_eq!(manager.mode(), FormMode::Editing(1));
    assert_eq!(manager.form().fields().email, "ana@correo.mx");
    assert!(surface.has_notice(Severity::Danger, "Failed to save user: constraint violated"));
}

#[tokio::test]
async fn user_update_returns_to_create_mode_and_reloads() {
    let users = MemoryCollection::<User>::new(vec![
        user(1, "Ana", "ana@example.com"),
        user(2, "Luis", "luis@example.com"),
    ]);
    let mut manager = UserManager::new(users);
    let mut surface = RecordingSurface::default();

    manager.begin_edit(2, &mut surface).await.unwrap();
    manager.form_mut().set("name", "Luis M.").unwrap();
    manager.save(&mut surface).await.unwrap();

    assert_eq!(manager.mode(), FormMode::Idle);
    assert_eq!(manager.snapshot()[1].name, "Luis M.");
    assert_eq!(manager.snapshot().len(), 2);
    assert_eq!(surface.user_tables.len(), 1);
}

#[tokio::test]
async fn user_delete_reloads_the_list() {
    let users = MemoryCollection::<User>::new(vec![
        user(1, "Ana", "ana@example.com"),
        user(2, "Luis", "luis@example.com"),
    ]);
    let mut manager = UserManager::new(users);
    let mut surface = RecordingSurface::default();

    manager.delete(1, &mut surface).await.unwrap();

    assert_eq!(manager.snapshot(), [user(2, "Luis", "luis@example.com")]);
    assert!(surface.has_notice(Severity::Success, "User deleted successfully"));
}

#[tokio::test]
async fn invalid_user_email_never_reaches_the_backend() {
    let mut manager = UserManager::new(MemoryCollection::<User>::new(Vec::new()));
    let mut surface = RecordingSurface::default();

    manager.form_mut().set("name", "Ana").unwrap();
    manager.form_mut().set("email", "ana.example.com").unwrap();
    let err = manager.save(&mut surface).await.unwrap_err();

    assert!(matches!(err, FlowError::Form(_)));
    assert!(manager.collection().calls().is_empty());
}

fn session(
    products: Vec<Product>,
    users: Vec<User>,
) -> Session<MemoryCollection<Product>, MemoryCollection<User>> {
    Session::new(
        View::Products,
        ProductManager::new(MemoryCollection::new(products), RetryPolicy::default()),
        UserManager::new(MemoryCollection::new(users)),
    )
}

#[tokio::test(start_paused = true)]
async fn console_delete_asks_before_sending() {
    let mut session = session(catalog(), Vec::new());
    let mut surface = RecordingSurface::default();
    let input: &[u8] = b"delete 1\nn\ndelete 2\ny\nquit\n";
    let mut prompts = Vec::new();

    session.run(input, &mut prompts, &mut surface).await.unwrap();

    let collection = session.products().collection();
    assert_eq!(collection.count(|c| matches!(c, Call::Delete(_))), 1);
    let ids: Vec<_> = collection.records().iter().map(|p| p.id).collect();
    assert_eq!(ids, [1, 3]);
    assert!(surface.has_notice(Severity::Info, "Deletion cancelled"));
    assert!(String::from_utf8(prompts).unwrap().contains("confirm [y/N]> "));
}

#[tokio::test(start_paused = true)]
async fn console_survives_a_line_that_is_not_utf8() {
    let mut session = session(catalog(), Vec::new());
    let mut surface = RecordingSurface::default();
    let input: &[u8] = b"\xff\xfe\ndelete 2\ny\nquit\n";
    let mut prompts = Vec::new();

    session.run(input, &mut prompts, &mut surface).await.unwrap();

    let collection = session.products().collection();
    assert_eq!(collection.calls().iter().filter(|c| **c == Call::Delete(2)).count(), 1);
    assert!(surface.has_notice(Severity::Warning, "not valid UTF-8"));
}

#[tokio::test(start_paused = true)]
async fn console_edit_flow_updates_a_product() {
    let mut session = session(catalog(), Vec::new());
    let mut surface = RecordingSurface::default();
    let input: &[u8] = b"edit 2\nset price=3299.5\nsave\nquit\n";
    let mut prompts = Vec::new();

    session.run(input, &mut prompts, &mut surface).await.unwrap();

    let updated = session.products().collection().records()[1].clone();
    assert_eq!(updated.price, Decimal::from_str("3299.50").unwrap());
    assert_eq!(updated.name, "Monitor LG");
    assert_eq!(session.products().form().mode(), FormMode::Idle);
    assert!(String::from_utf8(prompts)
        .unwrap()
        .contains("products (editing #2)> "));
}

#[tokio::test(start_paused = true)]
async fn console_switches_to_users_and_creates_one() {
    let mut session = session(catalog(), vec![user(1, "Ana", "ana@example.com")]);
    let mut surface = RecordingSurface::default();
    let input: &[u8] = b"users\nnew\nset name Luis\nset email luis@example.com\nsave\n";
    let mut prompts = Vec::new();

    session.run(input, &mut prompts, &mut surface).await.unwrap();

    assert_eq!(session.view(), View::Users);
    assert_eq!(session.users().snapshot().len(), 2);
    assert!(surface.has_notice(Severity::Success, "User created successfully"));
}

#[tokio::test(start_paused = true)]
async fn console_reports_unknown_commands_and_bad_fields() {
    let mut session = session(catalog(), Vec::new());
    let mut surface = RecordingSurface::default();
    let input: &[u8] = b"frobnicate\nset colour red\nset name Teclado\nset price abc\nsave\nhelp\n";
    let mut prompts = Vec::new();

    session.run(input, &mut prompts, &mut surface).await.unwrap();

    assert!(surface.has_notice(Severity::Warning, "unknown command 'frobnicate'"));
    assert!(surface.has_notice(Severity::Warning, "unknown field 'colour'"));
    assert!(surface.has_notice(Severity::Warning, "price must be a number"));
    assert!(surface.has_line("Commands:"));
    let collection = session.products().collection();
    assert_eq!(collection.count(|c| matches!(c, Call::Create(_))), 0);
}

#[test]
fn down_readiness_report_is_a_failure() {
    let report = HealthReport {
        status: "DOWN".to_string(),
        checks: vec![HealthCheck {
            name: "database".to_string(),
            status: "DOWN".to_string(),
            data: Default::default(),
        }],
    };
    let mut surface = RecordingSurface::default();

    let err = crate::app::report_health(&report, &mut surface).unwrap_err();

    assert!(matches!(err, FlowError::NotReady(ref status) if status == "DOWN"));
    assert!(surface.has_notice(Severity::Danger, "Backend status: DOWN"));
    assert!(surface.has_notice(Severity::Warning, "database: DOWN"));
}

#[test]
fn up_readiness_report_succeeds() {
    let report = HealthReport {
        status: "UP".to_string(),
        checks: Vec::new(),
    };
    let mut surface = RecordingSurface::default();

    assert!(crate::app::report_health(&report, &mut surface).is_ok());
    assert!(surface.has_notice(Severity::Success, "Backend status: UP"));
}

use cinder::cinder::Cinder;
use cinder::collection::Document;
use cinder::doc;
use cinder::errors::{CinderError, CinderResult, ErrorKind};
use std::backtrace::Backtrace;
use std::time::{Duration, Instant};
use std::{env, fs, thread};

#[cfg(feature = "fjall")]
use cinder_fjall_adapter::FjallStore;

#[ctor::ctor]
fn init() {
    colog::init();
}

/// Runs `test` between `before` and `after`, retrying a failed attempt.
/// `after` runs even when the test body fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> CinderResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> CinderResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> CinderResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx).map_err(|e| {
                        (format!("After run failed: {:?}", e), backtrace.to_string())
                    }),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();
        let failure = match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                last_backtrace = Some(bt);
                e
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    format!("Unknown panic: {:?}", panic_err.type_id())
                };
                last_backtrace = Some(Backtrace::capture().to_string());
                format!("Panic: {}", err_msg)
            }
        };

        if attempt < MAX_RETRIES {
            eprintln!(
                "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                attempt, MAX_RETRIES, elapsed
            );
            eprintln!("Error: {}", failure);
            eprintln!("Retrying in {}ms...\n", 100 * attempt);
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
        last_error = Some(failure);
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    path: String,
    db: Cinder,
}

impl TestContext {
    pub fn new(path: String, db: Cinder) -> Self {
        Self { path, db }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn db(&self) -> Cinder {
        self.db.clone()
    }
}

/// A fresh directory path under the system temp dir; nothing is created.
pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(id.to_string()).to_string_lossy().to_string()
}

/// A Fjall store at `path` sized for tests.
#[cfg(feature = "fjall")]
pub fn fjall_store(path: &str) -> CinderResult<FjallStore> {
    FjallStore::with_config()
        .db_path(path)
        .low_memory_preset()
        .build()
}

/// Opens the Fjall database at `path` with the given name and version.
#[cfg(feature = "fjall")]
pub fn open_fjall(path: &str, name: &str, version: u32) -> CinderResult<Cinder> {
    Cinder::open(fjall_store(path)?, name, version)
}

#[cfg(all(feature = "fjall", not(feature = "memory")))]
pub fn create_test_context() -> CinderResult<TestContext> {
    const MAX_ATTEMPTS: u32 = 3;
    let mut last_error: Option<CinderError> = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let path = random_path();
        if std::path::Path::new(&path).exists() {
            let _ = fs::remove_dir_all(&path);
        }

        let store = FjallStore::with_config()
            .db_path(&path)
            .low_memory_preset()
            .sync_on_commit(false)
            .build();
        match store.and_then(|store| {
            Cinder::builder()
                .poll_interval(Duration::from_millis(20))
                .load_store(store)
                .open()
        }) {
            Ok(db) => return Ok(TestContext::new(path, db)),
            Err(e) => {
                let _ = fs::remove_dir_all(&path);
                if attempt < MAX_ATTEMPTS {
                    eprintln!(
                        "Warning: Failed to create test context (attempt {}/{}): {:?}",
                        attempt, MAX_ATTEMPTS, e
                    );
                    thread::sleep(Duration::from_millis(50 * attempt as u64));
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        CinderError::new("Failed to create test context", ErrorKind::InternalError)
    }))
}

#[cfg(feature = "memory")]
pub fn create_test_context() -> CinderResult<TestContext> {
    let db = Cinder::builder()
        .poll_interval(Duration::from_millis(20))
        .open()?;
    Ok(TestContext::new(random_path(), db))
}

#[cfg(all(feature = "fjall", not(feature = "memory")))]
pub fn cleanup(ctx: TestContext) -> CinderResult<()> {
    let path = ctx.path().to_string();
    drop(ctx);
    remove_dir(&path);
    Ok(())
}

#[cfg(feature = "memory")]
pub fn cleanup(_ctx: TestContext) -> CinderResult<()> {
    Ok(())
}

/// Removes a database directory, retrying while the engine releases its
/// files. Failures are reported but never fail a test.
pub fn remove_dir(path: &str) {
    let max_retries = 10;
    let mut delay_ms = 50u64;

    for retry in 0..max_retries {
        if !std::path::Path::new(path).exists() {
            return;
        }
        match fs::remove_dir_all(path) {
            Ok(_) => return,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) if retry == max_retries - 1 => {
                eprintln!(
                    "Warning: Failed to remove test directory {} after {} attempts: {:?}",
                    path, max_retries, e
                );
            }
            Err(_) => {
                thread::sleep(Duration::from_millis(delay_ms));
                delay_ms = std::cmp::min(delay_ms * 2, 1000);
            }
        }
    }
}

/// Five users aged 9 to 52, keyed `u1`..`u5`.
pub fn create_test_users() -> Vec<(String, Document)> {
    vec![
        ("u1".to_string(), doc! { name: "Ada", age: 36, tags: ["math", "engines"], address: { city: "London" } }),
        ("u2".to_string(), doc! { name: "Alan", age: 41, tags: ["math", "crypto"], address: { city: "Manchester" } }),
        ("u3".to_string(), doc! { name: "Grace", age: 52, tags: ["compilers"], address: { city: "New York" } }),
        ("u4".to_string(), doc! { name: "Kid", age: 9, tags: [], address: { city: "London" } }),
        ("u5".to_string(), doc! { name: "Teen", age: 17, tags: ["games"] }),
    ]
}

/// Stores [create_test_users] in the `users` collection.
pub fn insert_test_users(db: &Cinder) -> CinderResult<()> {
    let users = db.collection("users")?;
    for (id, data) in create_test_users() {
        users.doc(&id)?.set(data)?;
    }
    Ok(())
}

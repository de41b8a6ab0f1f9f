//! Persistent [Fjall](https://github.com/fjall-rs/fjall) record engine for Cinder.
//!
//! ```rust,ignore
//! use cinder::cinder::Cinder;
//! use cinder_fjall_adapter::FjallStore;
//!
//! let store = FjallStore::with_config().db_path("/var/lib/app/db").build()?;
//! let db = Cinder::builder().name("app").load_store(store).open()?;
//! ```

mod builder;
mod codec;
mod config;
mod error;
mod store;
mod transaction;

pub use builder::*;
pub use config::*;
pub use error::{FjallStoreError, FjallStoreResult};
pub use store::FjallStore;

#[cfg(test)]
mod tests {
    use crate::store::FjallStore;
    use cinder::store::RecordStoreProvider;
    use std::{env, fs};

    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    #[derive(Clone)]
    pub struct Context {
        path: String,
    }

    impl Context {
        pub fn new() -> Context {
            let path = env::temp_dir().join(uuid::Uuid::new_v4().to_string());
            Context {
                path: path.to_string_lossy().to_string(),
            }
        }

        pub fn path(&self) -> String {
            self.path.clone()
        }

        pub fn cleanup(self) {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                log::warn!("Failed to remove test directory {}: {}", self.path, e);
            }
        }
    }

    pub fn store_at(path: &str) -> FjallStore {
        FjallStore::with_config()
            .db_path(path)
            .low_memory_preset()
            .build()
            .expect("Failed to build fjall store")
    }

    pub fn open_store(path: &str) -> FjallStore {
        let store = store_at(path);
        store
            .open("app", 1, &mut |upgrade| {
                upgrade.create_index("collectionPath", "collectionPath")
            })
            .expect("Failed to open fjall store");
        store
    }

    pub fn run_test<T, B, A>(before: B, test: T, after: A)
    where
        T: FnOnce(Context) + std::panic::UnwindSafe,
        B: FnOnce() -> Context + std::panic::UnwindSafe,
        A: FnOnce(Context) + std::panic::UnwindSafe,
    {
        let ctx = before();
        let test_ctx = ctx.clone();
        let result = std::panic::catch_unwind(move || test(test_ctx));
        after(ctx);

        if let Err(e) = result {
            let panic_msg = if let Some(msg) = e.downcast_ref::<String>() {
                msg.clone()
            } else if let Some(msg) = e.downcast_ref::<&str>() {
                msg.to_string()
            } else {
                format!("{:?}", e)
            };
            panic!("Test execution failed with panic: {}", panic_msg);
        }
    }

    #[test]
    fn context_paths_are_unique() {
        assert_ne!(Context::new().path(), Context::new().path());
    }
}

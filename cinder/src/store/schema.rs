use crate::errors::{CinderError, CinderResult, ErrorKind};

/// A secondary index over one record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct IndexDescriptor {
    name: String,
    field: String,
}

impl IndexDescriptor {
    pub fn new(name: &str, field: &str) -> Self {
        IndexDescriptor {
            name: name.to_string(),
            field: field.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Passed to the upgrade hook when a store is opened with a schema version
/// higher than the stored one.
///
/// The hook inspects the existing indexes and requests new ones; the engine
/// builds the requested indexes and records the new version only after the
/// hook returns successfully.
#[derive(Debug)]
pub struct SchemaUpgrade {
    old_version: u32,
    new_version: u32,
    existing: Vec<IndexDescriptor>,
    created: Vec<IndexDescriptor>,
}

impl SchemaUpgrade {
    pub fn new(old_version: u32, new_version: u32, existing: Vec<IndexDescriptor>) -> Self {
        SchemaUpgrade {
            old_version,
            new_version,
            existing,
            created: Vec::new(),
        }
    }

    /// Version stored before the upgrade, `0` for a freshly created store.
    pub fn old_version(&self) -> u32 {
        self.old_version
    }

    pub fn new_version(&self) -> u32 {
        self.new_version
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.existing.iter().chain(self.created.iter()).any(|i| i.name == name)
    }

    pub fn create_index(&mut self, name: &str, field: &str) -> CinderResult<()> {
        if name.is_empty() || field.is_empty() {
            log::error!("Index name and field cannot be empty");
            return Err(CinderError::new(
                "Index name and field cannot be empty",
                ErrorKind::ValidationError,
            ));
        }

        if self.has_index(name) {
            log::error!("Index {} already exists", name);
            return Err(CinderError::new(
                &format!("Index {} already exists", name),
                ErrorKind::InvalidOperation,
            ));
        }

        self.created.push(IndexDescriptor::new(name, field));
        Ok(())
    }

    pub fn created_indexes(&self) -> &[IndexDescriptor] {
        &self.created
    }
}

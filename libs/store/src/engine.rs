//! Binding to the embedded key-value engine.
//!
//! All events live in a single `events` table keyed by raw bytes. Writes go
//! through one write transaction per call; reads run inside a read
//! transaction and see a consistent snapshot.

use redb::backends::InMemoryBackend;
use redb::{Database, ReadOnlyTable, ReadableTable, Table, TableDefinition};

use crate::{StorageMode, StoreConfig};

const EVENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("events");

/// An open engine handle.
pub(crate) struct Engine {
    db: Database,
}

impl Engine {
    /// Opens (or creates) the database described by `config`.
    pub(crate) fn open(config: &StoreConfig) -> Result<Self, redb::Error> {
        let mut builder = Database::builder();
        if let Some(bytes) = config.cache_size_bytes {
            builder.set_cache_size(bytes);
        }

        let db = match &config.storage {
            StorageMode::InMemory => builder.create_with_backend(InMemoryBackend::new())?,
            StorageMode::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(redb::Error::Io)?;
                }
                builder.create(path)?
            }
        };

        // Read transactions fail on a table that was never created.
        let txn = db.begin_write()?;
        txn.open_table(EVENTS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    /// Runs `f` in a write transaction, committing only if it succeeds.
    ///
    /// Write transactions are exclusive: `f` runs while no other writer can
    /// begin, so anything it assigns is ordered like the commits.
    pub(crate) fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<redb::Error>,
        F: FnOnce(&mut Table<'_, &'static [u8], &'static [u8]>) -> Result<T, E>,
    {
        let txn = self.db.begin_write().map_err(engine_error::<E>)?;
        let result = {
            let mut table = txn.open_table(EVENTS).map_err(engine_error::<E>)?;
            f(&mut table)
        };

        match result {
            Ok(value) => {
                txn.commit().map_err(engine_error::<E>)?;
                Ok(value)
            }
            Err(err) => {
                txn.abort().map_err(engine_error::<E>)?;
                Err(err)
            }
        }
    }

    /// Runs `f` against a read-only snapshot.
    pub(crate) fn view<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<redb::Error>,
        F: FnOnce(&Snapshot) -> Result<T, E>,
    {
        let txn = self.db.begin_read().map_err(engine_error::<E>)?;
        let table = txn.open_table(EVENTS).map_err(engine_error::<E>)?;
        f(&Snapshot { table })
    }
}

/// A point-in-time view of the events table.
pub(crate) struct Snapshot {
    table: ReadOnlyTable<&'static [u8], &'static [u8]>,
}

impl Snapshot {
    /// Visits every entry whose key starts with `prefix`, in key order.
    pub(crate) fn scan_prefix<E, F>(&self, prefix: &[u8], mut visit: F) -> Result<(), E>
    where
        E: From<redb::Error>,
        F: FnMut(&[u8], &[u8]) -> Result<(), E>,
    {
        let range = self
            .table
            .range::<&[u8]>(prefix..)
            .map_err(engine_error::<E>)?;

        for entry in range {
            let (key, value) = entry.map_err(engine_error::<E>)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            visit(key, value.value())?;
        }

        Ok(())
    }

    /// Visits the keys starting with `prefix`, in key order, without
    /// handing out values. An empty prefix visits every key.
    pub(crate) fn scan_keys<E, F>(&self, prefix: &[u8], mut visit: F) -> Result<(), E>
    where
        E: From<redb::Error>,
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        let range = self
            .table
            .range::<&[u8]>(prefix..)
            .map_err(engine_error::<E>)?;

        for entry in range {
            let (key, _) = entry.map_err(engine_error::<E>)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            visit(key)?;
        }

        Ok(())
    }
}

fn engine_error<E: From<redb::Error>>(err: impl Into<redb::Error>) -> E {
    E::from(err.into())
}

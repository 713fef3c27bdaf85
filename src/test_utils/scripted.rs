use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::connectivity::{ConnectionHandle, Connectivity, StatementHandle};
use crate::error::DriverError;
use crate::placeholders::count_placeholders;
use crate::types::{FieldMetadata, RowValues, SqlType};

/// Primitive call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Connect,
    Prepare,
    AutoCommit,
    Commit,
    Rollback,
    Execute,
    RowsAffected,
    NumParams,
    NumFields,
    /// Metadata lookup of the column at this 1-based index.
    FieldMetadata(usize),
    Fetch,
    CloseStatement,
    CloseConnection,
}

/// Primitive call as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(String),
    Prepare(String),
    AutoCommit(bool),
    Commit,
    Rollback,
    Execute { sql: String, args: usize },
    RowsAffected,
    NumParams,
    NumFields,
    FieldMetadata(usize),
    Fetch,
    CloseStatement(String),
    CloseConnection,
}

/// Canned outcome of executing one SQL text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptedResult {
    pub columns: Vec<FieldMetadata>,
    pub rows: Vec<Vec<RowValues>>,
    pub rows_affected: i64,
}

impl ScriptedResult {
    /// A result set with untyped columns. Reports `-1` rows affected.
    #[must_use]
    pub fn rows(columns: &[&str], rows: Vec<Vec<RowValues>>) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|name| FieldMetadata::new(*name, SqlType::Unknown))
                .collect(),
            rows,
            rows_affected: -1,
        }
    }

    /// A statement without a result set that touched `count` rows.
    #[must_use]
    pub fn affected(count: i64) -> Self {
        Self {
            rows_affected: count,
            ..Self::default()
        }
    }

    /// Replace the column metadata, e.g. to give columns a type.
    #[must_use]
    pub fn with_columns(mut self, columns: Vec<FieldMetadata>) -> Self {
        self.columns = columns;
        self
    }
}

#[derive(Debug, Default)]
struct Script {
    results: HashMap<String, ScriptedResult>,
    faults: HashSet<Fault>,
    journal: Vec<Call>,
}

/// In-memory connectivity with canned results, fault injection and a call journal.
///
/// Clones share state, so a test keeps one clone to script and inspect while the
/// driver owns another. Unscripted SQL prepares and executes as a statement with no
/// result set and zero affected rows. Parameter counts come from the `?` markers
/// in the text and are enforced on execute, as a real driver's bind step does.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnectivity {
    script: Arc<Mutex<Script>>,
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Script {
    fn record(&mut self, call: Call, fault: Fault) -> Result<(), DriverError> {
        self.journal.push(call);
        if self.faults.contains(&fault) {
            Err(DriverError::new(format!("injected {fault:?} failure")).with_sqlstate("HY000"))
        } else {
            Ok(())
        }
    }
}

impl ScriptedConnectivity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome of executing `sql`.
    #[must_use]
    pub fn with_result(self, sql: impl Into<String>, result: ScriptedResult) -> Self {
        lock(&self.script).results.insert(sql.into(), result);
        self
    }

    /// Make every subsequent call of this kind fail.
    pub fn fail(&self, fault: Fault) {
        lock(&self.script).faults.insert(fault);
    }

    pub fn heal(&self, fault: Fault) {
        lock(&self.script).faults.remove(&fault);
    }

    /// Every primitive call so far, in order.
    #[must_use]
    pub fn journal(&self) -> Vec<Call> {
        lock(&self.script).journal.clone()
    }

    /// Number of journal entries matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        lock(&self.script).journal.iter().filter(|c| pred(*c)).count()
    }

    /// Descriptors passed to `connect`, in order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<String> {
        lock(&self.script)
            .journal
            .iter()
            .filter_map(|call| match call {
                Call::Connect(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Connectivity for ScriptedConnectivity {
    fn connect(&self, descriptor: &str) -> Result<Box<dyn ConnectionHandle>, DriverError> {
        lock(&self.script).record(Call::Connect(descriptor.to_string()), Fault::Connect)?;
        Ok(Box::new(ScriptedConnection {
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedConnection {
    script: Arc<Mutex<Script>>,
}

impl ConnectionHandle for ScriptedConnection {
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn StatementHandle + 'c>, DriverError> {
        let mut script = lock(&self.script);
        script.record(Call::Prepare(sql.to_string()), Fault::Prepare)?;
        let scripted = script.results.get(sql).cloned().unwrap_or_default();
        Ok(Box::new(ScriptedStatement {
            script: Arc::clone(&self.script),
            sql: sql.to_string(),
            params: count_placeholders(sql),
            scripted,
            cursor: None,
            rows_affected: None,
        }))
    }

    fn set_autocommit(&self, enabled: bool) -> Result<(), DriverError> {
        lock(&self.script).record(Call::AutoCommit(enabled), Fault::AutoCommit)
    }

    fn commit(&self) -> Result<(), DriverError> {
        lock(&self.script).record(Call::Commit, Fault::Commit)
    }

    fn rollback(&self) -> Result<(), DriverError> {
        lock(&self.script).record(Call::Rollback, Fault::Rollback)
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        lock(&self.script).record(Call::CloseConnection, Fault::CloseConnection)
    }
}

struct ScriptedStatement {
    script: Arc<Mutex<Script>>,
    sql: String,
    params: usize,
    scripted: ScriptedResult,
    cursor: Option<usize>,
    rows_affected: Option<i64>,
}

impl StatementHandle for ScriptedStatement {
    fn execute(&mut self, args: &[RowValues]) -> Result<(), DriverError> {
        lock(&self.script).record(
            Call::Execute {
                sql: self.sql.clone(),
                args: args.len(),
            },
            Fault::Execute,
        )?;
        self.cursor = None;
        self.rows_affected = None;
        if args.len() != self.params {
            return Err(DriverError::new(format!(
                "COUNT field incorrect: expected {} parameters, got {}",
                self.params,
                args.len()
            ))
            .with_sqlstate("07002"));
        }
        self.cursor = Some(0);
        self.rows_affected = Some(self.scripted.rows_affected);
        Ok(())
    }

    fn rows_affected(&self) -> Result<i64, DriverError> {
        lock(&self.script).record(Call::RowsAffected, Fault::RowsAffected)?;
        self.rows_affected
            .ok_or_else(|| DriverError::new("function sequence error").with_sqlstate("HY010"))
    }

    fn num_params(&self) -> Result<usize, DriverError> {
        lock(&self.script).record(Call::NumParams, Fault::NumParams)?;
        Ok(self.params)
    }

    fn num_fields(&self) -> Result<usize, DriverError> {
        lock(&self.script).record(Call::NumFields, Fault::NumFields)?;
        Ok(self.scripted.columns.len())
    }

    fn field_metadata(&self, index: usize) -> Result<FieldMetadata, DriverError> {
        lock(&self.script).record(Call::FieldMetadata(index), Fault::FieldMetadata(index))?;
        index
            .checked_sub(1)
            .and_then(|i| self.scripted.columns.get(i))
            .cloned()
            .ok_or_else(|| DriverError::new("invalid descriptor index").with_sqlstate("07009"))
    }

    fn fetch_one(&mut self, dest: &mut [RowValues]) -> Result<bool, DriverError> {
        lock(&self.script).record(Call::Fetch, Fault::Fetch)?;
        let cursor = self
            .cursor
            .ok_or_else(|| DriverError::new("invalid cursor state").with_sqlstate("24000"))?;
        let Some(row) = self.scripted.rows.get(cursor) else {
            return Ok(true);
        };
        if dest.len() != row.len() {
            return Err(DriverError::new(format!(
                "row buffer has {} slots, result has {} columns",
                dest.len(),
                row.len()
            ))
            .with_sqlstate("07009"));
        }
        dest.clone_from_slice(row);
        self.cursor = Some(cursor + 1);
        Ok(false)
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        lock(&self.script).record(Call::CloseStatement(self.sql.clone()), Fault::CloseStatement)
    }
}

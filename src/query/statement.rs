use sqlx::query::{QueryAs, QueryScalar};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite};

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Int(i64),
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

/// SQL text plus its positional parameters.
///
/// Text only ever comes from `push` with crate-owned fragments; every
/// caller-supplied value goes through `push_bind`, mirroring sqlx's
/// `QueryBuilder::push`/`push_bind` split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    params: Vec<Param>,
}

impl Statement {
    pub(crate) fn new(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            params: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, trusted: &str) -> &mut Self {
        self.sql.push_str(trusted);
        self
    }

    pub(crate) fn push_bind(&mut self, value: impl Into<Param>) -> &mut Self {
        self.sql.push('?');
        self.params.push(value.into());
        self
    }

    pub(crate) fn append(&mut self, other: &Statement) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params.iter().cloned());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn query_as<T>(&self) -> QueryAs<'_, Sqlite, T, SqliteArguments<'_>>
    where
        T: for<'r> FromRow<'r, SqliteRow>,
    {
        let mut q = sqlx::query_as::<_, T>(&self.sql);
        for p in &self.params {
            q = match p {
                Param::Text(s) => q.bind(s.as_str()),
                Param::Int(n) => q.bind(*n),
            };
        }
        q
    }

    pub fn query_scalar<T>(&self) -> QueryScalar<'_, Sqlite, T, SqliteArguments<'_>>
    where
        (T,): for<'r> FromRow<'r, SqliteRow>,
    {
        let mut q = sqlx::query_scalar::<_, T>(&self.sql);
        for p in &self.params {
            q = match p {
                Param::Text(s) => q.bind(s.as_str()),
                Param::Int(n) => q.bind(*n),
            };
        }
        q
    }
}

/// Count and data statements over the same FROM/JOIN/WHERE body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub count: Statement,
    pub data: Statement,
}

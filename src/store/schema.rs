//! SQL DDL for initializing the backing database.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `users`: fixed credential table, read-only from the API's perspective
/// - `apps_demo` / `projects_demo`: starter content tables; deployments add
///   further tables with the same column shape under their own names
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL -- bcrypt hash
);

CREATE TABLE IF NOT EXISTS apps_demo (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    link TEXT NOT NULL,
    category TEXT NOT NULL,
    image TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects_demo (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    link TEXT NOT NULL,
    image TEXT NOT NULL,
    pdfFile TEXT NULL
);
"#;

//! CLI subcommands.

pub mod admin;
pub mod migrate;

/// Read a database URL from `primary`, falling back to `DATABASE_URL`.
pub(crate) fn database_url(primary: &'static str) -> Option<String> {
    std::env::var(primary)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

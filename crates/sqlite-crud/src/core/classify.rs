/// Statement kinds that return rows. Everything else runs as a write.
const READ_PREFIXES: [&str; 2] = ["SELECT", "PRAGMA"];

/// Read/write split for raw SQL, decided by the leading keyword only.
///
/// A `WITH ... SELECT` or an `EXPLAIN` classifies as a write; the executor
/// still drains any rows such a statement yields and reports its change count.
pub fn is_read_query(sql: &str) -> bool {
    let head = sql.trim_start();
    READ_PREFIXES.iter().any(|kw| {
        head.get(..kw.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(kw))
    })
}

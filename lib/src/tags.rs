/// Splits a comma-separated tag string, trimming whitespace and dropping
/// empty entries.
pub fn parse_tags(tags_str: &str) -> Vec<String> {
    tags_str
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Join tags back into the comma-separated attribute form
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

/// Wrap tags in the `,a,b,` sentinel form stored in the database.
///
/// The surrounding commas let exact tag membership be checked with a
/// `LIKE '%,tag,%'` scan. An empty tag set is stored as a single comma.
pub fn wrap_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        ",".to_string()
    } else {
        format!(",{},", tags.join(","))
    }
}

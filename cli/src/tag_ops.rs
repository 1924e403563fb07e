/// A single edit to a bookmark's tag list, parsed from the command line.
#[derive(Debug, PartialEq, Clone)]
pub enum TagOp {
    /// `+name` or a bare `name`.
    Add(String),
    /// `-name`.
    Remove(String),
    /// `~old:new`.
    Replace { old: String, new: String },
}

/// Parses `edit --tag` arguments into tag operations.
///
/// Bare names and `+name` add, `-name` removes, `~old:new` swaps one tag
/// for another. Tags never contain spaces; offending arguments are dropped
/// with a single consolidated warning at the end so a long edit command
/// does not scroll the terminal.
pub fn parse_tag_operations(args: &[String]) -> Vec<TagOp> {
    let mut ops = Vec::new();
    let mut spaced = Vec::new();
    let mut malformed = Vec::new();

    let clean = |name: &str| !name.contains(' ');

    for arg in args.iter().filter(|a| !a.is_empty()) {
        if let Some(spec) = arg.strip_prefix('~') {
            match spec.split_once(':') {
                Some((old, new)) if clean(old) && clean(new) => {
                    ops.push(TagOp::Replace {
                        old: old.to_string(),
                        new: new.to_string(),
                    });
                }
                Some(_) => spaced.push(arg.clone()),
                None => malformed.push(arg.clone()),
            }
            continue;
        }

        let (name, removing) = match arg.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (arg.strip_prefix('+').unwrap_or(arg), false),
        };
        if !clean(name) {
            spaced.push(arg.clone());
        } else if removing {
            ops.push(TagOp::Remove(name.to_string()));
        } else {
            ops.push(TagOp::Add(name.to_string()));
        }
    }

    if !spaced.is_empty() {
        eprintln!(
            "Warning: The following tags contain spaces and were ignored: {}",
            spaced.join(", ")
        );
    }
    if !malformed.is_empty() {
        eprintln!(
            "Warning: Invalid replace syntax (expected '~old:new'): {}",
            malformed.join(", ")
        );
    }

    ops
}

/// Applies tag operations to an existing tag list, in order.
///
/// Adds are deduplicated, removes drop every occurrence, and a replace
/// rewrites the first occurrence in place so the tag keeps its position.
pub fn apply_tag_operations(existing: &[String], operations: &[TagOp]) -> Vec<String> {
    let mut tags = existing.to_vec();

    for op in operations {
        match op {
            TagOp::Add(tag) => {
                if !tags.iter().any(|t| t == tag) {
                    tags.push(tag.clone());
                }
            }
            TagOp::Remove(tag) => tags.retain(|t| t != tag),
            TagOp::Replace { old, new } => {
                if let Some(slot) = tags.iter_mut().find(|t| t.as_str() == old.as_str()) {
                    *slot = new.clone();
                }
            }
        }
    }

    tags
}

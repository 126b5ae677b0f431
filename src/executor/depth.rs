//! Selection-tree depth validation
//!
//! Runs before execution: a query nesting deeper than the configured bound
//! is rejected outright, with no resolver invoked and no store access. Depth
//! counting is fragment-transparent — a spread contributes the depth of the
//! fragment's own selection at the spread's level, so fragments can neither
//! hide nor reset nesting.

use graphql_parser::query::{FragmentDefinition, Selection, SelectionSet};
use std::collections::HashMap;

use crate::core::ValidationError;

/// Named fragments of the document, looked up during traversal.
pub(super) type FragmentMap<'q> = HashMap<&'q str, &'q FragmentDefinition<'q, String>>;

/// Reject the operation when any path of its selection tree nests deeper
/// than `max_depth`. The root selection has depth 1.
pub(super) fn validate(
    selection_set: &SelectionSet<'_, String>,
    fragments: &FragmentMap<'_>,
    max_depth: usize,
) -> Result<(), ValidationError> {
    let depth = selection_depth(selection_set, fragments, &mut Vec::new())?;
    if depth > max_depth {
        return Err(ValidationError::DepthExceeded { depth, max_depth });
    }
    Ok(())
}

/// Maximum nesting depth across every path of the selection set.
///
/// `visiting` tracks the spread stack: a fragment spreading itself (directly
/// or through another fragment) has no finite depth and is rejected.
fn selection_depth(
    selection_set: &SelectionSet<'_, String>,
    fragments: &FragmentMap<'_>,
    visiting: &mut Vec<String>,
) -> Result<usize, ValidationError> {
    let mut max = 0;

    for selection in &selection_set.items {
        let depth = match selection {
            Selection::Field(field) => {
                if field.selection_set.items.is_empty() {
                    1
                } else {
                    1 + selection_depth(&field.selection_set, fragments, visiting)?
                }
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.fragment_name.as_str();
                let fragment = fragments.get(name).ok_or(ValidationError::InvalidFragment {
                    name: name.to_string(),
                })?;
                if visiting.iter().any(|seen| seen == name) {
                    return Err(ValidationError::InvalidFragment {
                        name: name.to_string(),
                    });
                }
                visiting.push(name.to_string());
                let depth = selection_depth(&fragment.selection_set, fragments, visiting)?;
                visiting.pop();
                depth
            }
            Selection::InlineFragment(inline) => {
                selection_depth(&inline.selection_set, fragments, visiting)?
            }
        };
        max = max.max(depth);
    }

    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_parser::query::{Definition, OperationDefinition, parse_query};

    fn check(query: &str, max_depth: usize) -> Result<(), ValidationError> {
        let doc = parse_query::<String>(query).unwrap();
        let mut fragments = FragmentMap::new();
        let mut selection_set = None;
        for def in &doc.definitions {
            match def {
                Definition::Fragment(frag) => {
                    fragments.insert(frag.name.as_str(), frag);
                }
                Definition::Operation(OperationDefinition::Query(q)) => {
                    selection_set = Some(&q.selection_set);
                }
                Definition::Operation(OperationDefinition::SelectionSet(set)) => {
                    selection_set = Some(set);
                }
                _ => {}
            }
        }
        validate(selection_set.expect("query operation"), &fragments, max_depth)
    }

    #[test]
    fn flat_query_has_depth_one() {
        assert!(check("{ users }", 1).is_ok());
    }

    #[test]
    fn nesting_counts_every_level() {
        let query = "{ users { posts { author { name } } } }";
        assert!(check(query, 4).is_ok());
        assert_eq!(
            check(query, 3),
            Err(ValidationError::DepthExceeded {
                depth: 4,
                max_depth: 3
            })
        );
    }

    #[test]
    fn depth_is_the_maximum_across_paths() {
        let query = "{ users { id } posts { author { id } } }";
        assert!(check(query, 3).is_ok());
        assert!(check(query, 2).is_err());
    }

    #[test]
    fn fragment_spread_is_depth_transparent() {
        let query = "
            { users { ...UserTree } }
            fragment UserTree on User { posts { title } }
        ";
        // users(1) -> posts(2) -> title(3), fragment adds no level of its own
        assert!(check(query, 3).is_ok());
        assert_eq!(
            check(query, 2),
            Err(ValidationError::DepthExceeded {
                depth: 3,
                max_depth: 2
            })
        );
    }

    #[test]
    fn inline_fragment_is_depth_transparent() {
        let query = "{ users { ... on User { posts { title } } } }";
        assert!(check(query, 3).is_ok());
        assert!(check(query, 2).is_err());
    }

    #[test]
    fn unknown_fragment_is_rejected() {
        assert_eq!(
            check("{ users { ...Ghost } }", 10),
            Err(ValidationError::InvalidFragment {
                name: "Ghost".to_string()
            })
        );
    }

    #[test]
    fn fragment_cycle_is_rejected() {
        let query = "
            { users { ...A } }
            fragment A on User { ...B }
            fragment B on User { ...A }
        ";
        assert!(matches!(
            check(query, 10),
            Err(ValidationError::InvalidFragment { .. })
        ));
    }
}

//! Cypher RETURN-clause column extraction.
//!
//! Apache AGE requires the SQL wrapper around a Cypher call to declare one
//! `agtype` column per returned item, so the backend needs the column names
//! before it can run a query.
//!
//! ```
//! use bibliofed::graph::extract_return_columns;
//!
//! let columns = extract_return_columns("MATCH (j:Journal) RETURN j.uri AS journal, j.title").unwrap();
//! assert_eq!(columns, vec!["journal", "j.title"]);
//! ```

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "graph/cypher.pest"]
struct CypherParser;

/// Extracts column names from a Cypher query's final RETURN clause.
///
/// Aliased items (`expr AS alias`) yield the alias; unaliased items yield
/// the expression text.
pub fn extract_return_columns(query: &str) -> Result<Vec<String>, ParseError> {
    let mut pairs = CypherParser::parse(Rule::Cypher, query)
        .map_err(|e| ParseError::InvalidSyntax(format!("{}", e)))?;

    let mut columns = Vec::new();
    if let Some(cypher) = pairs.next() {
        for pair in cypher.into_inner() {
            // A later RETURN (after WITH or UNION) replaces earlier ones
            if pair.as_rule() == Rule::Return {
                columns = return_columns(pair)?;
            }
        }
    }

    if columns.is_empty() {
        return Err(ParseError::NoReturnClause);
    }

    Ok(columns)
}

fn return_columns(pair: Pair<'_, Rule>) -> Result<Vec<String>, ParseError> {
    let mut columns = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::Star => return Err(ParseError::ReturnStarNotSupported),
            Rule::ProjectionItems => {
                for item in inner.into_inner() {
                    columns.push(column_name(item));
                }
            }
            _ => {}
        }
    }
    Ok(columns)
}

/// Column name for a single projection item: the alias if present, else the expression.
fn column_name(item: Pair<'_, Rule>) -> String {
    let mut expression = item.as_str().trim().to_string();
    for inner in item.into_inner() {
        match inner.as_rule() {
            Rule::Expression => expression = inner.as_str().trim().to_string(),
            Rule::Variable => {
                let name = inner.as_str();
                let name = name
                    .strip_prefix('`')
                    .and_then(|n| n.strip_suffix('`'))
                    .unwrap_or(name);
                return name.to_string();
            }
            _ => {}
        }
    }
    expression
}

/// Errors that can occur during Cypher parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No RETURN clause found in the query
    NoReturnClause,
    /// RETURN * requires variable tracking (not supported)
    ReturnStarNotSupported,
    /// Syntax error in the query
    InvalidSyntax(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::NoReturnClause => write!(f, "No RETURN clause found in query"),
            ParseError::ReturnStarNotSupported => {
                write!(
                    f,
                    "RETURN * is not supported - please specify columns explicitly"
                )
            }
            ParseError::InvalidSyntax(msg) => write!(f, "Invalid syntax: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(query: &str) -> Vec<String> {
        extract_return_columns(query).unwrap()
    }

    #[test]
    fn test_simple_variable() {
        assert_eq!(cols("MATCH (n) RETURN n"), vec!["n"]);
    }

    #[test]
    fn test_property_with_alias() {
        assert_eq!(
            cols("MATCH (j:Journal) RETURN j.title AS title"),
            vec!["title"]
        );
    }

    #[test]
    fn test_mixed_aliased_and_not() {
        assert_eq!(cols("RETURN a, r AS rel, b"), vec!["a", "rel", "b"]);
    }

    #[test]
    fn test_expression_with_arithmetic() {
        assert_eq!(cols("MATCH (n) RETURN n.age + 10"), vec!["n.age + 10"]);
    }

    #[test]
    fn test_function_call_with_commas() {
        assert_eq!(
            cols("MATCH (j) RETURN coalesce(j.license, 'none') AS license, count(*)"),
            vec!["license", "count(*)"]
        );
    }

    #[test]
    fn test_distinct() {
        assert_eq!(
            cols("MATCH (j:Journal) WHERE j.license IS NOT NULL RETURN DISTINCT j.license AS license"),
            vec!["license"]
        );
    }

    #[test]
    fn test_string_with_return_keyword() {
        assert_eq!(
            cols("MATCH (j) WHERE j.title = 'RETURN of the Journal' RETURN j.uri AS journal"),
            vec!["journal"]
        );
    }

    #[test]
    fn test_list_and_map_expressions() {
        assert_eq!(
            cols("RETURN [1, 2, 3] AS xs, {a: 1, b: 2} AS m"),
            vec!["xs", "m"]
        );
    }

    #[test]
    fn test_case_expression() {
        assert_eq!(
            cols("MATCH (j) RETURN CASE WHEN j.apc THEN 'yes' ELSE 'no' END AS apc"),
            vec!["apc"]
        );
    }

    #[test]
    fn test_order_skip_limit() {
        assert_eq!(
            cols("MATCH (j) RETURN j.uri AS journal, j.title AS title ORDER BY j.title SKIP 5 LIMIT 10"),
            vec!["journal", "title"]
        );
    }

    #[test]
    fn test_case_insensitive_keywords() {
        assert_eq!(cols("match (n) return n.id as id"), vec!["id"]);
    }

    #[test]
    fn test_alias_prefix_is_not_keyword() {
        assert_eq!(cols("MATCH (n) RETURN n.asset, n.orders"), vec!["n.asset", "n.orders"]);
    }

    #[test]
    fn test_backtick_identifier() {
        assert_eq!(cols("MATCH (n) RETURN n.id AS `journal id`"), vec!["journal id"]);
    }

    #[test]
    fn test_with_clause_uses_last_return() {
        assert_eq!(
            cols("MATCH (j) WITH j.uri AS u RETURN u AS journal"),
            vec!["journal"]
        );
    }

    #[test]
    fn test_union_uses_last_return() {
        assert_eq!(
            cols("MATCH (a) RETURN a.id AS id UNION MATCH (b) RETURN b.id AS id"),
            vec!["id"]
        );
    }

    #[test]
    fn test_multiline_query() {
        let query = "MATCH (j:Journal)
             WHERE $id IN j.identifiers
             RETURN j.uri AS journal,
                    j.title AS title,
                    j.languages AS language";
        assert_eq!(cols(query), vec!["journal", "title", "language"]);
    }

    #[test]
    fn test_no_return_clause() {
        assert_eq!(
            extract_return_columns("CREATE (j:Journal {uri: $uri})"),
            Err(ParseError::NoReturnClause)
        );
    }

    #[test]
    fn test_return_star_not_supported() {
        assert_eq!(
            extract_return_columns("MATCH (n) RETURN *"),
            Err(ParseError::ReturnStarNotSupported)
        );
    }
}

//! Parameter discovery.
//!
//! Every identifier-like run in the expression texts that is not reserved becomes an
//! adjustable parameter. Extraction never fails: empty or malformed text simply contributes
//! nothing.

use std::collections::BTreeSet;

use crate::lexer::is_identifier_char;
use crate::symbols::SymbolTable;

/// Iterate over the maximal runs of ASCII letters and underscores in `text`.
pub fn identifier_runs(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_identifier_char(c))
        .filter(|run| !run.is_empty())
}

/// Collect the non-reserved identifiers of all `expressions`, sorted and de-duplicated.
///
/// ```
/// use funfun::extract::extract_parameters;
///
/// assert_eq!(extract_parameters(&["x + a*cos(b)"]), vec!["a", "b"]);
/// assert!(extract_parameters(&["", "  ", "123 + 4.5"]).is_empty());
/// ```
pub fn extract_parameters<S: AsRef<str>>(expressions: &[S]) -> Vec<String> {
    extract_with(&SymbolTable::standard(), expressions)
}

/// [`extract_parameters`] against an explicit symbol table.
pub fn extract_with<S: AsRef<str>>(table: &SymbolTable, expressions: &[S]) -> Vec<String> {
    let mut found = BTreeSet::new();
    for expr in expressions {
        for run in identifier_runs(expr.as_ref()) {
            if !table.is_reserved(run) {
                found.insert(run);
            }
        }
    }
    found.into_iter().map(str::to_string).collect()
}

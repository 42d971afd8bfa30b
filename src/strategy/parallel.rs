//! Parallel Completion Queries
//!
//! Uses Rayon to answer many "what may come next" queries against one DTD,
//! e.g. when an editor revalidates every open element of a document at once.

use rayon::prelude::*;

use crate::content::{complete_element, Completion};
use crate::core::error::Result;
use crate::dtd::Dtd;

/// Element path (outermost first) and the children already present in
/// its last element
pub type CompletionQuery = (Vec<String>, Vec<String>);

/// Evaluate multiple completion queries in parallel
pub fn complete_parallel(dtd: &Dtd, queries: &[CompletionQuery]) -> Vec<Result<Completion>> {
    queries
        .par_iter()
        .map(|(path, consumed)| complete_element(dtd, path, consumed))
        .collect()
}

/// Allowed-next names for every prefix of one child sequence
pub fn completion_trail(dtd: &Dtd, path: &[String], children: &[String]) -> Result<Vec<Completion>> {
    (0..=children.len())
        .into_par_iter()
        .map(|end| complete_element(dtd, path, &children[..end]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseOptions;
    use crate::core::error::DtdError;
    use crate::dtd::{parse_source, CatalogProvider};

    fn dtd() -> Dtd {
        parse_source(
            &CatalogProvider::new(),
            "test",
            "<!ELEMENT dl (dt, dd)+><!ELEMENT dt (#PCDATA)><!ELEMENT dd (#PCDATA)>",
            &ParseOptions::xml(),
        )
        .unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parallel_completion() {
        let dtd = dtd();
        let queries = vec![
            (strings(&["dl"]), strings(&[])),
            (strings(&["dl"]), strings(&["dt"])),
            (strings(&["dl"]), strings(&["dt", "dd"])),
            (strings(&["ol"]), strings(&[])),
        ];

        let results = complete_parallel(&dtd, &queries);
        assert_eq!(results.len(), 4);

        let first = results[0].as_ref().unwrap();
        assert!(first.next.contains("dt"));
        assert!(!first.can_close);
        let second = results[1].as_ref().unwrap();
        assert!(second.next.contains("dd"));
        assert!(results[2].as_ref().unwrap().can_close);
        assert_eq!(
            results[3].as_ref().unwrap_err(),
            &DtdError::NoSuchElement("ol".to_string())
        );
    }

    #[test]
    fn test_completion_trail() {
        let dtd = dtd();
        let trail = completion_trail(&dtd, &strings(&["dl"]), &strings(&["dt", "dd", "dt"])).unwrap();
        let closable: Vec<bool> = trail.iter().map(|c| c.can_close).collect();
        assert_eq!(closable, [false, false, true, false]);
    }
}

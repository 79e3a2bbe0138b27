//! Import statement detection in code

use std::collections::BTreeSet;

/// Lines that look like Python import statements, trimmed
pub fn import_lines(code: &str) -> Vec<&str> {
    code.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("import ") || line.starts_with("from "))
        .collect()
}

/// Top-level module names imported by the code
///
/// Understands `import a.b as c, d` and `from a.b import c`. Relative imports
/// (`from . import x`) name no library and are ignored.
///
/// # Examples
///
/// ```
/// use refresher_processor::imports::libraries;
///
/// let libs = libraries("import numpy as np\nfrom matplotlib import pyplot as plt\nimport os, sys");
/// let names: Vec<_> = libs.iter().map(String::as_str).collect();
/// assert_eq!(names, vec!["matplotlib", "numpy", "os", "sys"]);
/// ```
pub fn libraries(code: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for line in import_lines(code) {
        let line = line.split('#').next().unwrap_or_default().trim();

        if let Some(rest) = line.strip_prefix("import ") {
            for item in rest.split(',') {
                let module = item.split_whitespace().next().unwrap_or_default();
                insert_top_level(&mut found, module);
            }
        } else if let Some(rest) = line.strip_prefix("from ") {
            let mut words = rest.split_whitespace();
            let module = words.next().unwrap_or_default();
            if words.next() == Some("import") {
                insert_top_level(&mut found, module);
            }
        }
    }
    found
}

fn insert_top_level(found: &mut BTreeSet<String>, module: &str) {
    let top = module.split('.').next().unwrap_or_default();
    if is_identifier(top) {
        found.insert(top.to_string());
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_and_aliased() {
        let libs = libraries("import scipy.stats as st\nfrom sklearn.model_selection import KFold");
        assert!(libs.contains("scipy"));
        assert!(libs.contains("sklearn"));
        assert_eq!(libs.len(), 2);
    }

    #[test]
    fn test_relative_and_prose_ignored() {
        let libs = libraries("from . import utils\nfrom here we go\nprint('import x')");
        assert!(libs.is_empty());
    }

    #[test]
    fn test_trailing_comment() {
        let libs = libraries("    import uproot  # reads ROOT files");
        assert_eq!(libs.into_iter().collect::<Vec<_>>(), vec!["uproot"]);
    }

    #[test]
    fn test_import_lines() {
        let code = "import awkward as ak\nx = 1\n  from coffea import processor\n";
        assert_eq!(
            import_lines(code),
            vec!["import awkward as ak", "from coffea import processor"]
        );
    }
}

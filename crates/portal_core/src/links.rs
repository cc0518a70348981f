use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::fields::{clean_field, split_quoted};

/// Which columns of the links file hold the link and the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinksLayout {
    pub link_column: usize,
    pub file_name_column: usize,
}

impl Default for LinksLayout {
    fn default() -> Self {
        Self {
            link_column: 1,
            file_name_column: 2,
        }
    }
}

/// Maps lowercased file name to external link.
///
/// Rows with fewer than two fields, or with an empty link or file name, are
/// skipped. A later row for the same file name replaces an earlier one.
pub fn parse_links(text: &str, layout: LinksLayout) -> HashMap<String, String> {
    let mut links = HashMap::new();
    for line in text.lines() {
        let fields = split_quoted(line);
        if fields.len() < 2 {
            continue;
        }
        let link = fields.get(layout.link_column).map(|f| clean_field(f));
        let file_name = fields.get(layout.file_name_column).map(|f| clean_field(f));
        if let (Some(link), Some(file_name)) = (link, file_name) {
            if !link.is_empty() && !file_name.is_empty() {
                links.insert(file_name.to_lowercase(), link.to_string());
            }
        }
    }
    links
}

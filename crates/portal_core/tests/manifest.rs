use portal_core::{build_index, parse_links, LinksLayout, ManifestError, RollKey};
use pretty_assertions::assert_eq;

fn key(text: &str) -> RollKey {
    RollKey::find(text).expect("valid key")
}

#[test]
fn duplicate_keys_keep_first_file() {
    let load = build_index(
        "24BC581 A.pdf\n24BC581 A.pdf\n23XY123 B.pdf",
        None,
        LinksLayout::default(),
    )
    .unwrap();

    assert_eq!(load.index.len(), 2);
    assert!(load.index.contains(&key("24BC581 A")));
    assert!(load.index.contains(&key("23XY123 B")));
    assert_eq!(load.ignored.len(), 1);
    assert_eq!(load.ignored[0].file_name, "24BC581 A.pdf");
    assert_eq!(load.ignored[0].key, key("24BC581 A"));
}

#[test]
fn first_spelling_wins_for_case_variants() {
    let load = build_index(
        "24bc581 a - Old.pdf\n24BC581 A - New.pdf\n",
        None,
        LinksLayout::default(),
    )
    .unwrap();

    let entry = load.index.get(&key("24BC581 A")).unwrap();
    assert_eq!(entry.file_name, "24bc581 a - Old.pdf");
}

#[test]
fn no_matches_is_an_error_not_an_empty_index() {
    for text in ["", "\n\n  \n", "resume.pdf\ncover letter.docx", "24BC581 D.pdf"] {
        let err = build_index(text, None, LinksLayout::default()).unwrap_err();
        assert_eq!(err, ManifestError::NoValidEntries);
    }
}

#[test]
fn unmatched_lines_are_counted() {
    let load = build_index(
        "notes.txt\n24BC581 A.pdf\n\nreadme\n",
        None,
        LinksLayout::default(),
    )
    .unwrap();
    assert_eq!(load.unmatched_lines, 2);
    assert_eq!(load.index.len(), 1);
}

#[test]
fn links_attach_by_lowercased_file_name() {
    let links = "id,link,file\n\
                 1,\"https://drive.example/a?x=1,2\",\"24BC581 A.PDF\"\n\
                 2,https://drive.example/b,23XY123 B.pdf\n";
    let load = build_index(
        "24BC581 A.pdf\n23XY123 B.pdf\n22QQ001 C.pdf",
        Some(links),
        LinksLayout::default(),
    )
    .unwrap();

    assert_eq!(
        load.index.get(&key("24BC581 A")).unwrap().external_link.as_deref(),
        Some("https://drive.example/a?x=1,2")
    );
    assert_eq!(
        load.index.get(&key("23XY123 B")).unwrap().external_link.as_deref(),
        Some("https://drive.example/b")
    );
    assert_eq!(load.index.get(&key("22QQ001 C")).unwrap().external_link, None);
}

#[test]
fn links_skip_short_and_empty_rows() {
    let links = parse_links(
        "only-one-field\n1,,file.pdf\n1,https://x,\n1,https://y,Name.pdf\n",
        LinksLayout::default(),
    );
    assert_eq!(links.len(), 1);
    assert_eq!(links.get("name.pdf").map(String::as_str), Some("https://y"));
}

#[test]
fn links_layout_is_configurable() {
    let layout = LinksLayout {
        link_column: 0,
        file_name_column: 1,
    };
    let links = parse_links("https://z,24BC581 A.pdf", layout);
    assert_eq!(links.get("24bc581 a.pdf").map(String::as_str), Some("https://z"));
}

#[test]
fn entries_iterate_in_key_order_and_filter_ignores_case() {
    let load = build_index(
        "24BC581 A.pdf\n23XY123 B - Jane.pdf\n22QQ001 C.pdf",
        None,
        LinksLayout::default(),
    )
    .unwrap();

    let keys: Vec<_> = load.index.iter().map(|e| e.key.to_string()).collect();
    assert_eq!(keys, vec!["22QQ001 C", "23XY123 B", "24BC581 A"]);

    let by_name: Vec<_> = load.index.filter("jane").map(|e| e.key.to_string()).collect();
    assert_eq!(by_name, vec!["23XY123 B"]);

    let by_key: Vec<_> = load.index.filter("24bc").map(|e| e.key.to_string()).collect();
    assert_eq!(by_key, vec!["24BC581 A"]);

    assert_eq!(load.index.filter("  ").count(), 3);
}

#[test]
fn identical_input_builds_identical_index() {
    let text = "24BC581 A.pdf\n23XY123 B.pdf\n24BC581 A copy.pdf";
    let first = build_index(text, None, LinksLayout::default()).unwrap();
    let second = build_index(text, None, LinksLayout::default()).unwrap();
    assert_eq!(first, second);
}

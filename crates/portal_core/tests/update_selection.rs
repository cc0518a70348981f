use portal_core::{
    build_index, update, AppState, Effect, LinksLayout, ManifestIndex, Msg, RollKey,
    SelectAllState, SelectionMode,
};
use pretty_assertions::assert_eq;

fn index(manifest: &str) -> ManifestIndex {
    build_index(manifest, None, LinksLayout::default())
        .unwrap()
        .index
}

fn key(text: &str) -> RollKey {
    RollKey::find(text).unwrap()
}

fn loaded(manifest: &str) -> AppState {
    let (state, _) = update(AppState::new("a@example.edu"), Msg::ManifestLoaded(index(manifest)));
    state
}

#[test]
fn update_is_noop() {
    let state = AppState::new("a@example.edu");
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn toggling_rows_tracks_selection_and_tri_state() {
    let state = loaded("24BC581 A.pdf\n23XY123 B.pdf");

    let (mut state, _) = update(state, Msg::KeyToggled(key("24BC581 A")));
    assert!(state.consume_dirty());
    let view = state.view();
    assert_eq!(view.selected_count, 1);
    assert_eq!(view.select_all, SelectAllState::Indeterminate);

    let (state, _) = update(state, Msg::KeyToggled(key("23XY123 B")));
    assert_eq!(state.view().select_all, SelectAllState::Checked);

    let (state, _) = update(state, Msg::KeyToggled(key("24BC581 A")));
    let view = state.view();
    assert_eq!(view.selected_count, 1);
    let selected: Vec<_> = view
        .entries
        .iter()
        .filter(|row| row.selected)
        .map(|row| row.key.to_string())
        .collect();
    assert_eq!(selected, vec!["23XY123 B"]);
}

#[test]
fn keys_outside_the_index_cannot_be_selected() {
    let state = loaded("24BC581 A.pdf");
    let (mut state, _) = update(state, Msg::KeyToggled(key("99ZZ999 C")));
    assert_eq!(state.view().selected_count, 0);
    state.consume_dirty();

    let (mut state, _) = update(state, Msg::KeyToggled(key("99ZZ999 C")));
    assert!(!state.consume_dirty());
}

#[test]
fn select_all_only_touches_visible_rows() {
    let state = loaded("24BC581 A - Jane.pdf\n23XY123 B - Ravi.pdf\n22QQ001 C - Jane.pdf");
    let (state, _) = update(state, Msg::SearchChanged("jane".to_string()));
    let view = state.view();
    assert_eq!(view.entries.len(), 2);
    assert_eq!(view.select_all, SelectAllState::Unchecked);

    let (state, _) = update(state, Msg::VisibleSelectionSet(true));
    assert_eq!(state.view().select_all, SelectAllState::Checked);
    assert_eq!(state.view().selected_count, 2);

    let (state, _) = update(state, Msg::SearchChanged(String::new()));
    assert_eq!(state.view().select_all, SelectAllState::Indeterminate);

    let (state, _) = update(state, Msg::VisibleSelectionSet(false));
    assert_eq!(state.view().selected_count, 0);
    assert_eq!(state.view().select_all, SelectAllState::Unchecked);
}

#[test]
fn submit_enabled_follows_mode_and_output_name() {
    let state = loaded("24BC581 A.pdf\n23XY123 B.pdf");
    let (state, _) = update(state, Msg::KeyToggled(key("24BC581 A")));
    assert!(!state.view().submit_enabled);

    let (state, _) = update(state, Msg::OutputNameChanged("Batch".to_string()));
    assert!(state.view().submit_enabled);

    // Paste box is empty, so paste mode has nothing to send.
    let (state, _) = update(state, Msg::ModeChanged(SelectionMode::Paste));
    assert!(!state.view().submit_enabled);

    let (state, _) = update(state, Msg::PasteChanged("23XY123 B".to_string()));
    assert!(state.view().submit_enabled);
    assert_eq!(state.resolved_keys(), vec![key("23XY123 B")]);
}

#[test]
fn paste_counts_feed_the_view() {
    let state = loaded("24BC581 A.pdf");
    let (state, _) = update(
        state,
        Msg::PasteChanged("24bc581 a\n24BC581 A\nbadline\n24BC581 A".to_string()),
    );
    let counts = state.view().validation;
    assert_eq!(counts.valid, 1);
    assert_eq!(counts.duplicates, 1);
    assert_eq!(counts.invalid, 1);
}

#[test]
fn refresh_drops_selections_missing_from_new_index() {
    let state = loaded("24BC581 A.pdf\n23XY123 B.pdf");
    let (state, _) = update(state, Msg::VisibleSelectionSet(true));
    let (state, _) = update(state, Msg::PasteChanged("23XY123 B".to_string()));
    assert_eq!(state.view().selected_count, 2);

    let (state, effects) = update(state, Msg::RefreshRequested);
    assert_eq!(effects, vec![Effect::LoadManifest]);
    let (state, effects) = update(state, Msg::ManifestLoaded(index("24BC581 A.pdf")));
    assert!(effects.is_empty());

    assert_eq!(state.view().selected_count, 1);
    assert_eq!(state.view().manifest_size, 1);
    // Paste results are recomputed against the new index.
    assert_eq!(state.validation().valid_keys.len(), 0);
    assert_eq!(state.validation().not_found_keys.len(), 1);
}

#[test]
fn failed_refresh_keeps_previous_index() {
    let state = loaded("24BC581 A.pdf");
    let (state, _) = update(state, Msg::RefreshRequested);
    let (state, _) = update(
        state,
        Msg::ManifestFailed("manifest is empty".to_string()),
    );
    let view = state.view();
    assert_eq!(view.manifest_error.as_deref(), Some("manifest is empty"));
    assert_eq!(view.manifest_size, 1);
    assert!(!view.manifest_loading);
}

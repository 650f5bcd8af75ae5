use std::sync::Once;

use forum_core::{
    all_commenters, commenter_activity, ranked_by_value, title_word_count, unique_commenters,
    FrequencyTable, PageRecord, ParsedComment,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(forum_logging::initialize_for_tests);
}

fn page(names: &[&str]) -> PageRecord<ParsedComment> {
    PageRecord::from_rows(
        names
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, i * 2, ParsedComment::default())),
    )
}

#[test]
fn ranking_sorts_descending_by_mapped_value() {
    init_logging();
    let ranked = ranked_by_value(vec![(5, "goat"), (10, "cat"), (1, "dog")]);
    assert_eq!(ranked, vec![5, 1, 10]);
}

#[test]
fn ranking_ties_keep_first_seen_order() {
    init_logging();
    let table = FrequencyTable::from_names(["b", "a", "c", "a", "b", "d"]);
    assert_eq!(table.ranked(), vec!["b", "a", "c", "d"]);
}

#[test]
fn frequency_strips_row_suffix_before_counting() {
    init_logging();
    let table = FrequencyTable::from_names(["Seun", "Seun**2", "Mukina2"]);
    assert_eq!(table.count("Seun"), 2);
    assert_eq!(table.count("Mukina2"), 1);
    assert_eq!(table.count("Seun**2"), 0);
    assert_eq!(table.len(), 2);
}

#[test]
fn repeated_commenter_is_kept_under_suffixed_key_and_counted_twice() {
    init_logging();
    let record = page(&["Seun", "Lalasticlala", "Seun"]);

    assert_eq!(
        record.keys().collect::<Vec<_>>(),
        vec!["Seun", "Lalasticlala", "Seun**4"]
    );
    assert!(record.get("Seun").is_some());
    assert!(record.get("Seun**4").is_some());
    assert_eq!(commenter_activity([&record]).count("Seun"), 2);
}

#[test]
fn commenter_lists_span_pages() {
    init_logging();
    let first = page(&["zed", "amy", "zed"]);
    let second = page(&["amy", "bob"]);
    let pages = vec![first, second];

    assert_eq!(
        all_commenters(&pages),
        vec!["amy", "amy", "bob", "zed", "zed"]
    );
    assert_eq!(unique_commenters(&pages), vec!["amy", "bob", "zed"]);
    assert_eq!(commenter_activity(&pages).ranked(), vec!["zed", "amy", "bob"]);
}

#[test]
fn title_words_are_normalized_and_filtered() {
    init_logging();
    let table = title_word_count([
        "The Price of Fuel: What Next?",
        "Fuel scarcity in Lagos (photos)",
        "Lagos - fuel queues",
    ]);
    assert_eq!(table.count("fuel"), 3);
    assert_eq!(table.count("lagos"), 2);
    assert_eq!(table.count("the"), 0);
    assert_eq!(table.count(""), 0);
    assert_eq!(table.ranked()[..2], ["fuel", "lagos"]);
}

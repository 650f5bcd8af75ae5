use std::sync::Mutex;

use forum_core::{commenter_activity, ParsedComment, SiteConfig, StructuralAnomaly};
use forum_engine::{
    parse_topics, BuildError, CommentAudit, PageBuilder, PageContent, RecordMode,
};
use pretty_assertions::assert_eq;

fn name_row(name: &str) -> String {
    format!(
        r#"<tr><td class="bold l pu"><a name="m"></a><a href="/{name}" class="user">{name}</a></td></tr>"#
    )
}

fn comment_row(id: &str, body: &str) -> String {
    format!(r#"<tr><td id="{id}" class="l w pd"><div class="narrow">{body}</div></td></tr>"#)
}

fn post_page(rows: &[String]) -> String {
    format!(
        r#"<html><body><table summary="posts">{}</table></body></html>"#,
        rows.concat()
    )
}

const AD_ROW: &str = r#"<tr><td class="l pu pd">sponsored</td></tr>"#;

#[test]
fn repeated_commenter_gets_row_suffix() {
    let html = post_page(&[
        name_row("Seun"),
        comment_row("c1", "first"),
        name_row("Tunde"),
        comment_row("c2", "second"),
        name_row("Seun"),
        comment_row("c3", "third"),
    ]);

    let (record, anomalies) = PageBuilder::new().build_post(&html).unwrap();

    assert!(anomalies.is_empty());
    assert_eq!(record.keys().collect::<Vec<_>>(), vec!["Seun", "Tunde", "Seun**4"]);
    assert_eq!(record.get("Seun").unwrap().focus_text(), "first");
    assert_eq!(record.get("Seun**4").unwrap().focus_text(), "third");

    let activity = commenter_activity([&record]);
    assert_eq!(activity.count("Seun"), 2);
    assert_eq!(activity.ranked(), vec!["Seun", "Tunde"]);
}

#[test]
fn flagged_rows_are_dropped_before_pairing() {
    let html = post_page(&[
        AD_ROW.to_string(),
        name_row("Ada"),
        comment_row("c1", "hello"),
        AD_ROW.to_string(),
        name_row("Obi"),
        comment_row("c2", "world"),
    ]);

    let (record, anomalies) = PageBuilder::new().build_post(&html).unwrap();

    assert!(anomalies.is_empty());
    assert_eq!(record.keys().collect::<Vec<_>>(), vec!["Ada", "Obi"]);
    assert_eq!(record.get("Obi").unwrap().focus_text(), "world");
}

#[test]
fn unresolved_name_falls_back_to_nobody() {
    let html = post_page(&[
        r#"<tr><td class="bold l pu">guest</td></tr>"#.to_string(),
        comment_row("c1", "who am I"),
    ]);

    let (record, anomalies) = PageBuilder::new().build_post(&html).unwrap();

    assert_eq!(record.get("Nobody").unwrap().focus_text(), "who am I");
    assert_eq!(anomalies, vec![StructuralAnomaly::MissingName { row: 0 }]);
}

#[test]
fn nocopy_variants_are_tried_second() {
    let html = post_page(&[
        r#"<tr><td class="bold l pu nocopy"><a href="/kemi" class="user">Kemi</a></td></tr>"#
            .to_string(),
        r#"<tr><td id="c9" class="l w pd nocopy"><div class="narrow">copied</div></td></tr>"#
            .to_string(),
    ]);

    let (record, anomalies) = PageBuilder::new().build_post(&html).unwrap();

    assert!(anomalies.is_empty());
    assert_eq!(record.get("Kemi").unwrap().focus_text(), "copied");
}

#[test]
fn missing_comment_cell_and_trailing_row_are_reported() {
    let html = post_page(&[
        name_row("Ada"),
        r#"<tr><td class="l w pd"><div class="narrow">no id attribute</div></td></tr>"#
            .to_string(),
        name_row("Obi"),
    ]);

    let (record, anomalies) = PageBuilder::new().build_post(&html).unwrap();

    assert_eq!(record.len(), 1);
    assert_eq!(record.get("Ada"), Some(&ParsedComment::default()));
    assert_eq!(
        anomalies,
        vec![
            StructuralAnomaly::UnpairedRow { row: 2 },
            StructuralAnomaly::MissingComment { row: 0 },
        ]
    );
}

#[test]
fn page_without_post_table_is_an_error() {
    let err = PageBuilder::new().build_post("<p>moved</p>").unwrap_err();
    assert_eq!(err, BuildError::MissingTable("posts"));
}

#[test]
fn building_twice_gives_equal_records() {
    let html = post_page(&[
        name_row("Seun"),
        comment_row("c1", "<blockquote><b>Ada</b>: hi<br>there</blockquote>mine"),
        name_row("Seun"),
        comment_row("c2", "again"),
    ]);
    let builder = PageBuilder::new();
    let site = SiteConfig::default();

    let first = builder.build(&html, RecordMode::Post, &site).unwrap();
    let second = builder.build(&html, RecordMode::Post, &site).unwrap();
    assert_eq!(first, second);
}

#[derive(Default)]
struct RecordingAudit {
    cells: Mutex<Vec<String>>,
}

impl CommentAudit for RecordingAudit {
    fn record(&self, cell_html: &str) {
        self.cells.lock().unwrap().push(cell_html.to_string());
    }
}

#[test]
fn audit_sees_cells_before_quotes_are_removed() {
    let html = post_page(&[
        name_row("Ada"),
        comment_row("c1", "<blockquote><b>Obi</b>: quoted</blockquote>reply"),
    ]);
    let audit = RecordingAudit::default();

    let (record, _) = PageBuilder::with_audit(&audit).build_post(&html).unwrap();

    let cells = audit.cells.lock().unwrap();
    assert_eq!(cells.len(), 1);
    assert!(cells[0].contains("<blockquote>"));
    assert_eq!(record.get("Ada").unwrap().focus_text(), "reply");
}

fn history_name_row(links: &str) -> String {
    format!(r#"<tr><td class="bold l pu">{links} by <a href="/ade" class="user">Ade</a></td></tr>"#)
}

fn history_comment_row(body: &str) -> String {
    format!(r#"<tr><td class="l w pd"><div class="narrow">{body}</div></td></tr>"#)
}

fn history_page(rows: &[String]) -> String {
    format!("<html><body><table>{}</table></body></html>", rows.concat())
}

#[test]
fn history_rows_carry_over_missing_fields() {
    let html = history_page(&[
        history_name_row(
            r#"<a href="/politics">Politics</a> / <a href="/1/fuel">Re: Fuel Scarcity</a>"#,
        ),
        history_comment_row("queues everywhere"),
        history_name_row(r#"<a href="/romance">Romance</a>"#),
        history_comment_row("no topic link"),
        r#"<tr><td class="odd">broken</td></tr>"#.to_string(),
        history_comment_row("no section either"),
    ]);

    let (record, anomalies) = PageBuilder::new().build_history(&html).unwrap();

    let entries: Vec<_> = record
        .iter()
        .map(|(section, entry)| (section, entry.topic.as_str(), entry.comment.focus_text()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("Politics", "Fuel Scarcity", "queues everywhere"),
            ("Romance", "Fuel Scarcity", "no topic link"),
            ("Romance**4", "Fuel Scarcity", "no section either"),
        ]
    );
    assert_eq!(
        anomalies,
        vec![
            StructuralAnomaly::MissingTopic { row: 2 },
            StructuralAnomaly::MissingSection { row: 4 },
            StructuralAnomaly::MissingTopic { row: 4 },
        ]
    );
}

#[test]
fn first_history_row_without_fields_uses_fallbacks() {
    let html = history_page(&[
        r#"<tr><td class="bold l pu">nothing</td></tr>"#.to_string(),
        r#"<tr><td class="l w pd">no narrow div</td></tr>"#.to_string(),
    ]);

    let (record, anomalies) = PageBuilder::new().build_history(&html).unwrap();

    let entry = record.get("Nobody").unwrap();
    assert_eq!(entry.topic, "");
    assert_eq!(entry.comment, ParsedComment::default());
    assert_eq!(anomalies.len(), 3);
}

#[test]
fn section_listing_reads_topics() {
    let html = r#"<html><body>
        <table summary="nav"><tr><td id="x"><b><a href="/nav">Nav</a></b></td></tr></table>
        <table>
          <tr><td id="top1"><b><a href="/100/fuel-scarcity">Fuel Scarcity</a></b>
            <span class="s">by <b>ade</b>. <b>42</b> posts &amp; <b>900</b> views</span></td></tr>
          <tr><td id="top2"><b><a href="/101/no-meta">No Meta</a></b></td></tr>
          <tr><td id="top3"><b><a href="/102/jollof">Jollof Wars</a></b>
            <span class="s">by <b>kemi</b>. <b>7</b> posts</span></td></tr>
        </table></body></html>"#;
    let site = SiteConfig::new("https://forum.example").unwrap();

    let (topics, anomalies) = parse_topics(html, &site).unwrap();

    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0].title, "Fuel Scarcity");
    assert_eq!(topics[0].url, "https://forum.example/100/fuel-scarcity");
    assert_eq!(topics[0].poster, "ade");
    assert_eq!(topics[0].comments, 42);
    assert_eq!(topics[1].poster, "kemi");
    assert_eq!(anomalies, vec![StructuralAnomaly::MalformedTopic { cell: 1 }]);
}

#[test]
fn section_mode_builds_topic_content() {
    let html = r#"<table><tr><td id="t"><b><a href="/5/x">X</a></b>
        <span class="s">by <b>ada</b>. <b>3</b></span></td></tr></table>"#;

    let built = PageBuilder::new()
        .build(html, RecordMode::Topics, &SiteConfig::default())
        .unwrap();

    match built.content {
        PageContent::Topics(topics) => assert_eq!(topics[0].comments, 3),
        other => panic!("unexpected content {other:?}"),
    }
}

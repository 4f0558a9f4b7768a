use blender_collect::{collect_errors, collect_failures, interleave, is_primary_at_offset, merge_facets};
use blender_core::{
    BackendError, BackendInfo, BackendOutcome, BackendResult, BackendSlot, BackendsConfig, BlendConfig, MappingsConfig,
    Record, VocabularyMap, PARTIAL_FAILURE, SOURCES_TOKEN,
};
use serde_json::json;

/// Literal evaluation of the boost rules with signed arithmetic and float ceil.
fn reference(offset: i64, block_size: i64, boost_position: i64, boost_count: i64) -> bool {
    let boost_pos = boost_position - 1;
    let max_boosted = boost_pos + boost_count;
    let max_affected = ((max_boosted as f64 / block_size as f64).ceil() as i64) * block_size + boost_count - 1;
    if offset < boost_pos || boost_count == 0 || offset > max_affected || max_boosted > block_size {
        return (offset / block_size) % 2 == 0;
    }
    if offset >= boost_pos && offset < boost_pos + boost_count {
        return false;
    }
    offset < block_size + boost_count
}

#[test]
fn is_primary_at_offset_matches_reference_on_grid() {
    for block_size in 1..=12usize {
        for boost_position in 1..=14usize {
            for boost_count in 0..=14usize {
                let cfg = BlendConfig::new(block_size, boost_position, boost_count);
                for offset in 0..80usize {
                    let expected =
                        reference(offset as i64, block_size as i64, boost_position as i64, boost_count as i64);
                    assert_eq!(
                        is_primary_at_offset(offset, &cfg),
                        expected,
                        "block_size={block_size} boost_position={boost_position} boost_count={boost_count} offset={offset}"
                    );
                    assert_eq!(is_primary_at_offset(offset, &cfg), is_primary_at_offset(offset, &cfg));
                }
            }
        }
    }
}

fn records(prefix: &str, n: usize) -> BackendResult {
    let recs = (1..=n).map(|i| Record::new(format!("{prefix}{i}"))).collect::<Vec<_>>();
    BackendResult::new(n as u64).with_records(recs)
}

fn backends() -> BackendsConfig {
    BackendsConfig { primary: BackendInfo::new("local").with_label("Local"), secondary: BackendInfo::new("remote") }
}

fn ids(tagged: &[blender_core::TaggedRecord]) -> Vec<String> {
    tagged.iter().map(|t| t.record.id.clone()).collect()
}

#[test]
fn interleave_injects_boosted_secondary_records() {
    let p = records("p", 30);
    let s = records("s", 30);
    let out = interleave(Some(&p), Some(&s), 0, 25, &BlendConfig::new(20, 1, 3), &backends());

    let mut expected = vec!["s1".to_string(), "s2".into(), "s3".into()];
    expected.extend((1..=20).map(|i| format!("p{i}")));
    expected.extend(["s4".to_string(), "s5".into()]);
    assert_eq!(ids(&out), expected);
    assert_eq!(out[0].source, BackendSlot::Secondary);
    assert_eq!(out[0].label.as_deref(), Some("remote"));
    assert_eq!(out[3].label.as_deref(), Some("Local"));
}

#[test]
fn interleave_window_is_a_slice_of_the_full_sequence() {
    let p = records("p", 13);
    let s = records("s", 9);
    let cfg = BlendConfig::new(4, 2, 1);
    let full = ids(&interleave(Some(&p), Some(&s), 0, 100, &cfg, &backends()));
    assert_eq!(full.len(), 22);

    for offset in 0..25 {
        for limit in 0..10 {
            let window = ids(&interleave(Some(&p), Some(&s), offset, limit, &cfg, &backends()));
            let expected_len = if offset < 22 { limit.min(22 - offset) } else { 0 };
            assert_eq!(window.len(), expected_len, "offset={offset} limit={limit}");
            assert_eq!(window, full[offset.min(22)..offset.min(22) + expected_len]);
        }
    }
}

#[test]
fn exhausted_source_is_filled_by_the_other() {
    let p = records("p", 2);
    let s = records("s", 4);
    let out = interleave(Some(&p), Some(&s), 0, 10, &BlendConfig::new(5, 1, 0), &backends());
    assert_eq!(ids(&out), vec!["p1", "p2", "s1", "s2", "s3", "s4"]);

    let only_secondary = interleave(None, Some(&s), 1, 2, &BlendConfig::new(5, 1, 0), &backends());
    assert_eq!(ids(&only_secondary), vec!["s2", "s3"]);
    assert!(only_secondary.iter().all(|t| t.source == BackendSlot::Secondary));

    assert!(interleave(None, None, 0, 10, &BlendConfig::default(), &backends()).is_empty());
}

fn vocabulary() -> VocabularyMap {
    let cfg: MappingsConfig = serde_json::from_value(json!({
        "facets": {
            "online": { "field": "fulltext", "kind": "boolean", "values": { "1": true } },
            "category": { "field": "topic", "kind": "hierarchical" },
            "format": { "field": "type", "values": { "book": "Book", "ebook": "Book", "none": "" } },
            "language": { "field": "lang", "unmapped": "drop", "values": { "fi": "fin" } }
        }
    }))
    .expect("mappings");
    VocabularyMap::from_config(cfg).expect("vocabulary")
}

#[test]
fn boolean_facets_are_coerced_and_unmapped_values_dropped() {
    let primary = BackendOutcome::Succeeded(BackendResult::new(40).with_facet("online", [("true", 2), ("false", 10)]));
    let secondary = BackendOutcome::Succeeded(BackendResult::new(60).with_facet("fulltext", [("1", 7), ("0", 3)]));
    let facets = merge_facets(&primary, &secondary, &vocabulary(), &backends());

    assert_eq!(
        facets["online"],
        vec![("false".to_string(), 10), ("true".to_string(), 9)]
    );
}

#[test]
fn hierarchical_counts_roll_up_to_ancestors() {
    let primary = BackendOutcome::Succeeded(BackendResult::new(1));
    let secondary = BackendOutcome::Succeeded(
        BackendResult::new(9).with_facet("topic", [("2/A/B/C/", 5), ("Physics", 4)]),
    );
    let facets = merge_facets(&primary, &secondary, &vocabulary(), &backends());

    let category = &facets["category"];
    let count = |v: &str| category.iter().find(|(k, _)| k == v).map(|(_, c)| *c);
    assert_eq!(count("2/A/B/C/"), Some(5));
    assert_eq!(count("1/A/B/"), Some(5));
    assert_eq!(count("0/A/"), Some(5));
    assert_eq!(count("0/Physics/"), Some(4));
    assert_eq!(category.len(), 4);
}

#[test]
fn plain_facets_merge_by_mapped_value() {
    let primary = BackendOutcome::Succeeded(
        BackendResult::new(10)
            .with_facet("format", [("Journal", 4), ("Book", 3)])
            .with_facet("author", [("Herbert", 2)]),
    );
    let secondary = BackendOutcome::Succeeded(
        BackendResult::new(20)
            .with_facet("type", [("book", 2), ("ebook", 1), ("video", 6), ("none", 9)])
            .with_facet("lang", [("fi", 3), ("sv", 8)]),
    );
    let facets = merge_facets(&primary, &secondary, &vocabulary(), &backends());

    assert_eq!(
        facets["format"],
        vec![("Book".to_string(), 6), ("video".to_string(), 6), ("Journal".to_string(), 4)]
    );
    assert_eq!(facets["author"], vec![("Herbert".to_string(), 2)]);
    assert_eq!(facets["language"], vec![("fin".to_string(), 3)]);
    assert_eq!(
        facets["blender_backend"],
        vec![("local".to_string(), 10), ("remote".to_string(), 20)]
    );
}

#[test]
fn failed_backend_contributes_zero_to_backend_facet() {
    let primary = BackendOutcome::Succeeded(BackendResult::new(10).with_facet("format", [("Book", 3)]));
    let secondary = BackendOutcome::Failed(BackendError::Unavailable("timeout".into()));
    let facets = merge_facets(&primary, &secondary, &vocabulary(), &backends());
    assert_eq!(facets["format"], vec![("Book".to_string(), 3)]);
    assert_eq!(facets["blender_backend"][1], ("remote".to_string(), 0));
}

fn ok(errors: &[&str]) -> BackendOutcome {
    let mut result = BackendResult::new(1);
    for e in errors {
        result = result.with_error(*e);
    }
    BackendOutcome::Succeeded(result)
}

fn failed() -> BackendOutcome {
    BackendOutcome::Failed(BackendError::Unavailable("connection refused".into()))
}

#[test]
fn one_failed_backend_adds_partial_failure_tag() {
    let tags = collect_errors(&ok(&[]), &failed(), &backends());
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].message, PARTIAL_FAILURE);
    assert_eq!(tags[0].tokens[SOURCES_TOKEN], "remote");
}

#[test]
fn both_failed_adds_no_partial_tag() {
    let tags = collect_errors(&failed(), &failed(), &backends());
    assert!(tags.is_empty());
    let failures = collect_failures(&failed(), &failed());
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].backend, BackendSlot::Primary);
}

#[test]
fn backend_errors_are_labelled_and_deduplicated() {
    let tags = collect_errors(&ok(&["too_many_terms", "too_many_terms"]), &ok(&[]), &backends());
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].message, "too_many_terms");
    assert_eq!(tags[0].details.as_deref(), Some("Local"));
}

#[test]
fn both_reporting_errors_is_a_partial_failure() {
    let tags = collect_errors(&ok(&["a"]), &ok(&["b"]), &backends());
    assert_eq!(tags.len(), 3);
    assert!(tags[2].is_partial_failure());
    assert_eq!(tags[2].tokens[SOURCES_TOKEN], "Local, remote");
}

#[test]
fn disabled_backend_is_not_a_failure() {
    let tags = collect_errors(&ok(&[]), &BackendOutcome::Disabled, &backends());
    assert!(tags.is_empty());
    assert!(collect_failures(&ok(&[]), &BackendOutcome::Disabled).is_empty());
}

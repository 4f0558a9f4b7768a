use std::sync::Arc;

use blender_core::{
    BackendInfo, BackendsConfig, BlendConfig, BlenderSettings, Error, Filter, FilterOperator, MappingsConfig,
    SearchRequest, TranslationPolicy, VocabularyMap,
};
use blender_params::{lucene_escape, ParameterTranslator};
use serde_json::json;

fn vocabulary() -> Arc<VocabularyMap> {
    let cfg: MappingsConfig = serde_json::from_value(json!({
        "facets": {
            "format": {
                "field": "type",
                "values": { "book": "Book", "ebook": "Book", "journal": "Journal" }
            },
            "online": {
                "field": "fulltext",
                "kind": "boolean",
                "values": { "1": true }
            },
            "category": {
                "field": "topic",
                "kind": "hierarchical",
                "values": { "sci": "0/Science/", "phys": "1/Science/Physics/", "art": "0/Art/" }
            },
            "language": { "field": "lang" },
            "building": { "field": "library", "ignore": true },
            "collection": { "field": "coll", "ignore": ["Local"] },
            "peer_reviewed": { "field": "scholarly", "default_value": "any" }
        },
        "handlers": { "AllFields": "all", "Title": "ti" },
        "sorts": { "year": "date_desc" }
    }))
    .expect("mappings");
    Arc::new(VocabularyMap::from_config(cfg).expect("valid vocabulary"))
}

fn backends() -> BackendsConfig {
    BackendsConfig { primary: BackendInfo::new("local"), secondary: BackendInfo::new("remote").with_label("Remote") }
}

fn translator() -> ParameterTranslator {
    ParameterTranslator::new(vocabulary(), backends(), TranslationPolicy::default())
}

fn secondary_strings(t: &ParameterTranslator, req: &SearchRequest) -> Vec<String> {
    let out = t.translate(req).expect("translate");
    out.secondary.filters.iter().map(ToString::to_string).collect()
}

#[test]
fn unmapped_field_is_dropped_from_secondary_only() {
    let req = SearchRequest::new("dune").with_filter("author:\"Herbert, Frank\"");
    let out = translator().translate(&req).expect("translate");

    assert_eq!(out.primary.filters, vec![Filter::new("author", "Herbert, Frank")]);
    assert!(!out.secondary.has_filter_on("author"));
    assert_eq!(out.unsupported_filters, vec![Filter::new("author", "Herbert, Frank")]);
    assert!(out.selection.primary && out.selection.secondary);
}

#[test]
fn mapped_field_with_unknown_value_keeps_the_literal() {
    let req = SearchRequest::new("dune").with_filter("format:Map");
    assert_eq!(
        secondary_strings(&translator(), &req),
        vec!["type:\"Map\"", "scholarly:\"any\""]
    );
}

#[test]
fn several_secondary_values_become_or() {
    let req = SearchRequest::new("dune").with_filter("format:Book");
    let out = translator().translate(&req).expect("translate");
    let type_filters: Vec<&Filter> = out.secondary.filters.iter().filter(|f| f.field == "type").collect();
    assert_eq!(type_filters.len(), 2);
    assert!(type_filters.iter().all(|f| f.operator == FilterOperator::Or));
    assert_eq!(type_filters[0].value, "book");
    assert_eq!(type_filters[1].value, "ebook");
    assert!(out.unsupported_filters.is_empty());
}

#[test]
fn boolean_and_identity_mappings() {
    let req = SearchRequest::new("x").with_filter("online:true").with_filter("language:fin");
    assert_eq!(
        secondary_strings(&translator(), &req),
        vec!["fulltext:\"1\"", "lang:\"fin\"", "scholarly:\"any\""]
    );
}

#[test]
fn hierarchical_filter_selects_lower_levels() {
    let req = SearchRequest::new("x").with_filter("category:0/Science/");
    let out = translator().translate(&req).expect("translate");
    let values: Vec<&str> = out.secondary.filters.iter().filter(|f| f.field == "topic").map(|f| f.value.as_str()).collect();
    assert_eq!(values, vec!["phys", "sci"]);
}

#[test]
fn negation_follows_secondary_capability() {
    let req = SearchRequest::new("x").with_filter("-format:Journal");
    assert_eq!(secondary_strings(&translator(), &req)[0], "-type:\"journal\"");

    let no_negation = TranslationPolicy { supports_negation: false, escape: None };
    let t = ParameterTranslator::new(vocabulary(), backends(), no_negation);
    let out = t.translate(&req).expect("translate");
    assert_eq!(out.secondary.filters[0], Filter::new("type", "journal"));
    assert_eq!(out.primary.filters[0].operator, FilterOperator::Not, "primary keeps the negation");
}

#[test]
fn stripped_negation_still_expands_to_or() {
    let req = SearchRequest::new("x").with_filter("-format:Book");

    let no_negation = TranslationPolicy { supports_negation: false, escape: None };
    let t = ParameterTranslator::new(vocabulary(), backends(), no_negation);
    let out = t.translate(&req).expect("translate");
    let format: Vec<&Filter> = out.secondary.filters.iter().filter(|f| f.field == "type").collect();
    assert_eq!(format.len(), 2);
    assert!(format.iter().all(|f| f.operator == FilterOperator::Or));

    let negated = secondary_strings(&translator(), &req);
    assert_eq!(&negated[..2], &["-type:\"book\"".to_string(), "-type:\"ebook\"".to_string()]);
}

#[test]
fn escape_function_runs_on_every_value() {
    let policy = TranslationPolicy { supports_negation: true, escape: Some(lucene_escape) };
    let t = ParameterTranslator::new(vocabulary(), backends(), policy);
    let req = SearchRequest::new("x").with_filter("language:a:b");
    let out = t.translate(&req).expect("translate");
    assert_eq!(out.secondary.filters[0].value, "a\\:b");
    assert_eq!(out.primary.filters[0].value, "a:b");
}

#[test]
fn ignored_filters_are_not_forwarded_nor_unsupported() {
    let req = SearchRequest::new("x")
        .with_filter("building:Main")
        .with_filter("collection:Local")
        .with_filter("collection:Rare");
    let out = translator().translate(&req).expect("translate");
    assert!(!out.secondary.has_filter_on("library"));
    let coll: Vec<&str> = out.secondary.filters.iter().filter(|f| f.field == "coll").map(|f| f.value.as_str()).collect();
    assert_eq!(coll, vec!["Rare"]);
    assert!(out.unsupported_filters.is_empty());
    assert_eq!(out.primary.filters.len(), 3);
}

#[test]
fn default_value_not_added_when_field_already_filtered() {
    let req = SearchRequest::new("x").with_filter("peer_reviewed:yes");
    assert_eq!(secondary_strings(&translator(), &req), vec!["scholarly:\"yes\""]);
}

#[test]
fn handler_and_sort_are_translated() {
    let req = SearchRequest::new("x").with_handler("Title").with_sort("year");
    let out = translator().translate(&req).expect("translate");
    assert_eq!(out.secondary.handler.as_deref(), Some("ti"));
    assert_eq!(out.secondary.sort.as_deref(), Some("date_desc"));
    assert_eq!(out.primary.handler.as_deref(), Some("Title"));

    let req = SearchRequest::new("x").with_handler("Subject").with_sort("relevance");
    let out = translator().translate(&req).expect("translate");
    assert_eq!(out.secondary.handler.as_deref(), Some("Subject"));
    assert_eq!(out.secondary.sort.as_deref(), Some("relevance"));
}

#[test]
fn backend_pseudo_filter_selects_backends() {
    let t = translator();

    let out = t.translate(&SearchRequest::new("x").with_filter("blender_backend:remote")).expect("translate");
    assert!(!out.selection.primary && out.selection.secondary);
    assert!(!out.primary.has_filter_on("blender_backend"));
    assert!(!out.secondary.has_filter_on("blender_backend"));

    let out = t.translate(&SearchRequest::new("x").with_filter("-blender_backend:\"local\"")).expect("translate");
    assert!(!out.selection.primary && out.selection.secondary);

    let out = t
        .translate(
            &SearchRequest::new("x")
                .with_filter("~blender_backend:local")
                .with_filter("~blender_backend:remote"),
        )
        .expect("translate");
    assert!(out.selection.primary && out.selection.secondary);

    let out = t.translate(&SearchRequest::new("x").with_filter("blender_backend:nowhere")).expect("translate");
    assert!(out.selection.primary && out.selection.secondary, "unknown ids are ignored");
}

#[test]
fn unsupported_filters_can_exclude_the_secondary() {
    let mut settings = BlenderSettings::default();
    settings.vocabulary = vocabulary();
    settings.blending = BlendConfig { exclude_on_unsupported_filters: true, ..BlendConfig::default() };
    let t = ParameterTranslator::from_settings(&settings, TranslationPolicy::default());

    let out = t.translate(&SearchRequest::new("x").with_filter("author:Herbert")).expect("translate");
    assert!(out.selection.primary);
    assert!(!out.selection.secondary);

    let out = t.translate(&SearchRequest::new("x").with_filter("format:Book")).expect("translate");
    assert!(out.selection.secondary);
}

#[test]
fn malformed_filters_reject_the_request() {
    let err = translator().translate(&SearchRequest::new("x").with_filter("format")).unwrap_err();
    assert!(matches!(err, Error::MalformedFilter(_)));
    assert!(translator().translate(&SearchRequest::new("x").with_filter("-:Book")).is_err());
}

//! End-to-end split behaviour against the in-memory surface.
//!
//! Covers tier minimality, pixel identity after kerning compensation,
//! grapheme handling, revert round-trips and masks.

#![allow(clippy::uninlined_format_args)] // Clarity over style in test code

mod common;

use common::{assert_positions_eq, mount, original_positions, unit_positions, visible};
use splittext::{
    Completion, Diagnostic, MaskTier, SplitOptions, SplitReturn, SplitType, Surface, split,
};

// ============================================================================
// Tier minimality
// ============================================================================

#[test]
fn test_lines_only() {
    let (mut surface, p) = mount("<p>Hello brave new world</p>");
    let text = split(
        &mut surface,
        &p,
        SplitOptions::new().split_type("lines".parse().unwrap()),
    )
    .unwrap();
    assert_eq!(text.lines().len(), 1);
    assert!(text.chars().is_empty());
    assert!(text.words().is_empty());
    assert_eq!(surface.text_content(text.lines()[0]), "Hello brave new world");
}

#[test]
fn test_chars_only_keeps_internal_words() {
    let (mut surface, p) = mount("<p>Hi there</p>");
    let text = split(
        &mut surface,
        &p,
        SplitOptions::new().split_type(SplitType::CHARS),
    )
    .unwrap();
    assert_eq!(text.chars().len(), 7);
    assert!(text.words().is_empty());
    assert!(text.lines().is_empty());

    // Two untagged inline-block wrappers separated by a space.
    let children = surface.children(p);
    assert_eq!(children.len(), 3);
    assert_eq!(surface.attribute(&children[0], "class"), None);
    assert_eq!(
        surface.style(&children[0], "display").as_deref(),
        Some("inline-block")
    );
    assert_eq!(surface.text(&children[1]), " ");
}

#[test]
fn test_words_only() {
    let (mut surface, p) = mount("<p>one two three</p>");
    let text = split(
        &mut surface,
        &p,
        SplitOptions::new().split_type(SplitType::WORDS),
    )
    .unwrap();
    assert_eq!(text.words().len(), 3);
    assert!(text.chars().is_empty());
    assert!(text.lines().is_empty());
    assert_eq!(
        surface.attribute(&text.words()[1], "class").as_deref(),
        Some("split-word")
    );
}

#[test]
fn test_custom_classes() {
    let (mut surface, p) = mount("<p>ab</p>");
    let text = split(
        &mut surface,
        &p,
        SplitOptions::new()
            .char_class("c")
            .word_class("w")
            .line_class("l"),
    )
    .unwrap();
    assert_eq!(surface.attribute(&text.chars()[0], "class").as_deref(), Some("c"));
    assert_eq!(surface.attribute(&text.words()[0], "class").as_deref(), Some("w"));
    assert_eq!(surface.attribute(&text.lines()[0], "class").as_deref(), Some("l"));
}

// ============================================================================
// Visual identity
// ============================================================================

#[test]
fn test_kerned_chars_keep_original_positions() {
    let (mut surface, p) = mount("<p>AVATAR Today WAVY</p>");
    let before = original_positions(&surface, p);
    let text = split(&mut surface, &p, SplitOptions::new()).unwrap();
    assert!(text.diagnostics().is_empty());
    assert_positions_eq(&unit_positions(&surface, text.chars()), &before, 0.05);
}

#[test]
fn test_wrapped_paragraph_keeps_original_positions() {
    let (mut surface, p) = mount(
        "<p style=\"width: 150px\">AVATAR Today is a Tuesday \u{2014} well\u{2014}known Yoga</p>",
    );
    let before = original_positions(&surface, p);
    let text = split(&mut surface, &p, SplitOptions::new()).unwrap();
    assert!(text.lines().len() > 1);
    assert_positions_eq(&unit_positions(&surface, text.chars()), &before, 0.05);
}

#[test]
fn test_words_only_keeps_original_positions() {
    let (mut surface, p) = mount("<p style=\"width: 120px\">AVA To Ta Yo PaFa</p>");
    let text_node = surface.text_nodes(&p)[0];
    let word_starts: Vec<(f32, f32)> = [0usize, 4, 7, 10, 13]
        .iter()
        .map(|&i| {
            let r = surface.range_rect(&text_node, i..i + 1);
            (r.left, r.top)
        })
        .collect();
    let text = split(
        &mut surface,
        &p,
        SplitOptions::new().split_type(SplitType::WORDS | SplitType::LINES),
    )
    .unwrap();
    assert_positions_eq(&unit_positions(&surface, text.words()), &word_starts, 0.05);
}

#[test]
fn test_large_type_clusters_lines() {
    let (mut surface, p) = mount(
        "<p style=\"font-size: 96px; width: 300px\">Big bold type</p>",
    );
    let text = split(&mut surface, &p, SplitOptions::new()).unwrap();
    // Each word is wider than half the box, so each sits on its own line.
    assert_eq!(text.lines().len(), 3);
    let tops: Vec<f32> = text
        .lines()
        .iter()
        .map(|l| surface.element_rect(l).top)
        .collect();
    assert!(tops.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn test_inline_styling_is_preserved() {
    let (mut surface, p) = mount("<p>ab <span style=\"font-size: 32px\">cd</span> ef</p>");
    let before = original_positions(&surface, p);
    let lefts: Vec<f32> = before.iter().map(|(left, _)| *left).collect();
    let expected = [0.0, 8.8, 21.6, 39.2, 60.8, 69.6];
    assert!(lefts.iter().zip(&expected).all(|(a, b)| (a - b).abs() < 0.01), "{lefts:?}");

    let text = split(&mut surface, &p, SplitOptions::new()).unwrap();
    assert_positions_eq(&unit_positions(&surface, text.chars()), &before, 0.05);
    assert!(
        text.chars()
            .iter()
            .all(|c| surface.style(c, "margin-left").is_none())
    );
    assert!(surface.inner_markup(&text.chars()[2]).contains("font-size: 32px"));
}

#[test]
fn test_words_only_keeps_inline_elements() {
    let (mut surface, p) = mount("<p>read <a href=\"/docs\">the <em>docs</em></a> now</p>");
    let text = split(
        &mut surface,
        &p,
        SplitOptions::new().split_type(SplitType::WORDS),
    )
    .unwrap();
    let words: Vec<String> = text.words().iter().map(|w| surface.inner_markup(w)).collect();
    assert_eq!(
        words,
        vec![
            "read",
            "<a href=\"/docs\">the</a>",
            "<a href=\"/docs\"><em>docs</em></a>",
            "now",
        ]
    );
}

#[test]
fn test_line_breaks_keep_original_positions() {
    let (mut surface, p) = mount("<p>one two<br>three<br><br>four</p>");
    let before = original_positions(&surface, p);
    let markup = surface.inner_markup(&p);
    assert_eq!(markup, "one two<br>three<br><br>four");

    let mut text = split(&mut surface, &p, SplitOptions::new()).unwrap();
    assert_eq!(text.words().len(), 4);
    assert_eq!(text.lines().len(), 3);
    assert_positions_eq(&unit_positions(&surface, text.chars()), &before, 0.05);
    assert_eq!(
        surface.attribute(&p, "aria-label").as_deref(),
        Some("one two three four")
    );

    text.revert(&mut surface);
    assert_eq!(surface.inner_markup(&p), markup);
}

#[test]
fn test_entities_survive_split_and_revert() {
    let (mut surface, p) = mount("<p>Fish &amp; Chips&nbsp;&lt;3</p>");
    let before = surface.inner_markup(&p);
    let mut text = split(&mut surface, &p, SplitOptions::new()).unwrap();
    let chars: String = text.chars().iter().map(|c| surface.text_content(*c)).collect();
    assert_eq!(chars, "Fish&Chips\u{a0}<3");
    text.revert(&mut surface);
    assert_eq!(surface.inner_markup(&p), before);
}

// ============================================================================
// Graphemes and content
// ============================================================================

#[test]
fn test_family_emoji_is_one_char() {
    let (mut surface, p) = mount("<p>Hello 👨‍👩‍👦 World 🎉✨</p>");
    let text = split(
        &mut surface,
        &p,
        SplitOptions::new().split_type(SplitType::CHARS),
    )
    .unwrap();
    let chars: Vec<String> = text
        .chars()
        .iter()
        .map(|c| surface.text_content(*c))
        .collect();
    assert_eq!(chars.len(), 13);
    assert_eq!(chars[5], "👨‍👩‍👦");
    assert_eq!(chars[11], "🎉");
    assert_eq!(chars[12], "✨");
}

#[test]
fn test_content_is_conserved() {
    let original = "The  quick\tbrown fox\u{2014}jumps over e\u{0301}lan";
    let (mut surface, p) = mount(&format!("<p style=\"width: 160px\">{original}</p>"));
    let text = split(&mut surface, &p, SplitOptions::new()).unwrap();
    let leaves: String = text
        .chars()
        .iter()
        .map(|c| surface.text_content(*c))
        .collect();
    assert_eq!(leaves, visible(original));
    assert_eq!(visible(&surface.text_content(p)), visible(original));
}

#[test]
fn test_dash_continuation_has_no_space() {
    let (mut surface, p) = mount("<p>state\u{2013}of\u{2013}the\u{2013}art</p>");
    let text = split(
        &mut surface,
        &p,
        SplitOptions::new().split_type(SplitType::WORDS),
    )
    .unwrap();
    assert_eq!(text.words().len(), 4);
    assert_eq!(surface.text_content(p), "state\u{2013}of\u{2013}the\u{2013}art");
}

// ============================================================================
// Revert
// ============================================================================

#[test]
fn test_revert_restores_markup_for_every_tier_combination() {
    let markup = "Some <em class=\"x\">emphasised</em> text &amp; AVATAR\u{2014}style";
    for bits in 1..=7u8 {
        let split_type = SplitType::from_bits_truncate(bits);
        let (mut surface, p) = mount(&format!("<p style=\"width: 140px\">{markup}</p>"));
        let before = surface.inner_markup(&p);
        let mut text = split(&mut surface, &p, SplitOptions::new().split_type(split_type)).unwrap();
        assert_ne!(surface.inner_markup(&p), before, "{split_type:?} did not split");
        text.revert(&mut surface);
        assert_eq!(surface.inner_markup(&p), before, "{split_type:?}");
        assert!(text.is_reverted());
        assert!(text.result().is_empty());

        // A second revert is a no-op.
        text.revert(&mut surface);
        assert_eq!(surface.inner_markup(&p), before);
    }
}

#[test]
fn test_ligature_suppression_survives_revert() {
    let (mut surface, p) = mount("<p>office affine</p>");
    let mut text = split(&mut surface, &p, SplitOptions::new()).unwrap();
    text.revert(&mut surface);
    assert_eq!(
        surface.style(&p, "font-variant-ligatures").as_deref(),
        Some("none")
    );
}

#[test]
fn test_revert_on_complete() {
    let (mut surface, p) = mount("<p>Fade me</p>");
    let before = surface.inner_markup(&p);
    let animation = Completion::new();
    let handle = animation.clone();
    let mut text = split(
        &mut surface,
        &p,
        SplitOptions::new()
            .revert_on_complete(true)
            .on_split(move |result| {
                assert_eq!(result.words.len(), 2);
                SplitReturn::Animation(handle.clone())
            }),
    )
    .unwrap();

    text.tick(&mut surface, std::time::Duration::ZERO);
    assert!(!text.is_reverted());

    animation.settle();
    text.tick(&mut surface, std::time::Duration::from_millis(16));
    assert!(text.is_reverted());
    assert_eq!(surface.inner_markup(&p), before);
}

#[test]
fn test_completion_ignored_without_revert_on_complete() {
    let (mut surface, p) = mount("<p>Stay split</p>");
    let mut text = split(
        &mut surface,
        &p,
        SplitOptions::new().on_split(|_| Completion::settled()),
    )
    .unwrap();
    text.tick(&mut surface, std::time::Duration::ZERO);
    assert!(!text.is_reverted());
}

#[test]
fn test_default_completion_waits() {
    let (mut surface, p) = mount("<p>Hold on</p>");
    let signal = Completion::default();
    let mut text = split(
        &mut surface,
        &p,
        SplitOptions::new().auto_revert(signal.clone()),
    )
    .unwrap();
    text.tick(&mut surface, std::time::Duration::ZERO);
    assert!(!text.is_reverted());
    assert_eq!(text.chars().len(), 6);

    signal.settle();
    text.tick(&mut surface, std::time::Duration::ZERO);
    assert!(text.is_reverted());
}

#[test]
fn test_repeated_split_and_revert_frees_nodes() {
    let (mut surface, p) = mount("<p style=\"width: 80px\">AVATAR Today WAVY</p>");
    let baseline = surface.node_count();
    let mut stale = Vec::new();
    for _ in 0..20 {
        let mut text = split(&mut surface, &p, SplitOptions::new()).unwrap();
        stale.extend_from_slice(text.chars());
        text.revert(&mut surface);
        assert_eq!(surface.node_count(), baseline);
    }
    assert!(stale.iter().all(|c| !surface.is_connected(c)));
}

#[test]
fn test_auto_revert_signal() {
    let (mut surface, p) = mount("<p>Group fade</p>");
    let before = surface.inner_markup(&p);
    let a = Completion::new();
    let b = Completion::new();
    let signal = SplitReturn::Group(vec![a.clone(), b.clone()]).normalize().unwrap();
    let mut text = split(&mut surface, &p, SplitOptions::new().auto_revert(signal)).unwrap();

    a.settle();
    text.tick(&mut surface, std::time::Duration::ZERO);
    assert!(!text.is_reverted());
    b.settle();
    text.tick(&mut surface, std::time::Duration::ZERO);
    assert_eq!(surface.inner_markup(&p), before);
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_prop_index() {
    let (mut surface, p) = mount("<p style=\"width: 60px\">ab cd ef</p>");
    let text = split(&mut surface, &p, SplitOptions::new().prop_index(true)).unwrap();
    let char_indices: Vec<String> = text
        .chars()
        .iter()
        .filter_map(|c| surface.style(c, "--char-index"))
        .collect();
    assert_eq!(char_indices, vec!["0", "1", "2", "3", "4", "5"]);
    assert_eq!(surface.style(&text.words()[2], "--word-index").as_deref(), Some("2"));
    let last_line = text.lines().last().unwrap();
    assert_eq!(
        surface.style(last_line, "--line-index"),
        Some((text.lines().len() - 1).to_string())
    );
}

#[test]
fn test_line_mask_wraps_lines() {
    let (mut surface, p) = mount("<p style=\"width: 60px\">ab cd ef</p>");
    let before = original_positions(&surface, p);
    let text = split(&mut surface, &p, SplitOptions::new().mask(MaskTier::Lines)).unwrap();
    let masks = surface.children(p);
    assert_eq!(masks.len(), text.lines().len());
    for (mask, line) in masks.iter().zip(text.lines()) {
        assert_eq!(surface.attribute(mask, "class").as_deref(), Some("split-mask"));
        assert_eq!(surface.style(mask, "overflow").as_deref(), Some("clip"));
        assert_eq!(surface.children(*mask), vec![*line]);
    }
    assert_positions_eq(&unit_positions(&surface, text.chars()), &before, 0.05);
}

#[test]
fn test_char_mask_carries_kerning() {
    let (mut surface, p) = mount("<p>AVAW</p>");
    let before = original_positions(&surface, p);
    let text = split(&mut surface, &p, SplitOptions::new().mask(MaskTier::Chars)).unwrap();
    for c in text.chars() {
        assert_eq!(surface.style(c, "margin-left"), None);
    }
    assert_positions_eq(&unit_positions(&surface, text.chars()), &before, 0.05);
}

#[test]
fn test_kerning_anomaly_is_reported_not_fatal() {
    let (mut surface, p) = mount("<p>AV</p>");
    let text = split(&mut surface, &p, SplitOptions::new().kerning_bound(0.5)).unwrap();
    assert_eq!(text.chars().len(), 2);
    assert!(matches!(
        text.diagnostics(),
        [Diagnostic::MeasurementAnomaly { word: 0, index: 1, .. }]
    ));
}

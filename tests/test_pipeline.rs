//! End-to-end tests for document alignment.

use glyph_anchor::config::{AlignerConfig, CorpusProfile};
use glyph_anchor::glyph::Glyph;
use glyph_anchor::pipeline::DocumentAligner;
use glyph_anchor::structure::TeiDocument;
use proptest::prelude::*;

/// Lay out lines of words, one line per entry, 20 units apart.
fn layout(lines: &[&str], page: u32) -> Vec<Glyph> {
    layout_at(lines, 100.0, page)
}

fn layout_at(lines: &[&str], first_top: f32, page: u32) -> Vec<Glyph> {
    let mut glyphs = Vec::new();
    for (row, line) in lines.iter().enumerate() {
        let top = first_top + row as f32 * 20.0;
        for (col, c) in line.chars().enumerate() {
            let x = 50.0 + col as f32 * 6.0;
            glyphs.push(Glyph::new(c.to_string(), x, top, x + 6.0, top + 10.0, page));
        }
    }
    glyphs
}

/// A one-segment TEI document with one sentence per entry.
fn tei(sentences: &[Vec<String>]) -> String {
    let mut xml = String::from(r#"<TEI><text><body><seg xml:id="g1">"#);
    for (s, words) in sentences.iter().enumerate() {
        xml.push_str(&format!(r#"<s xml:id="s{}">"#, s));
        for (w, word) in words.iter().enumerate() {
            xml.push_str(&format!(r#"<w xml:id="s{}.w{}">{}</w> "#, s, w, word));
        }
        xml.push_str("</s>");
    }
    xml.push_str("</seg></body></text></TEI>");
    xml
}

mod documents {
    use super::*;

    #[test]
    fn test_cyrillic_glyphs_against_latin_reference() {
        let xml = r#"<TEI><text><body><seg xml:id="g1" xml:lang="sr"><s xml:id="s1"><w xml:id="w1">Rade</w> <w xml:id="w2">Pasic</w><pc xml:id="p1">:</pc></s></seg></body></text></TEI>"#;
        let glyphs = layout(&["Раде Пасиц:"], 1);

        let aligner = DocumentAligner::new(CorpusProfile::Yugoslav.create_config()).unwrap();
        let aligned = aligner
            .align_loaded("yu-1", glyphs, TeiDocument::parse(xml).unwrap(), None)
            .unwrap();

        assert_eq!(aligned.summary.leaves_total, 3);
        assert_eq!(aligned.summary.resolved_leaves, 3);
        let out = aligned.annotated_xml().unwrap();
        assert!(out.contains(r#"<w xml:id="w1" fromPage="0" toPage="0" isBroken="false" x0="50" y0="100" x1="74" y1="110">Rade</w>"#));
    }

    #[test]
    fn test_noise_between_words_is_ignored() {
        let sentences = vec![vec!["Hvala".to_string(), "lepa".to_string()]];
        let glyphs = layout(&["Hvala *** lepa"], 1);

        let config = CorpusProfile::Yugoslav.create_config().with_transliteration(false);
        let aligned = DocumentAligner::new(config)
            .unwrap()
            .align_loaded("n", glyphs, TeiDocument::parse(tei(&sentences)).unwrap(), None)
            .unwrap();

        assert_eq!(aligned.summary.glyphs_total, 14);
        assert_eq!(aligned.summary.glyphs_kept, 9);
        assert_eq!(aligned.summary.unresolved_leaves, 0);
    }

    #[test]
    fn test_unresolved_leaves_carry_no_coordinates() {
        let sentences = vec![vec!["jedan".to_string(), "qq".to_string(), "tri".to_string()]];
        let glyphs = layout(&["jedan tri"], 1);

        let aligned = DocumentAligner::new(AlignerConfig::default())
            .unwrap()
            .align_loaded("u", glyphs, TeiDocument::parse(tei(&sentences)).unwrap(), None)
            .unwrap();

        let out = aligned.annotated_xml().unwrap();
        assert!(out.contains(r#"<w xml:id="s0.w1">qq</w>"#));
        assert_eq!(aligned.summary.rejected_by_kind.get("word"), Some(&1));

        let index = aligned.coordinate_index();
        let ids: Vec<&String> = index.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["s0.w0", "s0.w2"]);
    }

    #[test]
    fn test_token_across_pages() {
        let sentences = vec![vec!["kraj".to_string(), "stranice".to_string()]];
        let mut glyphs = layout(&["kraj stra"], 1);
        glyphs.extend(layout_at(&["nice"], 40.0, 2));

        let aligned = DocumentAligner::new(AlignerConfig::default())
            .unwrap()
            .align_loaded("p", glyphs, TeiDocument::parse(tei(&sentences)).unwrap(), None)
            .unwrap();

        let index = aligned.coordinate_index();
        let rects = index.get("s0.w1").unwrap();
        assert_eq!(rects.len(), 2);
        assert_eq!((rects[0].page, rects[1].page), (0, 1));
    }

    #[test]
    fn test_page_header_inside_sentence_is_excised() {
        let words = |s: &str| s.split(' ').map(String::from).collect::<Vec<_>>();
        let sentences = vec![
            words("predlog zakona o budzetu republike srbije za narednu godinu"),
            words("poslanici su nastavili raspravu"),
        ];
        let mut glyphs = layout_at(&["predlog zakona o budzetu republike"], 700.0, 1);
        glyphs.extend(layout_at(&["19450312"], 20.0, 2));
        glyphs.extend(layout_at(
            &["sr6ije za narednu godinu", "poslanici su nastavili raspravu"],
            60.0,
            2,
        ));

        let aligned = DocumentAligner::new(AlignerConfig::default())
            .unwrap()
            .align_loaded("h", glyphs, TeiDocument::parse(tei(&sentences)).unwrap(), None)
            .unwrap();

        assert_eq!(aligned.summary.unresolved_leaves, 0);
        // The header, then the second sentence trailing the widened span.
        assert_eq!(aligned.summary.noise_chars_removed, 8 + 28);

        let tree = &aligned.document.tree;
        for id in tree.leaves() {
            let span = tree.unit(id).coordinates.as_ref().unwrap();
            assert!(!span.is_broken, "{} spans more than one line", tree.unit(id).id);
            assert!(span.corners.iter().all(|c| c.y >= 60.0), "{} touches the header", tree.unit(id).id);
        }

        let index = aligned.coordinate_index();
        let srbije = index.get("s0.w5").unwrap();
        assert_eq!(srbije.len(), 1);
        assert_eq!((srbije[0].page, srbije[0].x0, srbije[0].y0), (1, 50.0, 60.0));
        assert_eq!((srbije[0].x1, srbije[0].y1), (86.0, 70.0));
    }
}

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn sentences() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(word(), 1..6), 1..5)
}

fn render(sentences: &[Vec<String>]) -> Vec<Glyph> {
    let line = sentences
        .iter()
        .flat_map(|s| s.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    layout(&[line.as_str()], 1)
}

proptest! {
    #[test]
    fn prop_resolved_words_follow_document_order(sentences in sentences()) {
        let aligned = DocumentAligner::new(AlignerConfig::default())
            .unwrap()
            .align_loaded("prop", render(&sentences), TeiDocument::parse(tei(&sentences)).unwrap(), None)
            .unwrap();

        let tree = &aligned.document.tree;
        let starts: Vec<f32> = tree
            .leaves()
            .filter_map(|id| tree.unit(id).coordinates.as_ref())
            .map(|span| span.corners[0].x)
            .collect();
        for pair in starts.windows(2) {
            prop_assert!(pair[0] < pair[1], "cursor moved backwards: {:?}", starts);
        }
    }

    #[test]
    fn prop_clean_input_resolves_every_word(sentences in sentences()) {
        let aligned = DocumentAligner::new(AlignerConfig::default())
            .unwrap()
            .align_loaded("prop", render(&sentences), TeiDocument::parse(tei(&sentences)).unwrap(), None)
            .unwrap();
        prop_assert_eq!(aligned.summary.unresolved_leaves, 0);
    }

    #[test]
    fn prop_alignment_is_deterministic(sentences in sentences(), noise in "[#*]{0,3}") {
        let mut glyphs = render(&sentences);
        let mut extra = layout(&[noise.as_str()], 1);
        extra.append(&mut glyphs);

        let aligner = DocumentAligner::new(CorpusProfile::Yugoslav.create_config()).unwrap();
        let first = aligner
            .align_loaded("d", extra.clone(), TeiDocument::parse(tei(&sentences)).unwrap(), None)
            .unwrap();
        let second = aligner
            .align_loaded("d", extra, TeiDocument::parse(tei(&sentences)).unwrap(), None)
            .unwrap();

        prop_assert_eq!(first.annotated_xml().unwrap(), second.annotated_xml().unwrap());
        prop_assert_eq!(first.coordinate_index().to_json().unwrap(), second.coordinate_index().to_json().unwrap());
        prop_assert_eq!(first.summary, second.summary);
    }
}

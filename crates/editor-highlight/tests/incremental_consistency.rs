use editor_highlight::{AnnotatedDocument, HighlightConfig, Span, SpanKind};
use editor_highlight_lang::LanguageRegistry;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

fn config(language: &str, merge_threshold: usize) -> HighlightConfig {
    let registry = LanguageRegistry::with_builtins();
    let definition = registry.by_name(language).unwrap();
    HighlightConfig::for_language(&definition).with_merge_threshold(merge_threshold)
}

/// Main-store spans as `(range, kind)`, with touching same-kind neighbours joined.
fn normalized(spans: &[Span]) -> Vec<(Range<usize>, SpanKind)> {
    let mut out: Vec<(Range<usize>, SpanKind)> = Vec::new();
    for span in spans {
        match out.last_mut() {
            Some((range, kind)) if *kind == span.kind && range.end == span.start => {
                range.end = span.end;
            }
            _ => out.push((span.range(), span.kind)),
        }
    }
    out
}

fn reference(language: &str, text: &str) -> Vec<(Range<usize>, SpanKind)> {
    let mut fresh = AnnotatedDocument::new(text, config(language, 1));
    fresh.parse(0..fresh.len_chars());
    normalized(fresh.engine().main_spans())
}

fn run_random_session(language: &str, seed_text: &str, fragments: &[&str], merge_threshold: usize) {
    let mut rng = StdRng::seed_from_u64(0x5eed ^ merge_threshold as u64);
    let mut doc = AnnotatedDocument::new(seed_text, config(language, merge_threshold));
    doc.ensure_up_to_date(0..doc.len_chars());

    for step in 0..300 {
        let len = doc.len_chars();
        if len > 0 && rng.gen_bool(0.35) {
            let start = rng.gen_range(0..len);
            let end = (start + rng.gen_range(1..=4)).min(len);
            doc.delete(start..end);
        } else {
            let at = rng.gen_range(0..=len);
            let fragment = fragments[rng.gen_range(0..fragments.len())];
            doc.insert(at, fragment);
        }

        // Render a random viewport now and then, so some edits accumulate before a full pass.
        if rng.gen_bool(0.3) && doc.len_chars() > 0 {
            let len = doc.len_chars();
            let start = rng.gen_range(0..len);
            let end = (start + 40).min(len);
            doc.attributes_in_range(start..end, 4);
        }
        if step % 3 != 0 {
            continue;
        }

        doc.ensure_up_to_date(0..doc.len_chars());
        assert!(doc.engine().dirty_ranges().is_empty());
        doc.merge_pending();

        let text = doc.text().to_string();
        assert_eq!(
            normalized(doc.engine().main_spans()),
            reference(language, &text),
            "{language} step {step}, text {text:?}"
        );
    }
}

#[test]
fn test_ruby_incremental_matches_full_parse() {
    let seed = "def a\n  @x = \"s\" # c\n  :sym if 1\nend\n";
    let fragments = [
        "def", "end", "if", "x", "1", "2.5", " ", "\n", "\"", "#", "@a", ":s", "\"q\"",
        "<<EOS", "EOS\n", "=begin\n", "=end\n", "/x/",
    ];
    for threshold in [1, 8, 20_000] {
        run_random_session("ruby", seed, &fragments, threshold);
    }
}

#[test]
fn test_template_incremental_matches_full_parse() {
    let seed = "let a = `x${b}y`;\n/* c */ if (a) { return 1; }\n";
    let fragments = [
        "`", "${", "}", "{", "\"", "'", "/", "//", "/*", "*/", "if", "x", "1", " ", "\n", "\\",
    ];
    for threshold in [1, 8, 20_000] {
        run_random_session("javascript", seed, &fragments, threshold);
    }
}

#[test]
fn test_ini_incremental_matches_full_parse() {
    let seed = "; top\n[core]\nname = \"demo\"\nport = 80 ; p\n";
    let fragments = ["[", "]", "=", ";", "#", "\"", "k", "on", "1", " ", "\n"];
    for threshold in [1, 8, 20_000] {
        run_random_session("ini", seed, &fragments, threshold);
    }
}

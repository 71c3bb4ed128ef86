//! Integration tests for the chapter parser.
//!
//! Worked examples first, then property tests over arbitrary and
//! chapter-shaped input.

use proptest::prelude::*;
use std::collections::HashSet;
use tutor_reader::{
    classify, parse, parse_with, BlockKind, ContentBlock, LineKind, ParsedDocument, ParserConfig,
};

const CHAPTER: &str = "\
LET'S BUILD A COMPILER!
By
Jack W. Crenshaw, Ph.D.

Part I: INTRODUCTION

*****************************************************************
*                                                               *
*                        COPYRIGHT NOTICE                       *
*                                                               *
*****************************************************************

INTRODUCTION

This series of articles is a tutorial on the theory
and practice of developing language parsers and compilers.

THE CRADLE

Every compiler needs some boiler plate.
Here is the input routine:

{ Read New Character From Input Stream }

procedure GetChar;
begin
   Read(Look);
end;

That is all for now.
";

fn kinds(doc: &ParsedDocument, section: usize) -> Vec<BlockKind> {
    doc.sections[section].blocks.iter().map(|b| b.kind).collect()
}

// ── Worked examples ──────────────────────────────────────────────────────────

#[test]
fn two_headings_split_prose_and_code() {
    let doc = parse("TITLE ONE\nHello world.\n\nTITLE TWO\nbegin\n  x := 1;\nend");

    assert_eq!(doc.sections.len(), 2);
    assert_eq!(doc.sections[0].title, "TITLE ONE");
    assert_eq!(doc.sections[0].blocks, vec![ContentBlock::prose("Hello world.")]);
    assert_eq!(doc.sections[1].title, "TITLE TWO");
    assert_eq!(
        doc.sections[1].blocks,
        vec![ContentBlock::code("begin\n  x := 1;\nend")]
    );
}

#[test]
fn no_heading_yields_one_content_section() {
    let text = "just some lowercase words\nand another line\n\nthird paragraph";
    let doc = parse(text);

    assert_eq!(doc.header, "Document");
    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.sections[0].id, "content-0");
    assert_eq!(doc.sections[0].title, "Content");
    assert_eq!(doc.sections[0].blocks, vec![ContentBlock::prose(text)]);
}

#[test]
fn copyright_section_is_dropped_without_using_an_ordinal() {
    let doc = parse("COPYRIGHT NOTICE\nAll rights reserved.\nCHAPTER ONE\nThe story begins.");

    assert_eq!(doc.titles(), vec!["CHAPTER ONE"]);
    assert_eq!(doc.sections[0].id, "chapter-one-0");
}

#[test]
fn single_line_classification() {
    assert_eq!(classify("    x := y + 1;"), LineKind::Code);
    assert_eq!(classify("This is a sentence."), LineKind::Prose);
    assert_ne!(classify("-----"), LineKind::Heading);
    assert_eq!(classify("   "), LineKind::Blank);
}

#[test]
fn chapter_header_sections_and_blocks() {
    let doc = parse(CHAPTER);

    assert_eq!(doc.header, "Part I: INTRODUCTION");
    assert_eq!(doc.titles(), vec!["INTRODUCTION", "THE CRADLE"]);
    assert_eq!(doc.sections[0].id, "introduction-0");
    assert_eq!(doc.sections[1].id, "the-cradle-1");

    assert_eq!(kinds(&doc, 0), vec![BlockKind::Prose]);
    assert_eq!(
        kinds(&doc, 1),
        vec![BlockKind::Prose, BlockKind::Code, BlockKind::Prose]
    );

    let listing = &doc.sections[1].blocks[1].content;
    assert!(listing.starts_with("{ Read New Character From Input Stream }"));
    assert!(listing.ends_with("end;"));
    assert_eq!(doc.sections[1].blocks[2].content, "That is all for now.");
}

#[test]
fn crlf_input_matches_lf_input() {
    let lf = parse(CHAPTER);
    let crlf = parse(&CHAPTER.replace('\n', "\r\n"));
    assert_eq!(lf, crlf);
}

#[test]
fn digits_in_headings_need_a_custom_pattern() {
    let text = "CHAPTER 1\nIt starts here";

    assert_eq!(parse(text).sections[0].id, "content-0");

    let config = ParserConfig::builder()
        .heading_pattern(r"[A-Z0-9\s]*")
        .build()
        .unwrap();
    let doc = parse_with(text, &config);
    assert_eq!(doc.sections[0].id, "chapter-1-0");
    assert_eq!(doc.sections[0].blocks, vec![ContentBlock::prose("It starts here")]);
}

#[test]
fn custom_keywords_replace_the_pascal_list() {
    let config = ParserConfig::builder()
        .code_keywords(["return"])
        .build()
        .unwrap();
    let doc = parse_with("RESULT\nwe return the answer\nthe end is near", &config);

    assert_eq!(
        doc.sections[0].blocks,
        vec![
            ContentBlock::code("we return the answer"),
            ContentBlock::prose("the end is near"),
        ]
    );
}

#[test]
fn default_config_matches_parse() {
    assert_eq!(parse(CHAPTER), parse_with(CHAPTER, &ParserConfig::default()));
}

#[test]
fn text_rendering_reparses_to_the_same_structure() {
    let doc = parse(CHAPTER);
    let again = parse(&doc.to_text());

    assert_eq!(again.header, doc.header);
    assert_eq!(again.titles(), doc.titles());
    for i in 0..doc.sections.len() {
        assert_eq!(kinds(&again, i), kinds(&doc, i));
    }
}

#[test]
fn short_and_bracketed_titles_survive_text_rendering() {
    for text in [
        "*AB*\nsome words here\nNEXT PART\nmore words",
        "* (ABC) *\nsome words here\nNEXT PART\nmore words",
    ] {
        let doc = parse(text);
        let again = parse(&doc.to_text());
        assert_eq!(again.titles(), doc.titles(), "{text:?}");
        assert_eq!(again.sections[0].id, doc.sections[0].id);
    }
}

#[test]
fn json_uses_type_field() {
    let doc = parse("TITLE ONE\nHello world.");
    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["sections"][0]["blocks"][0]["type"], "prose");
    assert_eq!(json["sections"][0]["id"], "title-one-0");
}

// ── Properties ───────────────────────────────────────────────────────────────

fn heading_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z][A-Z ]{2,20}",
        "\\*{1,3} ?[A-Z][A-Z ()-]{2,15} ?\\*{0,3}",
        Just("COPYRIGHT NOTICE".to_string()),
    ]
}

fn body_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z ,]{0,40}",
        "[A-Z][a-z ]{0,30}\\.",
        " {4}[a-z]+ := [0-9]+;",
        "[a-z]+\\([a-z]*\\);",
        "\\{ [A-Za-z ]{0,20} \\}",
        Just(String::new()),
        Just("   ".to_string()),
    ]
}

fn chapter_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![1 => heading_line(), 4 => body_line()],
        0..60,
    )
    .prop_map(|lines| lines.join("\n"))
}

fn check_structure(text: &str) -> Result<(), TestCaseError> {
    let doc = parse(text);

    prop_assert!(!doc.sections.is_empty());

    let ids: HashSet<&str> = doc.sections.iter().map(|s| s.id.as_str()).collect();
    prop_assert_eq!(ids.len(), doc.sections.len());

    for section in &doc.sections {
        prop_assert!(!section.title.to_uppercase().contains("COPYRIGHT"));

        if section.id != "content-0" || !text.trim().is_empty() {
            for block in &section.blocks {
                prop_assert!(!block.content.trim().is_empty());
            }
        }
        for pair in section.blocks.windows(2) {
            prop_assert_ne!(pair[0].kind, pair[1].kind);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn arbitrary_text_keeps_structure(text in "\\PC{0,300}") {
        check_structure(&text)?;
    }

    #[test]
    fn arbitrary_lines_keep_structure(lines in prop::collection::vec("\\PC{0,40}", 0..30)) {
        check_structure(&lines.join("\n"))?;
    }

    #[test]
    fn chapter_shaped_text_keeps_structure(text in chapter_text()) {
        check_structure(&text)?;
    }

    #[test]
    fn ids_carry_consecutive_ordinals(text in chapter_text()) {
        let doc = parse(&text);
        for (i, section) in doc.sections.iter().enumerate() {
            if section.id == "content-0" {
                continue;
            }
            let suffix = format!("-{i}");
            prop_assert!(section.id.ends_with(&suffix), "{} lacks {}", section.id, suffix);
        }
    }

    #[test]
    fn text_rendering_round_trips(text in chapter_text()) {
        let doc = parse(&text);
        let again = parse(&doc.to_text());

        prop_assert_eq!(&again.header, &doc.header);
        prop_assert_eq!(again.titles(), doc.titles());
        for (a, b) in again.sections.iter().zip(&doc.sections) {
            prop_assert_eq!(&a.id, &b.id);
            let kinds_a: Vec<BlockKind> = a.blocks.iter().map(|b| b.kind).collect();
            let kinds_b: Vec<BlockKind> = b.blocks.iter().map(|b| b.kind).collect();
            prop_assert_eq!(kinds_a, kinds_b);
        }
    }

    #[test]
    fn parse_is_deterministic(text in chapter_text()) {
        prop_assert_eq!(parse(&text), parse(&text));
    }
}

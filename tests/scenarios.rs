//! End-to-end scenarios: template in, offenses and corrected template out.
//!
//! Covers the concrete lint/correct cases the engine is specified against
//! plus the cross-cutting invariants: range soundness, pre opacity,
//! idempotent auto-correction and tolerance of stray void closers.

use erb_tidy::{LintConfig, Linter, Offense};

// =============================================================================
// HELPERS
// =============================================================================

fn linter() -> Linter {
    Linter::new(LintConfig::default()).expect("default config is valid")
}

fn lint(template: &str) -> Vec<Offense> {
    linter().run_template("test.html.erb", template)
}

fn autocorrect(template: &str) -> String {
    linter().autocorrect("test.html.erb", template)
}

fn assert_sound(template: &str, offenses: &[Offense]) {
    for offense in offenses {
        assert!(
            offense.location.begin <= offense.location.end
                && offense.location.end <= template.len(),
            "offense outside buffer: {offense:?}"
        );
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn test_s1_valid_template_is_clean() {
    let template = "<div>\n  <span class=\"foo\">bar</span>\n  <%= hello_world %>\n</div>\n";
    let offenses = lint(template);
    assert!(offenses.is_empty(), "{offenses:?}");
    assert_eq!(autocorrect(template), template);
}

#[test]
fn test_s2_over_indented_html_child() {
    let template = "<div>\n   <span class=\"foo\">bar</span>\n</div>\n";
    let offenses = lint(template);
    assert_eq!(offenses.len(), 1, "{offenses:?}");

    let offense = &offenses[0];
    assert_eq!((offense.location.begin, offense.location.end), (6, 9));
    assert_eq!(
        offense.message,
        "Layout/IndentationWidth: Use 2 (not 3) spaces for indentation."
    );
    assert_eq!(offense.severity.to_string(), "convention");

    assert_eq!(
        autocorrect(template),
        "<div>\n  <span class=\"foo\">bar</span>\n</div>\n"
    );
}

#[test]
fn test_s3_over_indented_embedded_block_child() {
    let template = "<div>\n  <% 10.times do |i| %>\n     <%= i %>\n  <% end %>\n</div>\n";
    let offenses = lint(template);
    assert_eq!(offenses.len(), 1, "{offenses:?}");

    let offense = &offenses[0];
    assert_eq!((offense.location.begin, offense.location.end), (32, 35));
    assert_eq!(
        offense.message,
        "Layout/IndentationWidth: Use 2 (not 3) spaces for indentation."
    );

    assert_eq!(
        autocorrect(template),
        "<div>\n  <% 10.times do |i| %>\n    <%= i %>\n  <% end %>\n</div>\n"
    );
}

#[test]
fn test_s4_misaligned_block_end() {
    let template = "<div>\n  <% 10.times do |i| %>\n    <%= i %>\n    <% end %>\n</div>\n";
    let offenses = lint(template);
    assert_eq!(offenses.len(), 2, "{offenses:?}");

    // Analyzer order: indentation width first, then block alignment, even
    // though the alignment offense sits later in the file.
    let width = &offenses[0];
    assert_eq!((width.location.begin, width.location.end), (34, 34));
    assert_eq!(
        width.message,
        "Layout/IndentationWidth: Use 2 (not 0) spaces for indentation."
    );

    let alignment = &offenses[1];
    assert_eq!((alignment.location.begin, alignment.location.end), (47, 56));
    assert_eq!(
        alignment.message,
        "Layout/BlockAlignment: `<% end %>` at 4, 4 is not aligned with \
         `<% 10.times do |i| %>` at 2, 2."
    );

    assert_eq!(
        autocorrect(template),
        "<div>\n  <% 10.times do |i| %>\n    <%= i %>\n  <% end %>\n</div>\n"
    );
}

#[test]
fn test_s5_multi_line_attribute_alignment() {
    let template = "<span>\n  <a class=\"class1 class2\"\n    href=\"foo\"\n    \
                    target=\"_blank\">\n    Link text\n  </a>\n</span>\n";
    let offenses = lint(template);
    assert_eq!(offenses.len(), 2, "{offenses:?}");

    for offense in &offenses {
        assert!(
            offense
                .message
                .starts_with("Layout/ArgumentAlignment: "),
            "{}",
            offense.message
        );
    }
    let href = template.find("href").unwrap();
    let target = template.find("target").unwrap();
    assert_eq!(offenses[0].location.begin, href);
    assert_eq!(offenses[1].location.begin, target);

    // Both attributes move to the column of `class=`.
    assert_eq!(
        autocorrect(template),
        "<span>\n  <a class=\"class1 class2\"\n     href=\"foo\"\n     \
         target=\"_blank\">\n    Link text\n  </a>\n</span>\n"
    );
}

#[test]
fn test_s6_pre_content_is_opaque() {
    let offenses = lint("<pre>\n<%= foo %>\n</pre>\n");
    assert!(offenses.is_empty(), "{offenses:?}");
}

// =============================================================================
// INVARIANTS
// =============================================================================

#[test]
fn test_range_soundness_across_templates() {
    let templates = [
        "<div>\n   <span>x</span>\n</div>\n",
        "<div>\n  <% 3.times do %>\n        y\n      <% end %>\n</div>\n",
        "<ul>\n<li>a</li>\n      <li>b</li>\n</ul>",
        "<br></br><div>\n        x\n</div>",
        "<%= truncated",
        "",
    ];
    for template in templates {
        let offenses = lint(template);
        assert_sound(template, &offenses);
    }
}

#[test]
fn test_pre_opacity_with_bad_indentation_inside() {
    let template = "<div>\n  <pre>\n        foo\n<%= bar %>\n  </pre>\n</div>\n";
    let offenses = lint(template);
    assert!(offenses.is_empty(), "{offenses:?}");
}

#[test]
fn test_offenses_never_point_into_pre() {
    let template = "<div>\n    <pre>\nx\n    </pre>\n</div>\n";
    let offenses = lint(template);
    let pre_begin = template.find("<pre>").unwrap();
    let pre_end = template.find("</pre>").unwrap() + "</pre>".len();
    for offense in &offenses {
        let inside = offense.location.begin < pre_end && offense.location.end > pre_begin;
        assert!(
            !inside || offense.location.end <= pre_begin,
            "offense intersects <pre> subtree: {offense:?}"
        );
    }
}

#[test]
fn test_autocorrect_is_idempotent() {
    let templates = [
        "<div>\n   <span class=\"foo\">bar</span>\n</div>\n",
        "<div>\n  <% 10.times do |i| %>\n     <%= i %>\n  <% end %>\n</div>\n",
        "<div>\n  <% 10.times do |i| %>\n    <%= i %>\n    <% end %>\n</div>\n",
        "<span>\n  <a class=\"class1 class2\"\n    href=\"foo\"\n    \
         target=\"_blank\">\n    Link text\n  </a>\n</span>\n",
    ];
    for template in templates {
        let corrected = autocorrect(template);
        let second_run = lint(&corrected);
        assert!(
            !second_run.iter().any(Offense::correctable),
            "corrected template still has correctable offenses: {template:?} -> {second_run:?}"
        );
        assert_eq!(
            autocorrect(&corrected),
            corrected,
            "second correction changed the buffer"
        );
    }
}

#[test]
fn test_stray_void_closers_do_not_change_offenses() {
    let with_stray = "<div>\n    <span>x</span>\n</div>\n</br>\n";
    let without = "<div>\n    <span>x</span>\n</div>\n";
    let a = lint(with_stray);
    let b = lint(without);
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.location, y.location);
        assert_eq!(x.message, y.message);
    }
}

#[test]
fn test_embedded_if_else_end_alignment() {
    let template = "<div>\n  <% if a %>\n    x\n    <% else %>\n    y\n  <% end %>\n</div>\n";
    let offenses = lint(template);
    assert!(
        offenses
            .iter()
            .any(|o| o.message.starts_with("Layout/ElseAlignment: ")),
        "{offenses:?}"
    );
    let corrected = autocorrect(template);
    assert!(
        corrected.contains("\n  <% else %>\n"),
        "else must realign with if: {corrected:?}"
    );
}

#[test]
fn test_comment_on_its_own_line_is_diagnosed() {
    let template = "<div>\n      <%# note %>\n</div>\n";
    let offenses = lint(template);
    assert_eq!(offenses.len(), 1, "{offenses:?}");
    assert!(offenses[0]
        .message
        .starts_with("Layout/IndentationWidth: "));
}

#[test]
fn test_multiline_begin_end_chunk() {
    let template = "<div>\n  <%\n      foo\n  %>\n</div>\n";
    let offenses = lint(template);
    assert_eq!(offenses.len(), 1, "{offenses:?}");
    assert_eq!(
        offenses[0].message,
        "Layout/IndentationWidth: Use 2 (not 4) spaces for indentation."
    );
    assert_eq!(autocorrect(template), "<div>\n  <%\n    foo\n  %>\n</div>\n");
}

#[test]
fn test_with_block_chunk_skips_inner_indentation() {
    // A chunk that begins on its own line and ends opening a block is not
    // indentation-checked itself, but its block children are.
    let template = "<div>\n  <%\n        items.each do |item|\n  %>\n      <%= item %>\n  <% end %>\n</div>\n";
    let offenses = lint(template);
    assert_eq!(offenses.len(), 1, "{offenses:?}");
    assert!(offenses[0]
        .message
        .starts_with("Layout/IndentationWidth: "));
}

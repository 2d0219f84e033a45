//! Reversible structural formatting for storage-format markup.
//!
//! The remote system persists page bodies as compact XHTML-like markup with
//! no whitespace between tags, which diffs as a single unreadable line. This
//! module makes the body line-oriented for the local cache:
//!
//! - [`expand`] inserts newline/indent whitespace between block-level tags
//! - [`collapse`] removes exactly that whitespace before re-upload
//!
//! # Round-trip contract
//!
//! For every body the remote system produces, `collapse(expand(m)) == m`.
//! The contract is enforced structurally: both directions are derived from a
//! single table of boundary rules. Each rule names a left tag pattern, a
//! right tag pattern, and the literal whitespace inserted between them, so an
//! unpaired rewrite cannot be expressed. Rules are applied in table order on
//! expand and in reverse table order on collapse.
//!
//! # Safety
//!
//! Every pattern is anchored on a `>`-to-`<` tag boundary, so text content is
//! never touched. Tag matching uses `[^>]*` for attributes; a pathological
//! attribute containing a literal `>` simply fails to match and the boundary
//! is left unchanged rather than guessed at. Markup the rules do not
//! recognize (nested tables, lists inside list items) stays inline, which is
//! ugly but lossless.

use std::sync::LazyLock;

use regex::Regex;

/// One tag-boundary rewrite rule.
///
/// `expand` turns `{left}{right}` into `{left}{gap}{right}`; the paired
/// inverse is derived from the same three fields.
struct BoundaryRule {
    name: &'static str,
    /// Pattern for the tag ending at the boundary.
    left: &'static str,
    /// Pattern for the tag beginning at the boundary.
    right: &'static str,
    /// Literal whitespace inserted between them.
    gap: &'static str,
}

/// The rule table, in expand application order.
///
/// Table rules come first (most deeply indented), then lists, then the
/// generic block-sibling separator. Indentation is fixed per boundary kind
/// rather than tracked per nesting depth; an unusual structure (a table with
/// no `<tbody>`) indents oddly but still collapses exactly.
const RULES: &[BoundaryRule] = &[
    BoundaryRule {
        name: "table-open",
        left: r"<table[^>]*>",
        right: r"<t(?:head|body|r)[ >]",
        gap: "\n  ",
    },
    BoundaryRule {
        name: "section-open",
        left: r"<t(?:head|body)[^>]*>",
        right: r"<tr[ >]",
        gap: "\n    ",
    },
    BoundaryRule {
        name: "row-open",
        left: r"<tr[^>]*>",
        right: r"<t[dh][ >]",
        gap: "\n      ",
    },
    BoundaryRule {
        name: "cell-gap",
        left: r"</t[dh]>",
        right: r"<t[dh][ >]",
        gap: "\n      ",
    },
    BoundaryRule {
        name: "row-close",
        left: r"</t[dh]>",
        right: r"</tr>",
        gap: "\n    ",
    },
    BoundaryRule {
        name: "row-gap",
        left: r"</tr>",
        right: r"<tr[ >]",
        gap: "\n    ",
    },
    BoundaryRule {
        name: "section-close",
        left: r"</tr>",
        right: r"</t(?:head|body)>",
        gap: "\n  ",
    },
    BoundaryRule {
        name: "section-gap",
        left: r"</thead>",
        right: r"<tbody[ >]",
        gap: "\n  ",
    },
    BoundaryRule {
        name: "table-close",
        left: r"</t(?:head|body)>",
        right: r"</table>",
        gap: "\n",
    },
    BoundaryRule {
        name: "bare-table-close",
        left: r"</tr>",
        right: r"</table>",
        gap: "\n",
    },
    BoundaryRule {
        name: "list-open",
        left: r"<(?:ul|ol)[^>]*>",
        right: r"<li[ >]",
        gap: "\n  ",
    },
    BoundaryRule {
        name: "item-gap",
        left: r"</li>",
        right: r"<li[ >]",
        gap: "\n  ",
    },
    BoundaryRule {
        name: "list-close",
        left: r"</li>",
        right: r"</(?:ul|ol)>",
        gap: "\n",
    },
    BoundaryRule {
        name: "block-gap",
        left: r"</(?:p|h[1-6]|ul|ol|table|blockquote)>",
        right: r"<(?:p|h[1-6]|ul|ol|table|blockquote)[ >]",
        gap: "\n",
    },
];

struct CompiledRule {
    expand: Regex,
    expand_with: String,
    collapse: Regex,
}

static COMPILED: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|rule| CompiledRule {
            expand: Regex::new(&format!("(?P<l>{})(?P<r>{})", rule.left, rule.right))
                .expect("static rule pattern"),
            expand_with: format!("${{l}}{}${{r}}", rule.gap),
            collapse: Regex::new(&format!(
                "(?P<l>{}){}(?P<r>{})",
                rule.left,
                regex::escape(rule.gap),
                rule.right
            ))
            .expect("static rule pattern"),
        })
        .collect()
});

/// Expand compact storage-format markup into the line-oriented form stored
/// in the local cache.
///
/// Whitespace is inserted only between tags, never inside element text, and
/// attribute values and child ordering are untouched.
#[must_use]
pub fn expand(storage: &str) -> String {
    let mut text = storage.to_string();
    for rule in COMPILED.iter() {
        text = rule
            .expand
            .replace_all(&text, rule.expand_with.as_str())
            .into_owned();
    }
    text
}

/// Collapse expanded markup back to the compact form the remote expects.
///
/// Removes exactly the whitespace [`expand`] is known to have inserted,
/// anchored on the same tag boundaries, in reverse rule order.
#[must_use]
pub fn collapse(formatted: &str) -> String {
    let mut text = formatted.to_string();
    for rule in COMPILED.iter().rev() {
        text = rule.collapse.replace_all(&text, "${l}${r}").into_owned();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_names_unique() {
        let mut names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }

    #[test]
    fn test_plain_paragraph_untouched() {
        assert_eq!(expand("<p>Hello</p>"), "<p>Hello</p>");
        assert_eq!(collapse("<p>Hello</p>"), "<p>Hello</p>");
    }

    #[test]
    fn test_sibling_paragraphs_split() {
        let compact = "<p>one</p><p>two</p><h2>head</h2>";
        let expanded = expand(compact);
        assert_eq!(expanded, "<p>one</p>\n<p>two</p>\n<h2>head</h2>");
        assert_eq!(collapse(&expanded), compact);
    }

    #[test]
    fn test_table_expansion_shape() {
        let compact = "<table><tbody><tr><td>a</td><td>b</td></tr></tbody></table>";
        let expanded = expand(compact);
        assert_eq!(
            expanded,
            "<table>\n  <tbody>\n    <tr>\n      <td>a</td>\n      <td>b</td>\n    </tr>\n  </tbody>\n</table>"
        );
        assert_eq!(collapse(&expanded), compact);
    }

    #[test]
    fn test_table_with_header_section() {
        let compact = "<table><thead><tr><th>h</th></tr></thead><tbody><tr><td>v</td></tr></tbody></table>";
        assert_eq!(collapse(&expand(compact)), compact);
        assert!(expand(compact).contains("</thead>\n  <tbody>"));
    }

    #[test]
    fn test_list_expansion() {
        let compact = "<ul><li>first</li><li>second</li></ul><p>after</p>";
        let expanded = expand(compact);
        assert_eq!(
            expanded,
            "<ul>\n  <li>first</li>\n  <li>second</li>\n</ul>\n<p>after</p>"
        );
        assert_eq!(collapse(&expanded), compact);
    }

    #[test]
    fn test_attributes_preserved() {
        let compact = r#"<table class="wrapped"><tbody><tr><td colspan="2">x</td></tr></tbody></table>"#;
        let expanded = expand(compact);
        assert!(expanded.contains(r#"<table class="wrapped">"#));
        assert!(expanded.contains(r#"<td colspan="2">"#));
        assert_eq!(collapse(&expanded), compact);
    }

    #[test]
    fn test_text_content_never_touched() {
        // Newlines already inside element text must survive both directions.
        let compact = "<p>line one\nline two</p><p>next</p>";
        let expanded = expand(compact);
        assert!(expanded.starts_with("<p>line one\nline two</p>\n<p>"));
        assert_eq!(collapse(&expanded), compact);
    }

    #[test]
    fn test_embedded_gt_in_attribute_left_alone() {
        // `[^>]*` cannot see past the embedded `>`, so no boundary is
        // recognized and the markup passes through unchanged.
        let compact = r#"<table data-title="a>b"><tbody><tr><td>x</td></tr></tbody></table>"#;
        let expanded = expand(compact);
        assert!(expanded.starts_with(r#"<table data-title="a>b"><tbody>"#));
        assert_eq!(collapse(&expanded), compact);
    }

    #[test]
    fn test_nested_table_stays_inline_but_round_trips() {
        let compact =
            "<table><tbody><tr><td><table><tbody><tr><td>inner</td></tr></tbody></table></td></tr></tbody></table>";
        assert_eq!(collapse(&expand(compact)), compact);
    }

    mod round_trip {
        use super::*;
        use proptest::prelude::*;

        /// Inline text that the upstream system could place inside an
        /// element: no raw angle brackets (those arrive entity-escaped).
        fn text_strategy() -> impl Strategy<Value = String> {
            prop::string::string_regex("[A-Za-z0-9 .,;:!?'=&_-]{0,24}").expect("valid regex")
        }

        fn paragraph_strategy() -> impl Strategy<Value = String> {
            text_strategy().prop_map(|t| format!("<p>{t}</p>"))
        }

        fn heading_strategy() -> impl Strategy<Value = String> {
            (1..=6u8, text_strategy()).prop_map(|(level, t)| format!("<h{level}>{t}</h{level}>"))
        }

        fn list_strategy() -> impl Strategy<Value = String> {
            (
                prop::bool::ANY,
                prop::collection::vec(text_strategy(), 1..4),
            )
                .prop_map(|(ordered, items)| {
                    let tag = if ordered { "ol" } else { "ul" };
                    let body: String =
                        items.iter().map(|i| format!("<li>{i}</li>")).collect();
                    format!("<{tag}>{body}</{tag}>")
                })
        }

        fn table_strategy() -> impl Strategy<Value = String> {
            prop::collection::vec(prop::collection::vec(text_strategy(), 1..4), 1..4).prop_map(
                |rows| {
                    let body: String = rows
                        .iter()
                        .map(|cells| {
                            let row: String =
                                cells.iter().map(|c| format!("<td>{c}</td>")).collect();
                            format!("<tr>{row}</tr>")
                        })
                        .collect();
                    format!("<table><tbody>{body}</tbody></table>")
                },
            )
        }

        fn block_strategy() -> impl Strategy<Value = String> {
            prop_oneof![
                paragraph_strategy(),
                heading_strategy(),
                list_strategy(),
                table_strategy(),
            ]
        }

        proptest! {
            #[test]
            fn collapse_inverts_expand(blocks in prop::collection::vec(block_strategy(), 0..8)) {
                let compact: String = blocks.concat();
                let expanded = expand(&compact);
                prop_assert_eq!(collapse(&expanded), compact);
            }

            #[test]
            fn expand_only_inserts_whitespace(blocks in prop::collection::vec(block_strategy(), 1..6)) {
                let compact: String = blocks.concat();
                let expanded = expand(&compact);
                let stripped: String = expanded.chars().filter(|c| !c.is_whitespace()).collect();
                let original: String = compact.chars().filter(|c| !c.is_whitespace()).collect();
                prop_assert_eq!(stripped, original);
            }
        }
    }
}

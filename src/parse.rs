use crate::element::Element;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Subtrees that are never carried over from a source.
const BLOCKED_ELEMENTS: [&str; 2] = ["script", "foreignObject"];

/// Deepest element nesting accepted from a source.
pub const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedSource {
    #[error("the icon source is empty")]
    Empty,
    #[error("the icon source is not well-formed markup: {0}")]
    Xml(String),
    #[error("the icon source must have a single <svg> root element, found <{0}>")]
    NotSvg(String),
    #[error("the icon source nests elements deeper than {} levels", MAX_NESTING_DEPTH)]
    TooDeep,
}

/// Parses SVG markup into a detached, sanitized [Element].
///
/// The input must consist of exactly one root element, and that element must be `svg`
/// (either without a namespace or in the SVG namespace).
/// Scripts, `foreignObject` content, event handler attributes and `javascript:` links are
/// stripped on the way in; comments and processing instructions are dropped.
pub fn parse(svg_text: &str) -> Result<Element, MalformedSource> {
    if svg_text.trim().is_empty() {
        return Err(MalformedSource::Empty);
    }

    // the tree is built recursively, both here and inside roxmltree
    if exceeds_depth(svg_text, MAX_NESTING_DEPTH) {
        return Err(MalformedSource::TooDeep);
    }

    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(svg_text, options)
        .map_err(|e| MalformedSource::Xml(e.to_string()))?;

    let root = document.root_element();
    let tag = root.tag_name();
    let is_svg_namespace = matches!(tag.namespace(), None | Some(SVG_NAMESPACE));

    if tag.name() != "svg" || !is_svg_namespace {
        return Err(MalformedSource::NotSvg(qualified_name(
            root,
            tag.namespace(),
            tag.name(),
        )));
    }

    Ok(convert(root))
}

fn convert(node: roxmltree::Node) -> Element {
    let tag = node.tag_name();
    let mut element = Element::new(qualified_name(node, tag.namespace(), tag.name()));

    // namespace declarations first, so serialized subtrees stay self-describing
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    for ns in node.namespaces() {
        if ns.name() == Some("xml") || inherited.contains(&(ns.name(), ns.uri())) {
            continue;
        }

        match ns.name() {
            Some(prefix) => element.set_attribute(format!("xmlns:{prefix}"), ns.uri()),
            None => element.set_attribute("xmlns", ns.uri()),
        }
    }

    for attr in node.attributes() {
        if !is_safe_attribute(attr.name(), attr.value()) {
            continue;
        }

        element.set_attribute(
            qualified_name(node, attr.namespace(), attr.name()),
            attr.value(),
        );
    }

    for child in node.children() {
        if child.is_element() {
            if BLOCKED_ELEMENTS.contains(&child.tag_name().name()) {
                continue;
            }

            element.push_child(convert(child));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.push_text(text);
            }
        }
    }

    element
}

/// Counts open elements without parsing. Malformed input is left for the real parser to report.
fn exceeds_depth(text: &str, limit: usize) -> bool {
    let mut depth = 0usize;
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        rest = &rest[start + 1..];

        let skip_past = if rest.starts_with('/') {
            depth = depth.saturating_sub(1);
            ">"
        } else if rest.starts_with("!--") {
            "-->"
        } else if rest.starts_with("![CDATA[") {
            "]]>"
        } else if rest.starts_with('?') {
            "?>"
        } else if rest.starts_with('!') {
            // doctype and its declarations; nested markup is stepped over one '<' at a time
            continue;
        } else {
            let Some(end) = tag_end(rest) else {
                return false;
            };
            if !rest[..end].ends_with('/') {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            rest = &rest[end + 1..];
            continue;
        };

        match rest.find(skip_past) {
            Some(end) => rest = &rest[end + skip_past.len()..],
            None => return false,
        }
    }

    false
}

/// Byte offset of the `>` closing a start tag, skipping over quoted attribute values.
fn tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;

    for (idx, c) in tag.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(open), _) if open == c => quote = None,
            (None, '>') => return Some(idx),
            _ => {}
        }
    }

    None
}

fn qualified_name(node: roxmltree::Node, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_owned(),
    }
}

fn is_safe_attribute(local_name: &str, value: &str) -> bool {
    let handler_prefix = local_name.get(..2);
    if local_name.len() > 2 && handler_prefix.is_some_and(|p| p.eq_ignore_ascii_case("on")) {
        return false;
    }

    if local_name == "href" {
        // browsers ignore embedded whitespace and control characters in the scheme
        let scheme: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .take("javascript:".len())
            .collect();

        return !scheme.eq_ignore_ascii_case("javascript:");
    }

    true
}

#[cfg(test)]
mod test {
    use crate::element::Node;
    use crate::parse::{MalformedSource, parse};
    use std::error::Error;

    #[test]
    fn parses_a_plain_svg() -> Result<(), Box<dyn Error>> {
        let svg = parse(r#"<svg viewBox="0 0 24 24"><rect width="24" height="24"/></svg>"#)?;

        assert_eq!(svg.name(), "svg");
        assert_eq!(svg.attribute("viewBox"), Some("0 0 24 24"));

        let rect = svg.child_elements().next().unwrap();
        assert_eq!(rect.name(), "rect");
        assert_eq!(rect.attribute("width"), Some("24"));

        Ok(())
    }

    #[test]
    fn keeps_namespace_declarations_and_prefixes() -> Result<(), Box<dyn Error>> {
        let svg = parse(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
                <use xlink:href="#home"/>
            </svg>"##,
        )?;

        assert_eq!(svg.attribute("xmlns"), Some("http://www.w3.org/2000/svg"));
        assert_eq!(
            svg.attribute("xmlns:xlink"),
            Some("http://www.w3.org/1999/xlink")
        );

        let use_el = svg.child_elements().next().unwrap();
        assert_eq!(use_el.attribute("xlink:href"), Some("#home"));
        // inherited declarations are not repeated on children
        assert_eq!(use_el.attribute("xmlns"), None);

        Ok(())
    }

    fn nested(depth: usize) -> String {
        format!("<svg>{}{}</svg>", "<g>".repeat(depth), "</g>".repeat(depth))
    }

    #[test]
    fn rejects_deeply_nested_sources() {
        assert_eq!(parse(&nested(600)), Err(MalformedSource::TooDeep));
        assert_eq!(parse(&nested(100_000)), Err(MalformedSource::TooDeep));
    }

    #[test]
    fn nesting_limit_counts_only_open_elements() -> Result<(), Box<dyn Error>> {
        // the root plus 255 groups sits exactly at the limit
        assert!(parse(&nested(255)).is_ok());
        assert_eq!(parse(&nested(256)), Err(MalformedSource::TooDeep));

        // siblings, self-closing tags, comments and quoted `>` do not add depth
        let wide = format!(
            r#"<svg>{}<!-- {} --><g data-x="a>b/"></g></svg>"#,
            "<path d=\"M0 0\"/>".repeat(1000),
            "<g>".repeat(1000),
        );
        let svg = parse(&wide)?;
        assert_eq!(svg.child_elements().count(), 1001);

        Ok(())
    }

    #[test]
    fn rejects_non_svg_root() {
        assert_eq!(
            parse("<div></div>"),
            Err(MalformedSource::NotSvg("div".into()))
        );
    }

    #[test]
    fn rejects_svg_in_a_foreign_namespace() {
        let result = parse(r#"<svg xmlns="urn:not-svg"/>"#);
        assert!(matches!(result, Err(MalformedSource::NotSvg(_))));
    }

    #[test]
    fn rejects_multiple_roots() {
        let result = parse("<svg></svg><svg></svg>");
        assert!(matches!(result, Err(MalformedSource::Xml(_))));
    }

    #[test]
    fn rejects_empty_and_broken_input() {
        assert_eq!(parse(""), Err(MalformedSource::Empty));
        assert_eq!(parse("   \n"), Err(MalformedSource::Empty));
        assert!(matches!(parse("<svg><g></svg>"), Err(MalformedSource::Xml(_))));
        assert!(matches!(parse("just text"), Err(MalformedSource::Xml(_))));
    }

    #[test]
    fn strips_scripts_and_handlers() -> Result<(), Box<dyn Error>> {
        let svg = parse(
            r#"<svg onload="alert(1)" width="24">
                <script>alert(2)</script>
                <foreignObject><div/></foreignObject>
                <a href=" java&#x09;script:alert(3)"><circle r="4" onclick="x()"/></a>
                <a href="/docs"/>
            </svg>"#,
        )?;

        assert_eq!(svg.attribute("onload"), None);
        assert_eq!(svg.attribute("width"), Some("24"));

        let names: Vec<_> = svg.child_elements().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "a"]);

        let mut links = svg.child_elements();
        let unsafe_link = links.next().unwrap();
        assert_eq!(unsafe_link.attribute("href"), None);
        let circle = unsafe_link.child_elements().next().unwrap();
        assert_eq!(circle.attribute("onclick"), None);
        assert_eq!(circle.attribute("r"), Some("4"));

        assert_eq!(links.next().unwrap().attribute("href"), Some("/docs"));

        Ok(())
    }

    #[test]
    fn keeps_text_and_drops_comments() -> Result<(), Box<dyn Error>> {
        let svg = parse("<svg><!-- generated --><title>Gear &amp; cog</title></svg>")?;

        assert_eq!(svg.children().len(), 1);
        assert!(matches!(svg.children()[0], Node::Element(_)));
        assert_eq!(svg.text_content(), "Gear & cog");

        Ok(())
    }

    #[test]
    fn accepts_prolog_and_doctype() -> Result<(), Box<dyn Error>> {
        let svg = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg viewBox="0 0 16 16"/>"#,
        )?;

        assert_eq!(svg.attribute("viewBox"), Some("0 0 16 16"));
        Ok(())
    }

    #[test]
    fn serialized_output_parses_to_the_same_tree() -> Result<(), Box<dyn Error>> {
        let svg = parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><g id="a"><path d="M0 0h24"/></g><text>1 &lt; 2</text></svg>"#,
        )?;

        assert_eq!(parse(&svg.to_string())?, svg);
        Ok(())
    }
}

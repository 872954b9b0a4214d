//! End-to-end documents through lexing and parsing, checked against the tree
//! handed to renderers.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sugarml_parser::{parse_source, Error, Node, Options, Tag};

fn parse(source: &str) -> Vec<Node> {
    parse_source(source, &Options::default()).unwrap()
}

fn to_json(source: &str) -> Value {
    serde_json::to_value(parse(source)).unwrap()
}

fn tag(node: &Node) -> &Tag {
    node.as_tag().expect("expected a tag")
}

#[test]
fn basic_page() {
    let source = "\
doctype html
html
  head
    title Hello
  body
    // main content
    h1.title Hello
    p
      | Some text
      strong bold
";
    let nodes = parse(source);
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].content(), Some("<!DOCTYPE html>"));

    let html = tag(&nodes[1]);
    let children: Vec<&str> = html.content.iter().map(|n| tag(n).name.as_str()).collect();
    assert_eq!(children, vec!["head", "body"]);

    let body = tag(&html.content[1]);
    assert_eq!(body.content.len(), 3);
    assert_eq!(body.content[0].content(), Some("main content"));
    let h1 = tag(&body.content[1]);
    assert_eq!(h1.attr_text("class").as_deref(), Some("title"));
    let p = tag(&body.content[2]);
    assert_eq!(p.content.len(), 2);
    assert_eq!(tag(&p.content[1]).name, "strong");
}

#[test]
fn serialized_tree_shape() {
    assert_eq!(
        to_json("a.btn(href='/x') Go"),
        json!([{
            "type": "tag",
            "name": "a",
            "attrs": {
                "class": [{"type": "text", "content": "btn", "location": {"line": 1, "col": 3}}],
                "href": [{"type": "text", "content": "/x", "location": {"line": 1, "col": 13}}],
            },
            "content": [{"type": "text", "content": "Go", "location": {"line": 1, "col": 18}}],
            "location": {"line": 1, "col": 1},
        }])
    );
}

#[test]
fn attrs_are_omitted_without_attributes() {
    let value = to_json("p\n  // c");
    assert_eq!(
        value,
        json!([{
            "type": "tag",
            "name": "p",
            "content": [{"type": "comment", "content": "c", "location": {"line": 2, "col": 3}}],
            "location": {"line": 1, "col": 1},
        }])
    );
}

#[test]
fn class_and_id_shorthands() {
    let nodes = parse(".wrapper#main.wide\n  p.note");
    let div = tag(&nodes[0]);
    assert_eq!(div.name, "div");
    assert_eq!(div.attr_text("class").as_deref(), Some("wrapper wide"));
    assert_eq!(div.attr_text("id").as_deref(), Some("main"));
    assert_eq!(div.attr("class").map(<[Node]>::len), Some(3));
    assert_eq!(tag(&div.content[0]).attr_text("class").as_deref(), Some("note"));
}

#[test]
fn quoted_attributes_containing_quotes() {
    let nodes = parse("p(data-a='\"quoted\"' data-b=\"it's\" data-c='a b c')");
    let p = tag(&nodes[0]);
    assert_eq!(p.attr_text("data-a").as_deref(), Some("\"quoted\""));
    assert_eq!(p.attr_text("data-b").as_deref(), Some("it's"));
    assert_eq!(p.attr_text("data-c").as_deref(), Some("a b c"));
}

#[test]
fn block_content_keeps_relative_indentation() {
    let source = "\
body
  script(type='module').
    const a = 1

    if (a) {
      run()
    }
  footer
";
    let nodes = parse(source);
    let body = tag(&nodes[0]);
    assert_eq!(body.content.len(), 2);
    let script = tag(&body.content[0]);
    assert_eq!(
        script.content[0].content(),
        Some("const a = 1\n\nif (a) {\n  run()\n}")
    );
    assert_eq!(tag(&body.content[1]).name, "footer");
}

#[test]
fn windows_line_endings_and_bom() {
    let nodes = parse("\u{FEFF}ul\r\n  li one\r\n  li two\r\n");
    let ul = tag(&nodes[0]);
    assert_eq!(ul.content.len(), 2);
    assert_eq!(ul.content[1].location().line, 3);
}

#[test]
fn invalid_character() {
    let err = parse_source("div\n  <p>", &Options::new().with_filename("bad.sml")).unwrap_err();
    assert!(matches!(err, Error::Lex(_)));
    let message = err.to_string();
    assert!(message.contains("Cannot parse character \"<\""));
    assert!(message.contains("Location: bad.sml:2:3"));
    assert!(message.contains("2 |   <p>"));
}

#[test]
fn unclosed_attribute_list() {
    let err = parse_source("p\na(href='/'\nspan", &Options::default()).unwrap_err();
    assert!(err.to_string().contains("Unclosed attribute parentheses"));
    assert_eq!((err.line(), err.column()), (2, 2));
}

#[test]
fn inline_text_continues_on_piped_lines() {
    let nodes = parse("ul\n  li First\n    | and more\n  li Second");
    let ul = tag(&nodes[0]);
    assert_eq!(ul.content.len(), 2);
    let first: Vec<&str> = tag(&ul.content[0])
        .content
        .iter()
        .filter_map(Node::content)
        .collect();
    assert_eq!(first, vec!["First", "and more"]);
}

#[test]
fn uneven_dedent_closes_deeper_tags() {
    let nodes = parse("nav\n    a one\n  a two");
    let nav = tag(&nodes[0]);
    let names: Vec<&str> = nav.content.iter().map(|n| tag(n).name.as_str()).collect();
    assert_eq!(names, vec!["a", "a"]);
}

#[test]
fn structural_conflicts_are_rejected() {
    let err = parse_source("li text\n  a link", &Options::default()).unwrap_err();
    assert!(err.message().starts_with("Cannot mix inline text"));

    let err = parse_source("li: a link\n  span", &Options::default()).unwrap_err();
    assert!(err.message().starts_with("Cannot indent content beneath"));
}

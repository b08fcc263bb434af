use pulldown_cmark::{Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};

/// Render Markdown as plain terminal text. Headings are underlined, list
/// items get a bullet, emphasis and links keep only their text, and inline
/// code keeps its backticks.
pub fn render(source: &str) -> String {
    let parser = CmarkParser::new_ext(source, Options::ENABLE_STRIKETHROUGH);
    let mut out = String::new();
    let mut heading: Option<(HeadingLevel, usize)> = None;
    let mut list_depth = 0usize;
    let mut ordered: Vec<Option<u64>> = Vec::new();
    let mut in_code = false;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => heading = Some((level, out.len())),
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, start)) = heading.take() {
                    let width = out[start..].chars().count();
                    let rule = if level == HeadingLevel::H1 { '=' } else { '-' };
                    out.push('\n');
                    out.extend(std::iter::repeat_n(rule, width));
                }
                out.push_str("\n\n");
            }
            Event::Start(Tag::List(start)) => {
                if list_depth == 0 && !out.is_empty() && !out.ends_with("\n\n") {
                    out.push('\n');
                }
                list_depth += 1;
                ordered.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                ordered.pop();
                if list_depth == 0 {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Item) => {
                out.push_str(&"  ".repeat(list_depth.saturating_sub(1)));
                match ordered.last_mut() {
                    Some(Some(n)) => {
                        out.push_str(&format!("{n}. "));
                        *n += 1;
                    }
                    _ => out.push_str("- "),
                }
            }
            Event::End(TagEnd::Item) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Event::End(TagEnd::Paragraph) => {
                out.push('\n');
                if list_depth == 0 {
                    out.push('\n');
                }
            }
            Event::Start(Tag::CodeBlock(_)) => in_code = true,
            Event::End(TagEnd::CodeBlock) => {
                in_code = false;
                out.push('\n');
            }
            Event::Text(text) => {
                if in_code {
                    for line in text.lines() {
                        out.push_str("    ");
                        out.push_str(line);
                        out.push('\n');
                    }
                } else {
                    out.push_str(&text);
                }
            }
            Event::Code(code) => {
                out.push('`');
                out.push_str(&code);
                out.push('`');
            }
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Rule => out.push_str("----\n\n"),
            _ => {}
        }
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_paragraphs() {
        assert_eq!(
            render("# Suma\n\nDeclara **5 + 3**\ncomo respuesta."),
            "Suma\n====\n\nDeclara 5 + 3 como respuesta."
        );
    }

    #[test]
    fn lists_and_code() {
        assert_eq!(
            render("Pasos:\n\n- usa `doble`\n- prueba [esto](https://example.com)\n\n1. uno\n2. dos\n"),
            "Pasos:\n\n- usa `doble`\n- prueba esto\n\n1. uno\n2. dos"
        );
    }
}
